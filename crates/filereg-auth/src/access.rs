//! Owner-or-read-only authorization.
//!
//! Safe verbs are always allowed. A mutation is checked against the addon
//! that owns the resource: an addon with no authors is open to anyone, an
//! addon with authors only to those authors.

use filereg_types::{ContentHash, RegisteredAddon, UserIdentity};

use crate::Method;

/// A resource a request may act on.
#[derive(Clone, Copy, Debug)]
pub enum Resource<'a> {
    Addon(&'a RegisteredAddon),
    /// A hash together with the addon it belongs to (or is being attached to).
    Hash {
        hash: &'a ContentHash,
        addon: &'a RegisteredAddon,
    },
}

impl<'a> Resource<'a> {
    /// The addon whose author set governs this resource.
    pub fn owning_addon(&self) -> &'a RegisteredAddon {
        match self {
            Resource::Addon(addon) => addon,
            Resource::Hash { addon, .. } => addon,
        }
    }
}

/// Decide whether `actor` may perform `method` on `resource`.
pub fn authorize(method: Method, actor: Option<&UserIdentity>, resource: &Resource<'_>) -> bool {
    if method.is_safe() {
        return true;
    }

    let addon = resource.owning_addon();
    if !addon.has_authors() {
        return true;
    }

    actor.is_some_and(|user| addon.is_author(user.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID: &str = "{9c51bd27-6ed8-4000-a2bf-36cb95c0c947}";
    const SHA256: &str = "31f7a65e315586ac198bd798b6629ce4903d0899476d5741a9f32e2e521b6a66";

    fn alice() -> UserIdentity {
        UserIdentity::new(1, "alice@example.com")
    }

    fn bob() -> UserIdentity {
        UserIdentity::new(2, "bob@example.com")
    }

    #[test]
    fn test_safe_methods_always_allowed() {
        let mut addon = RegisteredAddon::new(GUID);
        addon.authors.insert(alice().id);
        let resource = Resource::Addon(&addon);

        for method in [Method::Get, Method::Head, Method::Options] {
            assert!(authorize(method, None, &resource));
            assert!(authorize(method, Some(&bob()), &resource));
        }
    }

    #[test]
    fn test_no_authors_allows_anyone() {
        let addon = RegisteredAddon::new(GUID);
        let resource = Resource::Addon(&addon);
        assert!(authorize(Method::Post, Some(&alice()), &resource));
        assert!(authorize(Method::Patch, None, &resource));
    }

    #[test]
    fn test_authors_restrict_mutation() {
        let mut addon = RegisteredAddon::new(GUID);
        assert!(authorize(
            Method::Post,
            Some(&bob()),
            &Resource::Addon(&addon)
        ));

        addon.authors.insert(alice().id);
        let resource = Resource::Addon(&addon);
        assert!(authorize(Method::Post, Some(&alice()), &resource));
        assert!(!authorize(Method::Post, Some(&bob()), &resource));
        assert!(!authorize(Method::Delete, None, &resource));
    }

    #[test]
    fn test_hash_resolves_to_owning_addon() {
        let mut addon = RegisteredAddon::new(GUID);
        addon.authors.insert(alice().id);
        let hash = ContentHash::new(SHA256, GUID);
        let resource = Resource::Hash {
            hash: &hash,
            addon: &addon,
        };

        assert_eq!(resource.owning_addon().guid, GUID);
        assert!(authorize(Method::Patch, Some(&alice()), &resource));
        assert!(!authorize(Method::Patch, Some(&bob()), &resource));
    }

    #[test]
    fn test_hash_of_unowned_addon_is_open() {
        let addon = RegisteredAddon::new(GUID);
        let hash = ContentHash::new(SHA256, GUID);
        let resource = Resource::Hash {
            hash: &hash,
            addon: &addon,
        };
        assert!(authorize(Method::Delete, Some(&bob()), &resource));
    }
}
