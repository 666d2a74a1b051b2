//! Registered addons and their content hashes.
//!
//! A registered addon is one that is not hosted in the main catalog but whose
//! developers register the sha256 of the files they ship.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    validate_length, validate_required, Result, UserId, ValidationError, MAX_DESCRIPTION_LEN,
    MAX_GUID_LEN, MAX_NAME_LEN, MAX_SHA256_LEN, MAX_VERSION_LEN,
};

/// An addon registered through the API, keyed by its guid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredAddon {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Users allowed to mutate the addon once non-empty.
    #[serde(default)]
    pub authors: BTreeSet<UserId>,
}

impl RegisteredAddon {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            ..Self::default()
        }
    }

    pub fn has_authors(&self) -> bool {
        !self.authors.is_empty()
    }

    pub fn is_author(&self, user: UserId) -> bool {
        self.authors.contains(&user)
    }

    /// Wire representation, given the hashes currently attached.
    pub fn to_repr(&self, hashes: &[ContentHash]) -> AddonRepr {
        AddonRepr {
            guid: self.guid.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            hashes: hashes
                .iter()
                .map(|h| HashRef {
                    sha256: h.sha256.clone(),
                })
                .collect(),
            authors: self.authors.iter().copied().collect(),
        }
    }
}

fn default_registered() -> bool {
    true
}

/// A content hash registered against an addon. At most one row per sha256.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHash {
    pub sha256: String,
    /// Guid of the owning addon.
    pub addon: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_registered")]
    pub registered: bool,
}

impl ContentHash {
    pub fn new(sha256: impl Into<String>, addon: impl Into<String>) -> Self {
        Self {
            sha256: sha256.into(),
            addon: addon.into(),
            version: String::new(),
            registered: true,
        }
    }
}

/// `{sha256}` entry embedded in an addon representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRef {
    pub sha256: String,
}

/// Addon as returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRepr {
    pub guid: String,
    pub name: String,
    pub description: String,
    pub hashes: Vec<HashRef>,
    pub authors: Vec<UserId>,
}

/// Body of a PUT or PATCH on an addon. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AddonWrite {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// When present, replaces the addon's full hash set.
    #[serde(default)]
    pub hashes: Option<Vec<HashRef>>,
}

impl AddonWrite {
    /// Validate against the guid addressed by the request path.
    pub fn validate(&self, guid: &str) -> Result<()> {
        validate_required("guid", guid, MAX_GUID_LEN)?;
        if let Some(body_guid) = &self.guid {
            if body_guid != guid {
                return Err(ValidationError::Mismatch { field: "guid" });
            }
        }
        if let Some(name) = &self.name {
            validate_length("name", name, MAX_NAME_LEN)?;
        }
        if let Some(description) = &self.description {
            validate_length("description", description, MAX_DESCRIPTION_LEN)?;
        }
        for hash in self.hashes.iter().flatten() {
            validate_required("sha256", &hash.sha256, MAX_SHA256_LEN)?;
        }
        Ok(())
    }

    /// Apply the metadata fields onto an addon.
    pub fn apply(&self, addon: &mut RegisteredAddon) {
        if let Some(name) = &self.name {
            addon.name = name.clone();
        }
        if let Some(description) = &self.description {
            addon.description = description.clone();
        }
    }

    /// Requested hash set, deduplicated, if the write carries one.
    pub fn hash_set(&self) -> Option<BTreeSet<String>> {
        self.hashes
            .as_ref()
            .map(|hashes| hashes.iter().map(|h| h.sha256.clone()).collect())
    }
}

/// Body of a POST, PUT or PATCH on a hash. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct HashWrite {
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub addon: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub registered: Option<bool>,
}

impl HashWrite {
    /// Validate the body. `path_sha256` is the hash addressed by the URL, if any.
    pub fn validate(&self, path_sha256: Option<&str>) -> Result<()> {
        match (path_sha256, &self.sha256) {
            (Some(path), Some(body)) if path != body => {
                return Err(ValidationError::Mismatch { field: "sha256" });
            }
            (Some(path), _) => validate_required("sha256", path, MAX_SHA256_LEN)?,
            (None, Some(body)) => validate_required("sha256", body, MAX_SHA256_LEN)?,
            (None, None) => return Err(ValidationError::Required { field: "sha256" }),
        }
        if let Some(addon) = &self.addon {
            validate_required("addon", addon, MAX_GUID_LEN)?;
        }
        if let Some(version) = &self.version {
            validate_length("version", version, MAX_VERSION_LEN)?;
        }
        Ok(())
    }

    /// Build a new hash row from this write. The owning addon is required.
    pub fn into_new_hash(self, sha256: String) -> Result<ContentHash> {
        let addon = self.addon.ok_or(ValidationError::Required { field: "addon" })?;
        Ok(ContentHash {
            sha256,
            addon,
            version: self.version.unwrap_or_default(),
            registered: self.registered.unwrap_or(true),
        })
    }

    /// Apply the present fields onto an existing hash.
    pub fn apply(&self, hash: &mut ContentHash) {
        if let Some(addon) = &self.addon {
            hash.addon = addon.clone();
        }
        if let Some(version) = &self.version {
            hash.version = version.clone();
        }
        if let Some(registered) = self.registered {
            hash.registered = registered;
        }
    }
}
