//! User lookup used by the authenticator.

use std::collections::HashMap;
use std::convert::Infallible;

use filereg_types::UserIdentity;

/// Read-only view of the user account store.
pub trait UserDirectory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a user by exact email.
    fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, Self::Error>;
}

/// In-memory directory keyed by email.
impl UserDirectory for HashMap<String, UserIdentity> {
    type Error = Infallible;

    fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, Self::Error> {
        Ok(self.get(email).cloned())
    }
}

impl<D: UserDirectory + ?Sized> UserDirectory for &D {
    type Error = D::Error;

    fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, Self::Error> {
        (**self).find_by_email(email)
    }
}
