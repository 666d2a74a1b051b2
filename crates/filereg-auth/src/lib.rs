//! # filereg-auth
//!
//! Request authentication and per-object authorization for the file
//! registration API.
//!
//! - [`authenticator`]: shared-secret `_user` token verification
//! - [`access`]: owner-or-read-only policy over addons and hashes
//! - [`directory`]: user lookup seam backed by the account store
//! - [`method`]: request verbs

pub mod access;
pub mod authenticator;
pub mod directory;
pub mod method;

pub use access::{authorize, Resource};
pub use authenticator::{Authenticated, SharedSecretAuth};
pub use directory::UserDirectory;
pub use method::Method;

/// Authentication failures.
///
/// The first four variants are credential failures and must look identical
/// to the caller, so that a valid signature for an unknown email cannot be
/// told apart from a bad signature.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing shared-secret token")]
    MissingToken,

    #[error("malformed shared-secret token")]
    MalformedToken,

    #[error("shared-secret token does not match")]
    SignatureMismatch,

    #[error("shared-secret token matches no user")]
    UnknownUser,

    /// The user directory itself failed.
    #[error("user directory error: {0}")]
    Directory(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
    /// True for failures caused by the presented credential.
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, AuthError::Directory(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
