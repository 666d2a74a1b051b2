//! # filereg-types
//!
//! Shared domain types for the file registration workspace: users, addons
//! registered outside the main catalog, and the content hashes attached to
//! them.

pub mod addon;
pub mod user;

pub use addon::{AddonRepr, AddonWrite, ContentHash, HashRef, HashWrite, RegisteredAddon};
pub use user::{UserId, UserIdentity};

/// Maximum length of an addon guid.
pub const MAX_GUID_LEN: usize = 255;

/// Maximum length of an addon name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of an addon description.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length of a sha256 value.
pub const MAX_SHA256_LEN: usize = 64;

/// Maximum length of a hash version string.
pub const MAX_VERSION_LEN: usize = 255;

/// Field validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} does not match the resource in the URL")]
    Mismatch { field: &'static str },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Check a required field is non-empty and within `max` characters.
pub fn validate_required(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    validate_length(field, value, max)
}

/// Check an optional text field is within `max` characters.
pub fn validate_length(field: &'static str, value: &str, max: usize) -> Result<()> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}
