//! # filereg-crypto
//!
//! Cryptographic primitives for the file registration API.
//!
//! The shared-secret scheme is fixed: a SHA-1 consumer id derived from the
//! caller's email and the server secret, signed with HMAC-SHA512 keyed by
//! `nonce || secret`. Existing callers compute signatures this way, so the
//! key/message assignment must not change.
//!
//! ## Modules
//!
//! - [`shared_secret`]: server secret, signing, verification, `_user` tokens

pub mod shared_secret;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The server secret was empty.
    #[error("server secret must not be empty")]
    EmptySecret,

    /// A credential token did not split into exactly three fields.
    #[error("malformed credential: expected 3 comma-separated fields, got {0}")]
    MalformedCredential(usize),

    /// HMAC key setup failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
