//! Shared-secret request signing.
//!
//! A caller proves knowledge of the server secret by sending
//! `_user=<email>,<signature>,<nonce>` where:
//!
//! ```text
//! consumer_id = hex(SHA1(email || secret))
//! signature   = hex(HMAC-SHA512(key = nonce || secret, message = consumer_id))
//! ```
//!
//! The nonce is folded into the HMAC key, not the message. Swapping the two
//! produces signatures no existing client will accept.

use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::{Digest, Sha1};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Length of a hex-encoded HMAC-SHA512 signature.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Separator between the fields of a credential token.
pub const TOKEN_SEPARATOR: char = ',';

/// Process-wide signing secret. Loaded once at startup and never mutated.
#[derive(Clone)]
pub struct ServerSecret(Zeroizing<Vec<u8>>);

impl ServerSecret {
    /// Wrap a secret string. Empty secrets are rejected.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret: String = secret.into();
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(secret.into_bytes())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret(..)")
    }
}

/// Compute the consumer id for an email: `hex(SHA1(email || secret))`.
pub fn consumer_id(email: &str, secret: &ServerSecret) -> String {
    let mut hasher = Sha1::new();
    hasher.update(email.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn keyed_mac(email: &str, nonce: &str, secret: &ServerSecret) -> Result<HmacSha512> {
    let mut key = Zeroizing::new(Vec::with_capacity(nonce.len() + secret.as_bytes().len()));
    key.extend_from_slice(nonce.as_bytes());
    key.extend_from_slice(secret.as_bytes());

    let mut mac = HmacSha512::new_from_slice(&key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(consumer_id(email, secret).as_bytes());
    Ok(mac)
}

/// Compute the hex signature for `(email, nonce)`.
pub fn sign(email: &str, nonce: &str, secret: &ServerSecret) -> Result<String> {
    let mac = keyed_mac(email, nonce, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a supplied hex signature in constant time.
///
/// Only the exact lowercase hex form produced by [`sign`] is accepted, so
/// changing any single character of a valid signature (case included)
/// fails verification.
pub fn verify(email: &str, nonce: &str, signature: &str, secret: &ServerSecret) -> bool {
    if !is_lower_hex(signature, SIGNATURE_HEX_LEN) {
        return false;
    }
    let Ok(supplied) = hex::decode(signature) else {
        return false;
    };
    match keyed_mac(email, nonce, secret) {
        Ok(mac) => mac.verify_slice(&supplied).is_ok(),
        Err(_) => false,
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Generate a random hex nonce for building client tokens.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The `(email, signature, nonce)` triple carried in the `_user` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub signature: String,
    pub nonce: String,
}

impl Credential {
    /// Split a token into its three fields.
    ///
    /// Anything other than exactly three comma-separated fields is malformed.
    pub fn parse(token: &str) -> Result<Self> {
        let fields: Vec<&str> = token.split(TOKEN_SEPARATOR).collect();
        match fields.as_slice() {
            [email, signature, nonce] => Ok(Self {
                email: (*email).to_string(),
                signature: (*signature).to_string(),
                nonce: (*nonce).to_string(),
            }),
            other => Err(CryptoError::MalformedCredential(other.len())),
        }
    }

    /// Build a signed credential for `email` under `nonce`.
    pub fn signed(email: &str, nonce: &str, secret: &ServerSecret) -> Result<Self> {
        for (field, value) in [("email", email), ("nonce", nonce)] {
            if value.contains(TOKEN_SEPARATOR) {
                return Err(CryptoError::InvalidInput(format!(
                    "{field} must not contain '{TOKEN_SEPARATOR}'"
                )));
            }
        }
        Ok(Self {
            email: email.to_string(),
            signature: sign(email, nonce, secret)?,
            nonce: nonce.to_string(),
        })
    }

    /// Check the signature against the server secret.
    pub fn verify(&self, secret: &ServerSecret) -> bool {
        verify(&self.email, &self.nonce, &self.signature, secret)
    }

    /// Render as `email,signature,nonce`.
    pub fn to_token(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.email,
            self.signature,
            self.nonce,
            sep = TOKEN_SEPARATOR
        )
    }
}

/// Build a complete `_user` token value.
pub fn build_token(email: &str, nonce: &str, secret: &ServerSecret) -> Result<String> {
    Ok(Credential::signed(email, nonce, secret)?.to_token())
}
