//! Shared-secret authentication.
//!
//! The caller sends `_user=<email>,<signature>,<nonce>`. The signature is
//! checked against the server secret; on a match the email is resolved to a
//! user, which becomes the request principal.

use filereg_crypto::shared_secret::{Credential, ServerSecret};
use filereg_types::UserIdentity;
use tracing::{debug, info};

use crate::{AuthError, Result, UserDirectory};

/// Name of the query parameter carrying the token.
pub const TOKEN_PARAM: &str = "_user";

/// A successfully authenticated request principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticated {
    pub user: UserIdentity,
    /// The scheme carries no credential beyond the identity.
    pub credential: (),
}

/// Verifies `_user` tokens against an injected server secret.
#[derive(Clone, Debug)]
pub struct SharedSecretAuth {
    secret: ServerSecret,
}

impl SharedSecretAuth {
    pub fn new(secret: ServerSecret) -> Self {
        Self { secret }
    }

    /// Authenticate a request from the raw `_user` value, if any.
    pub fn authenticate<D: UserDirectory>(
        &self,
        token: Option<&str>,
        directory: &D,
    ) -> Result<Authenticated> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                info!("API request made without shared-secret auth token");
                return Err(AuthError::MissingToken);
            }
        };

        let credential = Credential::parse(token).map_err(|e| {
            info!(error = %e, "bad shared-secret auth data");
            AuthError::MalformedToken
        })?;

        if !credential.verify(&self.secret) {
            info!(email = %credential.email, "shared-secret auth token does not match");
            return Err(AuthError::SignatureMismatch);
        }

        let user = directory
            .find_by_email(&credential.email)
            .map_err(|e| AuthError::Directory(Box::new(e)))?
            .ok_or_else(|| {
                info!(email = %credential.email, "auth token matches absent user");
                AuthError::UnknownUser
            })?;

        debug!(nonce = %credential.nonce, "shared-secret nonce accepted");
        info!(user_id = user.id, "successful shared-secret auth");
        Ok(Authenticated {
            user,
            credential: (),
        })
    }
}
