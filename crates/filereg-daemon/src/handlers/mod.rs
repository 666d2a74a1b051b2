//! HTTP handlers for the registration endpoints.
//!
//! Every handler runs its storage work synchronously under the database
//! lock, inside one transaction for mutations.

pub mod addons;
pub mod hashes;

use filereg_auth::{authorize, Method, Resource};
use filereg_types::UserIdentity;

use crate::error::{ApiError, ApiResult};

/// Fail with [`ApiError::Forbidden`] unless `user` may apply `method` to `resource`.
pub(crate) fn require(
    method: Method,
    user: &UserIdentity,
    resource: &Resource<'_>,
) -> ApiResult<()> {
    if authorize(method, Some(user), resource) {
        Ok(())
    } else {
        tracing::info!(
            user_id = user.id,
            %method,
            guid = %resource.owning_addon().guid,
            "permission denied"
        );
        Err(ApiError::Forbidden)
    }
}
