//! Request extractors: the authenticated principal and JSON bodies.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use filereg_auth::authenticator::TOKEN_PARAM;
use filereg_db::queries::users;
use filereg_db::DbError;
use filereg_types::UserIdentity;
use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

/// User directory backed by the `users` table.
pub struct SqliteDirectory<'a>(pub &'a Connection);

impl filereg_auth::UserDirectory for SqliteDirectory<'_> {
    type Error = DbError;

    fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, DbError> {
        users::find_by_email(self.0, email)
    }
}

/// The `_user` value of a request. A repeated parameter yields its last value.
fn token_param(parts: &Parts) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri).ok()?;
    pairs
        .into_iter()
        .rev()
        .find_map(|(key, value)| (key == TOKEN_PARAM).then_some(value))
}

/// The principal of a request authenticated with a `_user` token.
///
/// Rejects with [`ApiError::Unauthenticated`] (403) on any credential failure.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserIdentity);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_param(parts);

        let authenticated = {
            let db = state.db.lock().await;
            state
                .auth
                .authenticate(token.as_deref(), &SqliteDirectory(&*db))?
        };

        tracing::debug!(user_id = authenticated.user.id, "request principal bound");
        parts.extensions.insert(authenticated.user.clone());
        Ok(Self(authenticated.user))
    }
}

/// JSON request body whose rejections use the API error format.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(uri: &str) -> Parts {
        let (parts, _) = HttpRequest::builder()
            .uri(uri)
            .body(())
            .expect("request")
            .into_parts();
        parts
    }

    #[test]
    fn test_token_param_absent() {
        assert_eq!(token_param(&parts("/addons")), None);
        assert_eq!(token_param(&parts("/addons?other=1")), None);
    }

    #[test]
    fn test_token_param_last_value_wins() {
        let p = parts("/addons?_user=first&x=1&_user=second");
        assert_eq!(token_param(&p).as_deref(), Some("second"));
    }

    #[test]
    fn test_token_param_decodes_percent_escapes() {
        let p = parts("/addons?_user=a%40b.com%2Csig%2Cn");
        assert_eq!(token_param(&p).as_deref(), Some("a@b.com,sig,n"));
    }
}
