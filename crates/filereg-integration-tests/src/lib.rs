//! Integration test harness for the registration API.
//!
//! [`TestApp`] drives the full axum router in-process against an in-memory
//! database, so every request passes through token authentication,
//! authorization and storage exactly as it would in the daemon.
//!
//! ```sh
//! cargo test -p filereg-integration-tests
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use filereg_auth::authenticator::TOKEN_PARAM;
use filereg_crypto::shared_secret::{build_token, generate_nonce, ServerSecret};
use filereg_daemon::AppState;
use filereg_db::queries::users;
use filereg_types::UserIdentity;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Server secret used by every test app.
pub const TEST_SECRET: &str = "gubbish";

/// Simulated timestamp for seeded rows.
pub const TEST_TIMESTAMP: u64 = 1_700_000_000;

/// An in-process API instance with a seeded user directory.
pub struct TestApp {
    router: Router,
    state: Arc<AppState>,
    secret: ServerSecret,
}

impl TestApp {
    /// Build an app whose directory contains `emails`.
    pub fn with_users(emails: &[&str]) -> Self {
        let conn = filereg_db::open_memory().expect("open in-memory db");
        for email in emails {
            users::insert(&conn, email, TEST_TIMESTAMP).expect("seed user");
        }
        let state = Arc::new(AppState::new(
            conn,
            ServerSecret::new(TEST_SECRET).expect("secret"),
        ));
        Self {
            router: filereg_daemon::router(state.clone()),
            state,
            secret: ServerSecret::new(TEST_SECRET).expect("secret"),
        }
    }

    /// Shared state, for direct database assertions.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Look up a seeded user.
    pub async fn user(&self, email: &str) -> UserIdentity {
        let db = self.state.db.lock().await;
        users::find_by_email(&db, email)
            .expect("query")
            .expect("seeded user")
    }

    /// A valid `_user` token for `email` with a fresh nonce.
    pub fn token(&self, email: &str) -> String {
        build_token(email, &generate_nonce(), &self.secret).expect("token")
    }

    /// Send a request as `email`.
    pub async fn request_as(
        &self,
        email: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let uri = format!("{path}?{TOKEN_PARAM}={}", self.token(email));
        self.request(method, &uri, body).await
    }

    /// Send a request to a raw URI, with no token added.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        self.send(method, uri, Some("application/json"), body).await
    }

    /// Send `body` verbatim, with an optional content type.
    pub async fn request_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        self.send(method, uri, content_type, Body::from(body.to_string()))
            .await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let req = builder.body(body).expect("request");

        let resp = self.router.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON response")
        };
        (status, value)
    }
}
