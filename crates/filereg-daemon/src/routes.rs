//! HTTP route table.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{addons, hashes};
use crate::state::AppState;

/// Build the registration API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/addons", get(addons::list))
        .route(
            "/addons/:guid",
            get(addons::retrieve).put(addons::put).patch(addons::patch),
        )
        .route("/hashes", get(hashes::list).post(hashes::create))
        .route(
            "/hashes/:sha256",
            get(hashes::retrieve)
                .put(hashes::put)
                .patch(hashes::patch)
                .delete(hashes::delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use filereg_crypto::shared_secret::{build_token, ServerSecret};
    use filereg_db::queries::users;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "gubbish";

    fn app() -> Router {
        let conn = filereg_db::open_memory().expect("db");
        users::insert(&conn, "alice@example.com", 1).expect("user");
        let secret = ServerSecret::new(SECRET).expect("secret");
        router(Arc::new(AppState::new(conn, secret)))
    }

    fn token(email: &str) -> String {
        let secret = ServerSecret::new(SECRET).expect("secret");
        build_token(email, "n0nce", &secret).expect("token")
    }

    async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let resp = app.oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_missing_token_is_forbidden() {
        let (status, body) = call(app(), "GET", "/addons", "").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_authenticated_list_is_empty() {
        let uri = format!("/addons?_user={}", token("alice@example.com"));
        let (status, body) = call(app(), "GET", &uri, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_user_is_forbidden() {
        let uri = format!("/hashes?_user={}", token("mallory@example.com"));
        let (status, body) = call(app(), "GET", &uri, "").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_missing_addon_is_not_found() {
        let uri = format!("/addons/nope?_user={}", token("alice@example.com"));
        let (status, _) = call(app(), "GET", &uri, "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
