//! Shared application state.

use std::sync::Arc;

use filereg_auth::SharedSecretAuth;
use filereg_crypto::shared_secret::ServerSecret;
use rusqlite::Connection;
use tokio::sync::Mutex;

/// State shared by every handler.
pub struct AppState {
    /// Database connection.
    pub db: Arc<Mutex<Connection>>,
    /// Shared-secret authenticator holding the immutable server secret.
    pub auth: SharedSecretAuth,
}

impl AppState {
    pub fn new(conn: Connection, secret: ServerSecret) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            auth: SharedSecretAuth::new(secret),
        }
    }
}

/// Current Unix time in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
