//! filereg-daemon: HTTP service for addon and content-hash registration.
//!
//! Requests authenticate with a shared-secret `_user` token; writes are
//! restricted to an addon's authors.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
