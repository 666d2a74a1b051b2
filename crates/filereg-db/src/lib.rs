//! # filereg-db
//!
//! Storage for the file registration API: users, registered addons, their
//! authors and content hashes, in a single SQLite database.
//!
//! - WAL mode
//! - Foreign keys enforced
//! - Timestamps are Unix epoch seconds (u64)
//! - Schema version stored in `PRAGMA user_version`
//!
//! Uniqueness of `addons.guid` and `hashes.sha256` is enforced by the
//! database; violations surface as [`DbError::Conflict`] and are never
//! retried here.

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A row with the same primary or unique key already exists.
    #[error("already exists: {0}")]
    Conflict(String),

    /// A foreign key or check constraint was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Map constraint failures on a write to `Conflict` / `Constraint`.
pub(crate) fn classify_write(err: rusqlite::Error, what: &str) -> DbError {
    use rusqlite::ffi;

    if let rusqlite::Error::SqliteFailure(cause, _) = &err {
        match cause.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return DbError::Conflict(what.to_string());
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return DbError::Constraint(format!("{what}: foreign key"));
            }
            _ => {}
        }
    }
    DbError::Sqlite(err)
}

/// Map an empty single-row query to `NotFound`.
pub(crate) fn classify_read(err: rusqlite::Error, what: &str) -> DbError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(what.to_string()),
        other => DbError::Sqlite(other),
    }
}
