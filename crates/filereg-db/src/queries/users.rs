//! User query functions.

use filereg_types::UserIdentity;
use rusqlite::{Connection, OptionalExtension};

use crate::{classify_write, Result};

/// Insert a new user and return its identity.
pub fn insert(conn: &Connection, email: &str, created_at: u64) -> Result<UserIdentity> {
    conn.execute(
        "INSERT INTO users (email, created_at) VALUES (?1, ?2)",
        rusqlite::params![email, created_at as i64],
    )
    .map_err(|e| classify_write(e, "user"))?;
    Ok(UserIdentity::new(conn.last_insert_rowid(), email))
}

/// Look up a user by exact email.
pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserIdentity>> {
    let user = conn
        .query_row(
            "SELECT id, email FROM users WHERE email = ?1",
            [email],
            |row| Ok(UserIdentity::new(row.get(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    Ok(user)
}

/// List all users.
pub fn list(conn: &Connection) -> Result<Vec<UserIdentity>> {
    let mut stmt = conn.prepare("SELECT id, email FROM users ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(UserIdentity::new(row.get(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
