//! Content hash query functions.

use std::collections::BTreeSet;

use filereg_types::ContentHash;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{classify_read, classify_write, DbError, Result};

const COLUMNS: &str = "sha256, guid, version, registered";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ContentHash> {
    Ok(ContentHash {
        sha256: row.get(0)?,
        addon: row.get(1)?,
        version: row.get(2)?,
        registered: row.get(3)?,
    })
}

/// Insert a new hash.
///
/// A sha256 already registered (to any addon) fails with
/// [`DbError::Conflict`] and leaves the existing row untouched. An unknown
/// owning addon fails with [`DbError::Constraint`].
pub fn insert(conn: &Connection, hash: &ContentHash, now: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO hashes (sha256, guid, version, registered, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        rusqlite::params![
            hash.sha256,
            hash.addon,
            hash.version,
            hash.registered,
            now as i64,
        ],
    )
    .map_err(|e| classify_write(e, &format!("hash {}", hash.sha256)))?;
    Ok(())
}

/// Get a hash by sha256.
pub fn get(conn: &Connection, sha256: &str) -> Result<ContentHash> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM hashes WHERE sha256 = ?1"),
        [sha256],
        from_row,
    )
    .map_err(|e| classify_read(e, "hash"))
}

/// Get a hash if it exists.
pub fn find(conn: &Connection, sha256: &str) -> Result<Option<ContentHash>> {
    let hash = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM hashes WHERE sha256 = ?1"),
            [sha256],
            from_row,
        )
        .optional()?;
    Ok(hash)
}

/// List all hashes ordered by sha256.
pub fn list(conn: &Connection) -> Result<Vec<ContentHash>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM hashes ORDER BY sha256"))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// List the hashes of one addon ordered by sha256.
pub fn list_for_addon(conn: &Connection, guid: &str) -> Result<Vec<ContentHash>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM hashes WHERE guid = ?1 ORDER BY sha256"
    ))?;
    let rows = stmt
        .query_map([guid], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrite the owning addon, version and registered flag of a hash.
pub fn update(conn: &Connection, hash: &ContentHash, now: u64) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE hashes SET guid = ?2, version = ?3, registered = ?4, modified_at = ?5
             WHERE sha256 = ?1",
            rusqlite::params![
                hash.sha256,
                hash.addon,
                hash.version,
                hash.registered,
                now as i64,
            ],
        )
        .map_err(|e| classify_write(e, &format!("hash {}", hash.sha256)))?;
    if changed == 0 {
        return Err(DbError::NotFound("hash".into()));
    }
    Ok(())
}

/// Delete a hash.
pub fn delete(conn: &Connection, sha256: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM hashes WHERE sha256 = ?1", [sha256])?;
    if changed == 0 {
        return Err(DbError::NotFound("hash".into()));
    }
    Ok(())
}

/// Make `wanted` the exact hash set of an addon.
///
/// Hashes of the addon not in `wanted` are deleted; missing ones are
/// created with default version and `registered = true`. A sha256 already
/// owned by another addon fails with [`DbError::Conflict`]; run inside a
/// transaction to keep the set unchanged on failure.
pub fn replace_for_addon(
    conn: &Connection,
    guid: &str,
    wanted: &BTreeSet<String>,
    now: u64,
) -> Result<()> {
    let current: BTreeSet<String> = list_for_addon(conn, guid)?
        .into_iter()
        .map(|h| h.sha256)
        .collect();

    for stale in current.difference(wanted) {
        delete(conn, stale)?;
    }
    for added in wanted.difference(&current) {
        insert(conn, &ContentHash::new(added.clone(), guid), now)?;
    }

    tracing::debug!(
        guid,
        removed = current.difference(wanted).count(),
        added = wanted.difference(&current).count(),
        "replaced addon hash set"
    );
    Ok(())
}
