//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Users (mirrors the external account store)
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Registered addons & authors
-- ============================================================

CREATE TABLE IF NOT EXISTS addons (
    guid TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS addon_authors (
    guid TEXT NOT NULL REFERENCES addons(guid) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (guid, user_id)
);

CREATE INDEX IF NOT EXISTS idx_addon_authors_user ON addon_authors(user_id);

-- ============================================================
-- Content hashes
-- ============================================================

CREATE TABLE IF NOT EXISTS hashes (
    sha256 TEXT PRIMARY KEY,
    guid TEXT NOT NULL REFERENCES addons(guid) ON DELETE CASCADE,
    version TEXT NOT NULL DEFAULT '',
    registered INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    modified_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hashes_guid ON hashes(guid);
"#;
