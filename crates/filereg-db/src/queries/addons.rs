//! Registered addon and author query functions.

use std::collections::BTreeSet;

use filereg_types::{RegisteredAddon, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::{classify_read, classify_write, DbError, Result};

/// Insert a new addon together with its initial authors.
///
/// Fails with [`DbError::Conflict`] if the guid is already registered.
pub fn insert(conn: &Connection, addon: &RegisteredAddon) -> Result<()> {
    conn.execute(
        "INSERT INTO addons (guid, name, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![addon.guid, addon.name, addon.description],
    )
    .map_err(|e| classify_write(e, &format!("addon {}", addon.guid)))?;

    for user in &addon.authors {
        add_author(conn, &addon.guid, *user)?;
    }
    Ok(())
}

/// Get an addon and its authors by guid.
pub fn get(conn: &Connection, guid: &str) -> Result<RegisteredAddon> {
    let (guid, name, description) = conn
        .query_row(
            "SELECT guid, name, description FROM addons WHERE guid = ?1",
            [guid],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .map_err(|e| classify_read(e, "addon"))?;

    let authors = authors(conn, &guid)?;
    Ok(RegisteredAddon {
        guid,
        name,
        description,
        authors,
    })
}

/// Get an addon if it exists.
pub fn find(conn: &Connection, guid: &str) -> Result<Option<RegisteredAddon>> {
    let exists = conn
        .query_row("SELECT 1 FROM addons WHERE guid = ?1", [guid], |_| Ok(()))
        .optional()?;
    match exists {
        Some(()) => get(conn, guid).map(Some),
        None => Ok(None),
    }
}

/// List all addons ordered by guid.
pub fn list(conn: &Connection) -> Result<Vec<RegisteredAddon>> {
    let mut stmt = conn.prepare("SELECT guid, name, description FROM addons ORDER BY guid")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RegisteredAddon {
                guid: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                authors: BTreeSet::new(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|mut addon| {
            addon.authors = authors(conn, &addon.guid)?;
            Ok(addon)
        })
        .collect()
}

/// Overwrite the name and description of an existing addon.
pub fn update_metadata(conn: &Connection, addon: &RegisteredAddon) -> Result<()> {
    let changed = conn.execute(
        "UPDATE addons SET name = ?2, description = ?3 WHERE guid = ?1",
        rusqlite::params![addon.guid, addon.name, addon.description],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound("addon".into()));
    }
    Ok(())
}

/// Add a user to an addon's author set. Adding an existing author is a no-op.
pub fn add_author(conn: &Connection, guid: &str, user: UserId) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO addon_authors (guid, user_id) VALUES (?1, ?2)",
        rusqlite::params![guid, user],
    )
    .map_err(|e| classify_write(e, "addon author"))?;
    Ok(())
}

/// Author ids of an addon.
pub fn authors(conn: &Connection, guid: &str) -> Result<BTreeSet<UserId>> {
    let mut stmt = conn.prepare("SELECT user_id FROM addon_authors WHERE guid = ?1")?;
    let rows = stmt
        .query_map([guid], |row| row.get::<_, UserId>(0))?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    const GUID: &str = "{9c51bd27-6ed8-4000-a2bf-36cb95c0c947}";

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let mut addon = RegisteredAddon::new(GUID);
        addon.name = "Super Addon".to_string();
        addon.description = "Some super description".to_string();
        insert(&conn, &addon).expect("insert");

        let loaded = get(&conn, GUID).expect("get");
        assert_eq!(loaded, addon);
        assert!(!loaded.has_authors());
    }

    #[test]
    fn test_duplicate_guid_conflicts() {
        let conn = test_db();
        let mut addon = RegisteredAddon::new(GUID);
        addon.name = "First".to_string();
        insert(&conn, &addon).expect("insert");

        addon.name = "Second".to_string();
        assert!(matches!(insert(&conn, &addon), Err(DbError::Conflict(_))));
        assert_eq!(get(&conn, GUID).expect("get").name, "First");
    }

    #[test]
    fn test_find_missing() {
        let conn = test_db();
        assert!(find(&conn, GUID).expect("find").is_none());
        assert!(matches!(get(&conn, GUID), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_authors_accumulate_without_duplicates() {
        let conn = test_db();
        let alice = users::insert(&conn, "alice@example.com", 1).expect("user");
        let bob = users::insert(&conn, "bob@example.com", 1).expect("user");
        insert(&conn, &RegisteredAddon::new(GUID)).expect("insert");

        add_author(&conn, GUID, alice.id).expect("add");
        add_author(&conn, GUID, alice.id).expect("add again");
        add_author(&conn, GUID, bob.id).expect("add");

        let addon = get(&conn, GUID).expect("get");
        assert_eq!(addon.authors, BTreeSet::from([alice.id, bob.id]));
    }

    #[test]
    fn test_author_must_exist() {
        let conn = test_db();
        insert(&conn, &RegisteredAddon::new(GUID)).expect("insert");
        assert!(matches!(
            add_author(&conn, GUID, 999),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_update_metadata() {
        let conn = test_db();
        insert(&conn, &RegisteredAddon::new(GUID)).expect("insert");

        let mut addon = get(&conn, GUID).expect("get");
        addon.name = "Youpi".to_string();
        addon.description = "Oh yeah".to_string();
        update_metadata(&conn, &addon).expect("update");

        let loaded = get(&conn, GUID).expect("get");
        assert_eq!(loaded.name, "Youpi");
        assert_eq!(loaded.description, "Oh yeah");

        assert!(matches!(
            update_metadata(&conn, &RegisteredAddon::new("missing")),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_ordered_by_guid() {
        let conn = test_db();
        insert(&conn, &RegisteredAddon::new("b@addon")).expect("insert");
        insert(&conn, &RegisteredAddon::new("a@addon")).expect("insert");
        let addons = list(&conn).expect("list");
        let guids: Vec<_> = addons.iter().map(|a| a.guid.as_str()).collect();
        assert_eq!(guids, vec!["a@addon", "b@addon"]);
    }
}
