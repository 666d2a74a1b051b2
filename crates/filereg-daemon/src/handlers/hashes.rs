//! `/hashes` endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use filereg_auth::{Method, Resource};
use filereg_db::queries::{addons, hashes};
use filereg_types::{ContentHash, HashWrite, RegisteredAddon, UserIdentity};
use rusqlite::Connection;
use tracing::info;

use super::require;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, AuthenticatedUser};
use crate::state::{now_secs, AppState};

/// How a write treats a missing or existing hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// POST: the sha256 must not exist yet.
    Create,
    /// PUT: update, or create when missing.
    Upsert,
    /// PATCH: the sha256 must exist.
    Update,
}

/// The addon a hash write targets; unknown guids are a validation error.
fn target_addon(conn: &Connection, guid: &str) -> ApiResult<RegisteredAddon> {
    addons::find(conn, guid)?
        .ok_or_else(|| ApiError::Validation(format!("unknown addon: {guid}")))
}

/// `GET /hashes`
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> ApiResult<Json<Vec<ContentHash>>> {
    let db = state.db.lock().await;
    Ok(Json(hashes::list(&db)?))
}

/// `POST /hashes`
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    ApiJson(body): ApiJson<HashWrite>,
) -> ApiResult<(StatusCode, Json<ContentHash>)> {
    body.validate(None)?;
    let sha256 = body.sha256.clone().unwrap_or_default();
    let mut db = state.db.lock().await;
    let (_, hash) = save(&mut db, &user, &sha256, body, Method::Post, Mode::Create)?;
    Ok((StatusCode::CREATED, Json(hash)))
}

/// `GET /hashes/:sha256`
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(sha256): Path<String>,
) -> ApiResult<Json<ContentHash>> {
    let db = state.db.lock().await;
    Ok(Json(hashes::get(&db, &sha256)?))
}

/// `PUT /hashes/:sha256`
pub async fn put(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(sha256): Path<String>,
    ApiJson(body): ApiJson<HashWrite>,
) -> ApiResult<(StatusCode, Json<ContentHash>)> {
    body.validate(Some(&sha256))?;
    let mut db = state.db.lock().await;
    let (created, hash) = save(&mut db, &user, &sha256, body, Method::Put, Mode::Upsert)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(hash)))
}

/// `PATCH /hashes/:sha256`
pub async fn patch(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(sha256): Path<String>,
    ApiJson(body): ApiJson<HashWrite>,
) -> ApiResult<Json<ContentHash>> {
    body.validate(Some(&sha256))?;
    let mut db = state.db.lock().await;
    let (_, hash) = save(&mut db, &user, &sha256, body, Method::Patch, Mode::Update)?;
    Ok(Json(hash))
}

/// `DELETE /hashes/:sha256`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(sha256): Path<String>,
) -> ApiResult<StatusCode> {
    let mut db = state.db.lock().await;
    let tx = db.transaction()?;

    let hash = hashes::get(&tx, &sha256)?;
    let owner = addons::get(&tx, &hash.addon)?;
    require(
        Method::Delete,
        &user,
        &Resource::Hash {
            hash: &hash,
            addon: &owner,
        },
    )?;
    hashes::delete(&tx, &sha256)?;
    tx.commit()?;

    info!(sha256 = %sha256, guid = %owner.guid, user_id = user.id, "deleted hash");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a hash write in one transaction. Returns whether the hash was created.
///
/// A new hash is authorized against the addon it is attached to. Moving a
/// hash to another addon needs permission on both the current and the new
/// owner.
fn save(
    conn: &mut Connection,
    user: &UserIdentity,
    sha256: &str,
    body: HashWrite,
    method: Method,
    mode: Mode,
) -> ApiResult<(bool, ContentHash)> {
    let tx = conn.transaction()?;
    let existing = hashes::find(&tx, sha256)?;

    let created = match (existing, mode) {
        (Some(_), Mode::Create) => {
            return Err(ApiError::Conflict(format!("hash {sha256}")));
        }
        (None, Mode::Update) => return Err(ApiError::NotFound("hash".into())),
        (Some(mut hash), _) => {
            let current_owner = addons::get(&tx, &hash.addon)?;
            require(
                method,
                user,
                &Resource::Hash {
                    hash: &hash,
                    addon: &current_owner,
                },
            )?;

            body.apply(&mut hash);
            if hash.addon != current_owner.guid {
                let new_owner = target_addon(&tx, &hash.addon)?;
                require(
                    method,
                    user,
                    &Resource::Hash {
                        hash: &hash,
                        addon: &new_owner,
                    },
                )?;
            }
            hashes::update(&tx, &hash, now_secs())?;
            false
        }
        (None, _) => {
            let hash = body.into_new_hash(sha256.to_string())?;
            let owner = target_addon(&tx, &hash.addon)?;
            require(
                method,
                user,
                &Resource::Hash {
                    hash: &hash,
                    addon: &owner,
                },
            )?;
            hashes::insert(&tx, &hash, now_secs())?;
            true
        }
    };

    let hash = hashes::get(&tx, sha256)?;
    tx.commit()?;

    if created {
        info!(sha256, guid = %hash.addon, user_id = user.id, "registered hash");
    } else {
        info!(sha256, guid = %hash.addon, user_id = user.id, "updated hash");
    }
    Ok((created, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filereg_db::queries::users;

    const GUID: &str = "{9c51bd27-6ed8-4000-a2bf-36cb95c0c947}";
    const OTHER_GUID: &str = "other@addon";
    const SHA256: &str = "31f7a65e315586ac198bd798b6629ce4903d0899476d5741a9f32e2e521b6a66";

    struct Fixture {
        conn: Connection,
        alice: UserIdentity,
        bob: UserIdentity,
    }

    /// `GUID` is owned by alice, `OTHER_GUID` by bob.
    fn setup() -> Fixture {
        let conn = filereg_db::open_memory().expect("db");
        let alice = users::insert(&conn, "alice@example.com", 1).expect("user");
        let bob = users::insert(&conn, "bob@example.com", 1).expect("user");

        let mut mine = RegisteredAddon::new(GUID);
        mine.authors.insert(alice.id);
        addons::insert(&conn, &mine).expect("addon");

        let mut theirs = RegisteredAddon::new(OTHER_GUID);
        theirs.authors.insert(bob.id);
        addons::insert(&conn, &theirs).expect("addon");

        Fixture { conn, alice, bob }
    }

    fn write(json: &str) -> HashWrite {
        serde_json::from_str(json).expect("body")
    }

    #[test]
    fn test_create_then_duplicate_conflicts() {
        let mut f = setup();
        let body = write(&format!(
            r#"{{"sha256": "{SHA256}", "addon": "{GUID}", "version": "1.0"}}"#
        ));
        let (created, hash) = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            body,
            Method::Post,
            Mode::Create,
        )
        .expect("create");
        assert!(created);
        assert!(hash.registered);

        let dup = write(&format!(
            r#"{{"sha256": "{SHA256}", "addon": "{GUID}", "version": "9.9"}}"#
        ));
        let result = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            dup,
            Method::Post,
            Mode::Create,
        );
        assert!(matches!(result, Err(ApiError::Conflict(_))));
        assert_eq!(hashes::get(&f.conn, SHA256).expect("get").version, "1.0");
    }

    #[test]
    fn test_create_on_foreign_addon_denied() {
        let mut f = setup();
        let body = write(&format!(r#"{{"addon": "{OTHER_GUID}"}}"#));
        let result = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            body,
            Method::Put,
            Mode::Upsert,
        );
        assert!(matches!(result, Err(ApiError::Forbidden)));
        assert!(hashes::find(&f.conn, SHA256).expect("find").is_none());
    }

    #[test]
    fn test_create_unknown_addon_invalid() {
        let mut f = setup();
        let body = write(r#"{"addon": "nope"}"#);
        let result = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            body,
            Method::Put,
            Mode::Upsert,
        );
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_patch_by_author() {
        let mut f = setup();
        hashes::insert(&f.conn, &ContentHash::new(SHA256, GUID), 1).expect("hash");

        let (created, hash) = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            write(r#"{"registered": false}"#),
            Method::Patch,
            Mode::Update,
        )
        .expect("patch");
        assert!(!created);
        assert!(!hash.registered);
    }

    #[test]
    fn test_patch_by_non_author_denied() {
        let mut f = setup();
        hashes::insert(&f.conn, &ContentHash::new(SHA256, GUID), 1).expect("hash");

        let result = save(
            &mut f.conn,
            &f.bob,
            SHA256,
            write(r#"{"registered": false}"#),
            Method::Patch,
            Mode::Update,
        );
        assert!(matches!(result, Err(ApiError::Forbidden)));
        assert!(hashes::get(&f.conn, SHA256).expect("get").registered);
    }

    #[test]
    fn test_move_to_foreign_addon_denied() {
        let mut f = setup();
        hashes::insert(&f.conn, &ContentHash::new(SHA256, GUID), 1).expect("hash");

        let body = write(&format!(r#"{{"addon": "{OTHER_GUID}"}}"#));
        let result = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            body,
            Method::Patch,
            Mode::Update,
        );
        assert!(matches!(result, Err(ApiError::Forbidden)));
        assert_eq!(hashes::get(&f.conn, SHA256).expect("get").addon, GUID);
    }

    #[test]
    fn test_patch_missing_not_found() {
        let mut f = setup();
        let result = save(
            &mut f.conn,
            &f.alice,
            SHA256,
            write("{}"),
            Method::Patch,
            Mode::Update,
        );
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
