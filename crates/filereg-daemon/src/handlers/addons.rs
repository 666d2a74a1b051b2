//! `/addons` endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use filereg_auth::{Method, Resource};
use filereg_db::queries::{addons, hashes};
use filereg_types::{AddonRepr, AddonWrite, RegisteredAddon, UserIdentity};
use rusqlite::Connection;
use tracing::info;

use super::require;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, AuthenticatedUser};
use crate::state::{now_secs, AppState};

fn load_repr(conn: &Connection, guid: &str) -> ApiResult<AddonRepr> {
    let addon = addons::get(conn, guid)?;
    let hashes = hashes::list_for_addon(conn, guid)?;
    Ok(addon.to_repr(&hashes))
}

/// `GET /addons`
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> ApiResult<Json<Vec<AddonRepr>>> {
    let db = state.db.lock().await;
    let reprs = addons::list(&db)?
        .into_iter()
        .map(|addon| -> ApiResult<AddonRepr> {
            let hashes = hashes::list_for_addon(&db, &addon.guid)?;
            Ok(addon.to_repr(&hashes))
        })
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(reprs))
}

/// `GET /addons/:guid`
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(guid): Path<String>,
) -> ApiResult<Json<AddonRepr>> {
    let db = state.db.lock().await;
    Ok(Json(load_repr(&db, &guid)?))
}

/// `PUT /addons/:guid`: update, or register the addon if it does not exist.
pub async fn put(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(guid): Path<String>,
    ApiJson(body): ApiJson<AddonWrite>,
) -> ApiResult<(StatusCode, Json<AddonRepr>)> {
    let mut db = state.db.lock().await;
    let (created, repr) = save(&mut db, &user, &guid, &body, Method::Put, true)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(repr)))
}

/// `PATCH /addons/:guid`
pub async fn patch(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(guid): Path<String>,
    ApiJson(body): ApiJson<AddonWrite>,
) -> ApiResult<Json<AddonRepr>> {
    let mut db = state.db.lock().await;
    let (_, repr) = save(&mut db, &user, &guid, &body, Method::Patch, false)?;
    Ok(Json(repr))
}

/// Apply an addon write in one transaction. Returns whether the addon was created.
///
/// Every successful save adds the acting user to the author set, so the
/// first writer of an unowned addon becomes its owner.
fn save(
    conn: &mut Connection,
    user: &UserIdentity,
    guid: &str,
    body: &AddonWrite,
    method: Method,
    create_missing: bool,
) -> ApiResult<(bool, AddonRepr)> {
    body.validate(guid)?;

    let tx = conn.transaction()?;
    let created = match addons::find(&tx, guid)? {
        Some(mut addon) => {
            require(method, user, &Resource::Addon(&addon))?;
            body.apply(&mut addon);
            addons::update_metadata(&tx, &addon)?;
            false
        }
        None if create_missing => {
            let mut addon = RegisteredAddon::new(guid);
            body.apply(&mut addon);
            addons::insert(&tx, &addon)?;
            true
        }
        None => return Err(ApiError::NotFound("addon".into())),
    };

    if let Some(wanted) = body.hash_set() {
        hashes::replace_for_addon(&tx, guid, &wanted, now_secs())?;
    }
    addons::add_author(&tx, guid, user.id)?;

    let repr = load_repr(&tx, guid)?;
    tx.commit()?;

    if created {
        info!(guid, user_id = user.id, "registered addon");
    } else {
        info!(guid, user_id = user.id, "updated addon");
    }
    Ok((created, repr))
}
