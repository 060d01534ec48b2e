use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use logbook_db::queries::EntryChanges;
use logbook_types::api::{CreateEntryRequest, Document, EntryResource, UpdateEntryRequest};
use logbook_types::models::Entry;

use crate::body::{self, JsonBody};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::policy;
use crate::state::{AppState, run_blocking};

/// Entry ids are UUIDs in their canonical lowercase hyphenated form. Any
/// other spelling names no entry, so each entry has exactly one URL.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    match Uuid::parse_str(raw) {
        Ok(id) if id.to_string() == raw => Ok(id),
        _ => Err(ApiError::entry_not_found(raw)),
    }
}

async fn load(state: &AppState, id: Uuid) -> Result<Entry, ApiError> {
    run_blocking(state, move |s| {
        s.db.get_entry(&id.to_string())?
            .map(|row| row.to_entry())
            .ok_or_else(|| ApiError::entry_not_found(&id.to_string()))
    })
    .await
}

/// Existence first, then ownership.
async fn load_owned(
    state: &AppState,
    caller: &Caller,
    raw_id: &str,
    denied: &'static str,
) -> Result<Entry, ApiError> {
    let me = caller.require()?;
    let entry = load(state, parse_id(raw_id)?).await?;

    if !policy::authorize(me.id, entry.scribe_id) {
        warn!("Scribe {} denied access to entry {}", me.id, entry.id);
        return Err(ApiError::AuthorizationDenied(denied));
    }
    Ok(entry)
}

/// POST /api/entries: write a new entry for the caller.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let me = caller.require()?;
    let fields = body::object(body)?;

    if !body::missing(&fields, &["content"]).is_empty() {
        return Err(ApiError::validation(
            "Missing Required Field",
            "The content field is required",
        ));
    }

    let req: CreateEntryRequest = body::decode(fields)?;
    let visibility = body::visibility_field(req.visibility)?.unwrap_or_default();

    let scribe_id = me.id;
    let entry = run_blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        let row = s.db.create_entry(&id, scribe_id, &req.content, visibility)?;
        Ok(row.to_entry())
    })
    .await?;

    info!("Scribe {} created {} entry {}", entry.scribe_id, entry.visibility, entry.id);

    Ok((
        StatusCode::CREATED,
        Json(Document::new(EntryResource::from(&entry))),
    ))
}

/// GET /api/entries/{id}: credentials optional.
///
/// A private entry looks exactly like a missing one to anyone but its owner.
pub async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = load(&state, parse_id(&entry_id)?).await?;

    if !policy::can_view(&entry, caller.viewer()) {
        return Err(ApiError::entry_not_found(&entry.id.to_string()));
    }

    Ok(Json(Document::new(EntryResource::from(&entry))))
}

/// PATCH /api/entries/{id}: change content and/or visibility of one's own entry.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Extension(caller): Extension<Caller>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let entry = load_owned(&state, &caller, &entry_id, "You can only update your own entries").await?;

    let req: UpdateEntryRequest = body::decode(body::object(body)?)?;
    let visibility = body::visibility_field(req.visibility)?;

    let id = entry.id.to_string();
    let updated = run_blocking(&state, move |s| {
        let changes = EntryChanges {
            content: req.content.as_deref(),
            visibility,
        };
        s.db.update_entry(&id, changes)?
            .map(|row| row.to_entry())
            .ok_or_else(|| ApiError::entry_not_found(&id))
    })
    .await?;

    Ok(Json(Document::new(EntryResource::from(&updated))))
}

/// DELETE /api/entries/{id}: remove one's own entry.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    let entry = load_owned(&state, &caller, &entry_id, "You can only delete your own entries").await?;

    let id = entry.id.to_string();
    run_blocking(&state, move |s| {
        if s.db.delete_entry(&id)? {
            Ok(())
        } else {
            Err(ApiError::entry_not_found(&id))
        }
    })
    .await?;

    info!("Scribe {} deleted entry {}", entry.scribe_id, entry.id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/chronicle: all of the caller's entries, public and private, newest first.
pub async fn chronicle(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let scribe_id = caller.require()?.id;

    let entries = run_blocking(&state, move |s| {
        let rows = s.db.chronicle(scribe_id)?;
        Ok(rows.iter().map(|row| row.to_entry()).collect::<Vec<_>>())
    })
    .await?;

    let data: Vec<EntryResource> = entries.iter().map(EntryResource::from).collect();
    Ok(Json(Document::new(data)))
}
