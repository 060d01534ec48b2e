use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use logbook_db::queries::ScribeChanges;
use logbook_db::{DbError, UniqueField};
use logbook_types::api::{AmendScribeRequest, Document, ScribeResource};
use logbook_types::models::{Scribe, ScribeId};

use crate::body::{self, JsonBody, MAX_BIO_LEN, MAX_EMAIL_LEN};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::policy;
use crate::state::{AppState, run_blocking};

/// Scribe ids are integers; anything else cannot name a scribe.
fn parse_id(raw: &str) -> Result<ScribeId, ApiError> {
    raw.parse().map_err(|_| ApiError::scribe_not_found(raw))
}

async fn load(state: &AppState, id: ScribeId) -> Result<Scribe, ApiError> {
    run_blocking(state, move |s| {
        s.db.get_scribe(id)?
            .map(|row| row.to_scribe())
            .ok_or_else(|| ApiError::scribe_not_found(&id.to_string()))
    })
    .await
}

/// Existence first, then ownership.
async fn load_owned(
    state: &AppState,
    caller: &Caller,
    raw_id: &str,
    denied: &'static str,
) -> Result<Scribe, ApiError> {
    let me = caller.require()?;
    let target = load(state, parse_id(raw_id)?).await?;

    if !policy::authorize(me.id, target.id) {
        warn!("Scribe {} denied access to scribe {}", me.id, target.id);
        return Err(ApiError::AuthorizationDenied(denied));
    }
    Ok(target)
}

/// GET /api/scribes/{id}: public profile.
pub async fn get_scribe(
    State(state): State<AppState>,
    Path(scribe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let scribe = load(&state, parse_id(&scribe_id)?).await?;
    Ok(Json(Document::new(ScribeResource::from(&scribe))))
}

/// PATCH /api/scribes/{id}: amend email, bio or password of one's own profile.
pub async fn amend_scribe(
    State(state): State<AppState>,
    Path(scribe_id): Path<String>,
    Extension(caller): Extension<Caller>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let target = load_owned(&state, &caller, &scribe_id, "You can only update your own profile").await?;

    let req: AmendScribeRequest = body::decode(body::object(body)?)?;
    if let Some(email) = &req.email {
        body::bounded("email", email, MAX_EMAIL_LEN)?;
    }
    if let Some(Some(bio)) = &req.bio {
        body::check_length("bio", bio, MAX_BIO_LEN)?;
    }
    if req.password.as_deref() == Some("") {
        return Err(ApiError::validation(
            "Invalid Field",
            "The password field must not be empty",
        ));
    }

    let id = target.id;
    let password_changed = req.password.is_some();
    let scribe = run_blocking(&state, move |s| {
        if let Some(email) = &req.email {
            if let Some(holder) = s.db.get_scribe_by_email(email)? {
                if holder.id != id {
                    return Err(ApiError::email_taken_by_other(email));
                }
            }
        }

        let password_hash = req
            .password
            .as_deref()
            .map(|p| s.credentials.set_password(p))
            .transpose()?;

        let changes = ScribeChanges {
            email: req.email.as_deref(),
            bio: req.bio.as_ref().map(|bio| bio.as_deref()),
            password_hash: password_hash.as_deref(),
        };

        match s.db.amend_scribe(id, changes) {
            Ok(Some(row)) => Ok(row.to_scribe()),
            Ok(None) => Err(ApiError::scribe_not_found(&id.to_string())),
            Err(DbError::UniqueViolation(UniqueField::Email)) => Err(ApiError::email_taken_by_other(
                req.email.as_deref().unwrap_or_default(),
            )),
            Err(DbError::UniqueViolation(_)) => {
                Err(ApiError::conflict("Unable to update profile due to a data conflict"))
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    info!(
        "Scribe {} amended their profile{}",
        scribe.id,
        if password_changed { " (password changed)" } else { "" }
    );

    Ok(Json(Document::new(ScribeResource::from(&scribe))))
}

/// DELETE /api/scribes/{id}: retire one's own account along with every entry.
pub async fn retire_scribe(
    State(state): State<AppState>,
    Path(scribe_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    let target = load_owned(&state, &caller, &scribe_id, "You can only delete your own account").await?;

    let id = target.id;
    let removed = run_blocking(&state, move |s| {
        s.db.retire_scribe(id)?
            .ok_or_else(|| ApiError::scribe_not_found(&id.to_string()))
    })
    .await?;

    info!("Scribe {} ('{}') retired, {} entries removed", id, target.username, removed);
    Ok(StatusCode::NO_CONTENT)
}
