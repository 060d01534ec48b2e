use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, info};

use logbook_db::{DbError, UniqueField};
use logbook_types::api::{Document, EnlistRequest, ScribeResource};

use crate::body::{self, JsonBody, MAX_BIO_LEN, MAX_EMAIL_LEN, MAX_USERNAME_LEN};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::state::{AppState, run_blocking};

/// POST /api/auth/enlist: create a scribe account.
pub async fn enlist(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let fields = body::object(body)?;

    let missing = body::missing(&fields, &["username", "email", "password"]);
    if !missing.is_empty() {
        return Err(ApiError::validation(
            "Missing Required Fields",
            format!("The following fields are required: {}", missing.join(", ")),
        ));
    }

    let req: EnlistRequest = body::decode(fields)?;
    body::bounded("username", &req.username, MAX_USERNAME_LEN)?;
    body::bounded("email", &req.email, MAX_EMAIL_LEN)?;
    if req.password.is_empty() {
        return Err(ApiError::validation(
            "Invalid Field",
            "The password field must not be empty",
        ));
    }
    if let Some(bio) = &req.bio {
        body::check_length("bio", bio, MAX_BIO_LEN)?;
    }

    let scribe = run_blocking(&state, move |s| {
        // Friendly early answer; the UNIQUE constraints below stay authoritative.
        if s.db.get_scribe_by_username(&req.username)?.is_some() {
            return Err(ApiError::username_taken(&req.username));
        }
        if s.db.get_scribe_by_email(&req.email)?.is_some() {
            return Err(ApiError::email_taken(&req.email));
        }

        let password_hash = s.credentials.set_password(&req.password)?;

        let row = s
            .db
            .create_scribe(&req.username, &req.email, &password_hash, req.bio.as_deref())
            .map_err(|e| match e {
                DbError::UniqueViolation(UniqueField::Username) => {
                    ApiError::username_taken(&req.username)
                }
                DbError::UniqueViolation(UniqueField::Email) => ApiError::email_taken(&req.email),
                other => other.into(),
            })?;

        Ok(row.to_scribe())
    })
    .await?;

    info!("Scribe {} enlisted as '{}'", scribe.id, scribe.username);

    Ok((
        StatusCode::CREATED,
        Json(Document::new(ScribeResource::from(&scribe))),
    ))
}

/// POST /api/auth/unlock: verify credentials and return the caller's profile.
pub async fn unlock(Extension(caller): Extension<Caller>) -> Result<impl IntoResponse, ApiError> {
    let scribe = caller.require()?;
    debug!("Scribe {} unlocked", scribe.id);
    Ok(Json(Document::new(ScribeResource::from(scribe))))
}

/// POST /api/auth/lock: stateless logout. There is no session to end; clients
/// simply stop sending credentials.
pub async fn lock(Extension(caller): Extension<Caller>) -> Result<StatusCode, ApiError> {
    let scribe = caller.require()?;
    debug!("Scribe {} locked", scribe.id);
    Ok(StatusCode::NO_CONTENT)
}
