use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};
use tracing::{debug, warn};

use logbook_types::models::{Scribe, ScribeId};

use crate::error::ApiError;
use crate::state::{AppState, AppStateInner, run_blocking};

/// Who is making the request, resolved once by [`resolve_caller`].
#[derive(Debug, Clone)]
pub enum Caller {
    /// No `Authorization: Basic` header, or one that could not be decoded.
    Anonymous,
    /// Credentials were supplied but did not verify.
    Rejected,
    Scribe(Scribe),
}

impl Caller {
    /// The authenticated scribe, or the matching authentication failure.
    pub fn require(&self) -> Result<&Scribe, ApiError> {
        match self {
            Self::Scribe(scribe) => Ok(scribe),
            Self::Anonymous => Err(ApiError::AuthenticationMissing),
            Self::Rejected => Err(ApiError::AuthenticationInvalid),
        }
    }

    /// For endpoints where credentials are optional: a rejected caller reads as anonymous.
    pub fn viewer(&self) -> Option<ScribeId> {
        match self {
            Self::Scribe(scribe) => Some(scribe.id),
            Self::Anonymous | Self::Rejected => None,
        }
    }
}

/// Verify HTTP Basic credentials and attach a [`Caller`] to the request.
///
/// Never rejects on its own; handlers decide whether they need an identity.
pub async fn resolve_caller(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let caller = match req.headers().typed_get::<Authorization<Basic>>() {
        None => Caller::Anonymous,
        Some(Authorization(basic)) => {
            let username = basic.username().to_string();
            let password = basic.password().to_string();
            match run_blocking(&state, move |s| Ok(verify(s, &username, &password))).await {
                Ok(caller) => caller,
                Err(e) => return e.into_response(),
            }
        }
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn verify(state: &AppStateInner, username: &str, password: &str) -> Caller {
    let row = match state.db.get_scribe_by_username(username) {
        Ok(row) => row,
        Err(e) => {
            warn!("Credential lookup for '{}' failed: {}", username, e);
            return Caller::Rejected;
        }
    };

    match row {
        Some(row) if state.credentials.check_password(Some(row.password_hash.as_str()), password) => {
            debug!("Authenticated scribe {} ('{}')", row.id, row.username);
            Caller::Scribe(row.to_scribe())
        }
        _ => {
            warn!("Rejected credentials for '{}'", username);
            Caller::Rejected
        }
    }
}
