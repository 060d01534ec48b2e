use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use logbook_crypto::HashError;
use logbook_db::{DbError, UniqueField};
use logbook_types::api::{ErrorDocument, ErrorObject};

/// Every way a request can fail, independent of how it is put on the wire.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable credentials on an endpoint that needs them.
    #[error("authentication required")]
    AuthenticationMissing,

    /// Credentials were supplied but did not verify.
    #[error("invalid credentials")]
    AuthenticationInvalid,

    /// Authenticated, but not the owner of the target.
    #[error("forbidden: {0}")]
    AuthorizationDenied(&'static str),

    #[error("{title}: {detail}")]
    NotFound { title: &'static str, detail: String },

    #[error("{title}: {detail}")]
    Conflict { title: &'static str, detail: String },

    #[error("{title}: {detail}")]
    ValidationFailed { title: &'static str, detail: String },

    /// A body was sent without a JSON content type.
    #[error("unsupported media type")]
    UnsupportedMediaType,

    /// Cause is logged where it happens, never sent to the client.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn scribe_not_found(id: &str) -> Self {
        Self::NotFound {
            title: "Scribe Not Found",
            detail: format!("No scribe exists with ID {id}"),
        }
    }

    pub fn entry_not_found(id: &str) -> Self {
        Self::NotFound {
            title: "Entry Not Found",
            detail: format!("No entry exists with ID {id}"),
        }
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::NotFound {
            title: "Not Found",
            detail: format!("No resource exists at {path}"),
        }
    }

    pub fn username_taken(username: &str) -> Self {
        Self::Conflict {
            title: "Username Already Exists",
            detail: format!("The username '{username}' is already taken"),
        }
    }

    pub fn email_taken(email: &str) -> Self {
        Self::Conflict {
            title: "Email Already Exists",
            detail: format!("The email '{email}' is already registered"),
        }
    }

    pub fn email_taken_by_other(email: &str) -> Self {
        Self::Conflict {
            title: "Email Already Exists",
            detail: format!("The email '{email}' is already registered to another scribe"),
        }
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::Conflict {
            title: "Conflict",
            detail: detail.into(),
        }
    }

    pub fn invalid_request() -> Self {
        Self::validation("Invalid Request", "Request body must be valid JSON")
    }

    pub fn invalid_visibility() -> Self {
        Self::validation(
            "Invalid Visibility",
            "Visibility must be either 'public' or 'private'",
        )
    }

    pub fn validation(title: &'static str, detail: impl Into<String>) -> Self {
        Self::ValidationFailed {
            title,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthenticationMissing | Self::AuthenticationInvalid => StatusCode::UNAUTHORIZED,
            Self::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_error_object(&self) -> ErrorObject {
        let (title, detail): (&str, String) = match self {
            Self::AuthenticationMissing => (
                "Authentication Required",
                "You must provide valid credentials to access this resource".into(),
            ),
            Self::AuthenticationInvalid => (
                "Invalid Credentials",
                "The username or password provided is incorrect".into(),
            ),
            Self::AuthorizationDenied(detail) => ("Forbidden", (*detail).into()),
            Self::NotFound { title, detail }
            | Self::Conflict { title, detail }
            | Self::ValidationFailed { title, detail } => (*title, detail.clone()),
            Self::UnsupportedMediaType => (
                "Unsupported Media Type",
                "Request body must be sent as application/json".into(),
            ),
            Self::Internal => (
                "Internal Server Error",
                "The server could not complete the request".into(),
            ),
        };

        ErrorObject {
            status: self.status().as_u16().to_string(),
            title: title.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorDocument {
            errors: vec![self.to_error_object()],
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(UniqueField::Username) => {
                Self::conflict("A scribe with this username already exists")
            }
            DbError::UniqueViolation(UniqueField::Email) => {
                Self::conflict("A scribe with this email already exists")
            }
            DbError::UniqueViolation(UniqueField::Other) => {
                Self::conflict("The request conflicts with existing data")
            }
            other => {
                error!("DB error: {}", other);
                Self::Internal
            }
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        error!("Password hashing error: {}", err);
        Self::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_kinds_share_a_status_but_not_a_title() {
        let missing = ApiError::AuthenticationMissing.to_error_object();
        let invalid = ApiError::AuthenticationInvalid.to_error_object();
        assert_eq!(missing.status, "401");
        assert_eq!(invalid.status, "401");
        assert_eq!(missing.title, "Authentication Required");
        assert_eq!(invalid.title, "Invalid Credentials");
    }

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(ApiError::AuthorizationDenied("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::entry_not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::username_taken("alice").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::invalid_visibility().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let err = ApiError::from(DbError::UniqueViolation(UniqueField::Email));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(DbError::LockPoisoned);
        assert!(matches!(err, ApiError::Internal));
    }

    #[test]
    fn internal_errors_do_not_leak_causes() {
        let object = ApiError::Internal.to_error_object();
        assert_eq!(object.status, "500");
        assert!(!object.detail.to_lowercase().contains("sqlite"));
    }
}
