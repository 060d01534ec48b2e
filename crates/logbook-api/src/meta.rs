use axum::{Json, http::Uri, response::IntoResponse};

use logbook_types::api::{ApiInfoAttributes, Document, HealthAttributes, Resource};

use crate::error::ApiError;

pub const API_VERSION: &str = "1.0.0";

/// GET /: service description.
pub async fn index() -> impl IntoResponse {
    Json(Document::new(Resource {
        kind: "api-info",
        id: "1".into(),
        attributes: ApiInfoAttributes {
            message: "Logbook API",
            version: API_VERSION,
            endpoints: "/api",
        },
    }))
}

/// GET /health: liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(Document::new(Resource {
        kind: "health-status",
        id: "1".into(),
        attributes: HealthAttributes { status: "healthy" },
    }))
}

/// Anything no route matched.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}
