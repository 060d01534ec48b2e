//! HTTP surface of the Logbook service: handlers, authentication middleware and
//! the JSON:API error mapping.

pub mod auth;
pub mod body;
pub mod entries;
pub mod error;
pub mod meta;
pub mod middleware;
pub mod policy;
pub mod scribes;
pub mod state;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::state::AppState;

/// The full application router. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/enlist", post(auth::enlist))
        .route("/auth/unlock", post(auth::unlock))
        .route("/auth/lock", post(auth::lock))
        .route(
            "/scribes/{scribe_id}",
            get(scribes::get_scribe)
                .patch(scribes::amend_scribe)
                .delete(scribes::retire_scribe),
        )
        .route("/entries", post(entries::create_entry))
        .route(
            "/entries/{entry_id}",
            get(entries::get_entry)
                .patch(entries::update_entry)
                .delete(entries::delete_entry),
        )
        .route("/chronicle", get(entries::chronicle))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_caller,
        ));

    Router::new()
        .route("/", get(meta::index))
        .route("/health", get(meta::health))
        .nest("/api", api)
        .fallback(meta::not_found)
        .with_state(state)
}
