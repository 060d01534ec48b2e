use std::sync::Arc;

use tracing::error;

use logbook_crypto::Credentials;
use logbook_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

/// Everything a request handler may touch. Built once at startup and shared.
pub struct AppStateInner {
    pub db: Database,
    pub credentials: Credentials,
}

impl AppStateInner {
    pub fn new(db: Database, credentials: Credentials) -> AppState {
        Arc::new(Self { db, credentials })
    }
}

/// Run blocking work (SQLite calls, password hashing) off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}
