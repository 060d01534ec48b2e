mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use logbook_api::state::AppStateInner;
use logbook_crypto::Credentials;
use logbook_db::Database;

use crate::config::{Config, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbook=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("Starting Logbook in {:?} mode", config.environment);

    let db = if config.in_memory() {
        if config.environment != Environment::Testing {
            warn!("Using an in-memory database; data will not survive a restart");
        }
        Database::open_in_memory()?
    } else {
        info!("Opening database at {}", config.db_path.display());
        Database::open(&config.db_path)?
    };

    let credentials = Credentials::new(config.hash_cost)?;
    let state = AppStateInner::new(db, credentials);

    let app = logbook_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    info!("Logbook API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Logbook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
