use proplift_api::config::Config;
use proplift_api::db::{DocumentStore, MongoStore};
use proplift_api::handlers::AppState;
use proplift_api::{routes, telemetry};
use std::sync::Arc;

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, connects the document store
/// (degraded if the database is unreachable), then serves the API until a
/// shutdown signal arrives and closes the store.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let store = Arc::new(MongoStore::connect(&config.database).await);
    if !store.is_available() {
        tracing::warn!("Document store unavailable, serving in degraded mode");
    }

    let app_state = Arc::new(AppState::new(store.clone(), config.database.clone()));
    let app = routes::router(app_state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await;
    Ok(())
}
