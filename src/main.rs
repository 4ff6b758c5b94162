//! Finance Tracker Server - Binary Entry Point

use std::sync::Arc;

use finance_tracker::{create_router, AppState, Settings, Store};
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let store = match &settings.data_file {
        Some(path) => Store::open(path)?,
        None => {
            tracing::warn!("FINANCE_DATA_FILE not set, data is kept in memory only");
            Store::in_memory()
        }
    };

    let address = settings.bind_address();
    let state = Arc::new(AppState::new(settings, Arc::new(store)));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, version = finance_tracker::VERSION, "Finance tracker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
