use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use medassist::api;
use medassist::config::{self, Settings};
use medassist::records::RecordStore;
use medassist::snapshot::SnapshotStore;
use medassist::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env();

    let data_dir = config::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Cannot create data directory");
        std::process::exit(1);
    }

    let store = match RecordStore::open(&config::database_path()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Cannot open database");
            std::process::exit(1);
        }
    };

    let snapshot = SnapshotStore::open(config::snapshot_path());
    let state = Arc::new(AppState::new(&settings, store, snapshot));

    let mut server = match api::start_api_server(state, settings.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start API server");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr(), "Ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    server.shutdown();
}
