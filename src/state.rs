//! Shared application state — one explicitly constructed instance,
//! wrapped in `Arc` at startup and handed to the router.

use std::sync::Arc;

use crate::backend::{FallbackBackend, HttpBackend, RuleEngine};
use crate::config::{self, Settings};
use crate::connectivity::ConnectivityMonitor;
use crate::records::RecordStore;
use crate::resolver::DiagnosisResolver;
use crate::snapshot::SnapshotStore;

/// The resolver as wired in production: HTTP primary, configurable
/// fallback slot.
pub type AppResolver = DiagnosisResolver<HttpBackend, FallbackBackend>;

pub struct AppState {
    pub store: Arc<RecordStore>,
    pub snapshot: SnapshotStore,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub resolver: AppResolver,
}

impl AppState {
    /// Wire the resolver, connectivity monitor, and stores together.
    /// The fallback slot is an HTTP client when a fallback URL is
    /// configured, the embedded rule engine otherwise.
    pub fn new(settings: &Settings, store: RecordStore, snapshot: SnapshotStore) -> Self {
        let store = Arc::new(store);
        let connectivity = Arc::new(ConnectivityMonitor::new());

        let primary = HttpBackend::new(&settings.primary_url, config::PRIMARY_TIMEOUT);
        let fallback = match &settings.fallback_url {
            Some(url) => {
                tracing::info!(url, "Using HTTP fallback backend");
                FallbackBackend::Http(HttpBackend::new(url, config::FALLBACK_TIMEOUT))
            }
            None => {
                tracing::info!("Using embedded rule-engine fallback");
                FallbackBackend::Rules(RuleEngine::new())
            }
        };

        let resolver = DiagnosisResolver::new(
            primary,
            fallback,
            Arc::clone(&connectivity),
            Arc::clone(&store),
        );

        Self {
            store,
            snapshot,
            connectivity,
            resolver,
        }
    }
}
