use std::sync::Arc;

use cardio_events::BroadcastHub;
use cardio_store::{ActiveAlertRegistry, TimeSeriesStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<TimeSeriesStore>,
    pub registry: Arc<ActiveAlertRegistry>,
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    /// Fresh store, registry pre-populated with the configured patients,
    /// and a hub carrying the configured notifiers.
    pub fn from_config(config: ServerConfig) -> Self {
        let notifiers = config.notify_channels.iter().map(|c| c.build()).collect();
        let hub = BroadcastHub::with_notifiers(config.hub_config(), notifiers);
        let registry = ActiveAlertRegistry::new(config.patient_ids());
        Self {
            config: Arc::new(config),
            store: Arc::new(TimeSeriesStore::new()),
            registry: Arc::new(registry),
            hub: Arc::new(hub),
        }
    }
}
