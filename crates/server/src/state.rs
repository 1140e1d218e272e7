use vidstage_core::{AccessGrant, BroadcastSink, Config, JobOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: JobOrchestrator,
    status_feed: BroadcastSink,
    storage_access: AccessGrant,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: JobOrchestrator,
        status_feed: BroadcastSink,
        storage_access: AccessGrant,
    ) -> Self {
        Self {
            config,
            orchestrator,
            status_feed,
            storage_access,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    /// Status events fanned out to WebSocket clients.
    pub fn status_feed(&self) -> &BroadcastSink {
        &self.status_feed
    }

    pub fn storage_access(&self) -> &AccessGrant {
        &self.storage_access
    }
}
