//! Application state for the API server

use crate::{Config, DownloadOrchestrator};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator owning the job table
    pub orchestrator: DownloadOrchestrator,

    /// Configuration the server was started with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: DownloadOrchestrator, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }
}
