//! Download orchestration split into focused submodules.
//!
//! The `DownloadOrchestrator` struct and its methods are organized by domain:
//! - [`control`] - resolve, start, stop and query jobs
//! - [`tasks`] - the per-job background task (resolve, manifest, agent run)
//! - [`lifecycle`] - shutdown coordination

mod control;
mod lifecycle;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::agent::{Aria2Agent, TransferAgent};
use crate::config::Config;
use crate::error::Result;
use crate::jobs::{JobRegistry, ProgressBroadcaster};
use crate::resolver::{LinkResolver, ShareResolver};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
///
/// Each accepted download runs as its own background task with a cancellation
/// token derived from the orchestrator's root token. Jobs are independent: there
/// is no queue and no admission limit.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Share link resolver (trait object so tests can script it)
    pub(crate) resolver: Arc<dyn ShareResolver>,
    /// External transfer agent
    pub(crate) agent: Arc<dyn TransferAgent>,
    /// Job table and progress fan-out
    pub(crate) registry: JobRegistry,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Parent of every job's cancellation token
    pub(crate) shutdown_token: CancellationToken,
    /// Tracks running job tasks so shutdown can wait for them
    pub(crate) tasks: TaskTracker,
}

impl DownloadOrchestrator {
    /// Create an orchestrator backed by the network resolver and aria2c
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) when the configuration is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let resolver = LinkResolver::new(&config.network)?;
        let agent = Aria2Agent::from_config(&config.tools);

        tracing::info!(
            agent = %agent.binary_path().display(),
            api_base = resolver.api_base(),
            download_dir = %config.download.download_dir.display(),
            "Download orchestrator initialized"
        );

        Ok(Self::with_components(
            config,
            Arc::new(resolver),
            Arc::new(agent),
        ))
    }

    /// Create an orchestrator with explicit resolver and agent implementations
    pub fn with_components(
        config: Config,
        resolver: Arc<dyn ShareResolver>,
        agent: Arc<dyn TransferAgent>,
    ) -> Self {
        let broadcaster = ProgressBroadcaster::new(config.download.subscriber_buffer);
        Self {
            config: Arc::new(config),
            resolver,
            agent,
            registry: JobRegistry::new(broadcaster),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
