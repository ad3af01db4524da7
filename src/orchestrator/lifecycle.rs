//! Shutdown coordination.

use crate::error::Result;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::DownloadOrchestrator;

/// How long shutdown waits for job tasks to wind down
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl DownloadOrchestrator {
    /// Gracefully shut down the orchestrator
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs
    /// 2. Cancels every running job through the root cancellation token
    /// 3. Waits for job tasks to finish with a timeout (30 seconds)
    ///
    /// Canceled jobs end in the `canceled` phase and stay queryable.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        self.tasks.close();
        tracing::info!("Stopped accepting new jobs");

        self.shutdown_token.cancel();
        tracing::debug!(active_jobs = self.tasks.len(), "Signaled cancellation to all jobs");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.tasks.wait()).await {
            Ok(()) => tracing::info!("All jobs finished"),
            Err(_) => {
                tracing::warn!(
                    active_jobs = self.tasks.len(),
                    "Timeout waiting for jobs to finish, proceeding with shutdown"
                );
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new jobs are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Number of job tasks still running
    pub fn active_jobs(&self) -> usize {
        self.tasks.len()
    }
}
