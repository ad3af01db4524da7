//! # cloudmail-dl
//!
//! Backend library that turns Cloud.Mail.ru public share links into aria2
//! download jobs.
//!
//! ## Design Philosophy
//!
//! cloudmail-dl is designed to be:
//! - **Library-first** - a Rust crate for embedding, with an optional REST API
//! - **Non-blocking** - starting a job returns immediately; work runs in the background
//! - **Observable** - every job can be polled or streamed as snapshots
//! - **Delegating** - bytes are moved by `aria2c`, not by this crate
//!
//! ## Quick Start
//!
//! ```no_run
//! use cloudmail_dl::{Config, DownloadOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = DownloadOrchestrator::new(Config::default())?;
//!
//!     let job_id = orchestrator
//!         .start_download(vec!["https://cloud.mail.ru/public/9bFs/gVzxjU5uC".into()], None)
//!         .await?;
//!
//!     let mut progress = orchestrator.subscribe_progress(&job_id)?;
//!     while let Some(job) = progress.next().await {
//!         println!("{} {}% {}", job.phase, job.percent, job.message);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// External transfer agent (aria2c)
pub mod agent;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Job registry and progress broadcast
pub mod jobs;
/// Job orchestration (decomposed into focused submodules)
pub mod orchestrator;
/// Share link resolution
pub mod resolver;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use agent::{AgentRequest, Aria2Agent, TransferAgent};
pub use config::Config;
pub use error::{AgentError, ApiError, Error, ErrorDetail, ResolveError, Result, ToHttpStatus};
pub use jobs::ProgressSubscription;
pub use orchestrator::DownloadOrchestrator;
pub use resolver::{LinkResolver, ShareResolver};
pub use types::{FileEntry, Job, JobId, Phase, ProgressEvent};

/// Helper function to run the orchestrator with graceful signal handling.
///
/// Waits for a termination signal and then calls the orchestrator's `shutdown()`
/// method, which cancels every running job.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use cloudmail_dl::{Config, DownloadOrchestrator, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = DownloadOrchestrator::new(Config::default())?;
///     run_with_shutdown(orchestrator).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: DownloadOrchestrator) -> Result<()> {
    wait_for_signal().await;
    orchestrator.shutdown().await
}

/// Resolves once SIGTERM or SIGINT (Ctrl+C elsewhere) arrives
pub async fn wait_for_signal() {
    #[cfg(unix)]
    wait_for_unix_signal().await;

    #[cfg(not(unix))]
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}

#[cfg(unix)]
async fn wait_for_unix_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}
