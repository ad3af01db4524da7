//! Traits and types for external transfer agents

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Callback receiving each trimmed, non-empty line the agent prints
pub type LineSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// One agent invocation
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Transfer manifest listing every file to fetch
    pub manifest: PathBuf,
    /// Proxy as configured (`host:port` or URL)
    pub proxy: Option<String>,
    /// Proxy credentials as `user:pass`
    pub proxy_auth: Option<String>,
}

impl AgentRequest {
    /// Request without proxy settings
    pub fn new(manifest: PathBuf) -> Self {
        Self {
            manifest,
            proxy: None,
            proxy_auth: None,
        }
    }
}

/// Trait for the process that performs the byte-level transfer
///
/// Implementations read a manifest, stream their textual status through
/// `on_line`, and report success only through their exit status.
///
/// # Examples
///
/// ```no_run
/// use cloudmail_dl::agent::{AgentRequest, Aria2Agent, TransferAgent};
/// use tokio_util::sync::CancellationToken;
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let agent = Aria2Agent::from_path().expect("aria2c not found");
/// let request = AgentRequest::new(PathBuf::from("input.txt"));
/// agent
///     .run(request, &|line| println!("{line}"), &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TransferAgent: Send + Sync {
    /// Run the agent to completion
    ///
    /// # Errors
    ///
    /// - [`AgentError::Launch`](crate::error::AgentError::Launch) if the process cannot start
    /// - [`AgentError::Exit`](crate::error::AgentError::Exit) on a non-zero exit
    /// - [`Error::Canceled`](crate::error::Error::Canceled) if `cancel` fires first
    async fn run(
        &self,
        request: AgentRequest,
        on_line: LineSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Get the name of this implementation
    fn name(&self) -> &'static str;
}
