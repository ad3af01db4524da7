//! aria2c-backed transfer agent

use super::traits::{AgentRequest, LineSink, TransferAgent};
use crate::config::{ARIA2_PATH_ENV, ToolsConfig};
use crate::error::{AgentError, Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;

/// User agent aria2c presents to the transfer host
pub const ARIA2_USER_AGENT: &str = "Mozilla/5.0 (compatible; Firefox/3.6; Linux)";

const DEFAULT_BINARY: &str = "aria2c";
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Transfer agent that runs the external `aria2c` binary
///
/// # Examples
///
/// ```no_run
/// use cloudmail_dl::agent::Aria2Agent;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let agent = Aria2Agent::new(PathBuf::from("/usr/bin/aria2c"));
///
/// // Or auto-discover from PATH
/// let agent = Aria2Agent::from_path().expect("aria2c not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct Aria2Agent {
    binary_path: PathBuf,
    connections_per_server: u32,
    split: u32,
    max_concurrent_downloads: u32,
}

impl Aria2Agent {
    /// Create an agent with an explicit binary path and default parallelism (10)
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            connections_per_server: 10,
            split: 10,
            max_concurrent_downloads: 10,
        }
    }

    /// Attempt to find aria2c in PATH
    pub fn from_path() -> Option<Self> {
        which::which(DEFAULT_BINARY).ok().map(Self::new)
    }

    /// Create an agent from tool settings
    ///
    /// Binary lookup order: `aria2_path`, the `CLOUDMAIL_DL_ARIA2C` environment
    /// variable, PATH search (when `search_path` is set), then the bare name `aria2c`.
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let binary_path = tools
            .aria2_path
            .clone()
            .or_else(|| {
                std::env::var(ARIA2_PATH_ENV)
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .or_else(|| {
                tools
                    .search_path
                    .then(|| which::which(DEFAULT_BINARY).ok())
                    .flatten()
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));

        Self {
            binary_path,
            connections_per_server: tools.connections_per_server,
            split: tools.split,
            max_concurrent_downloads: tools.max_concurrent_downloads,
        }
    }

    /// Binary that will be executed
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Command-line arguments for one invocation
    pub fn args(&self, request: &AgentRequest) -> Vec<String> {
        let mut args = vec![
            "--file-allocation=none".to_string(),
            format!("--max-connection-per-server={}", self.connections_per_server),
            format!("--split={}", self.split),
            format!("--max-concurrent-downloads={}", self.max_concurrent_downloads),
            "--summary-interval=1".to_string(),
            "--continue=true".to_string(),
            format!("--user-agent={ARIA2_USER_AGENT}"),
            format!("--input-file={}", request.manifest.display()),
        ];

        if let Some(proxy) = request.proxy.as_deref().map(str::trim)
            && !proxy.is_empty()
        {
            let value = match request.proxy_auth.as_deref().map(str::trim) {
                Some(auth) if !auth.is_empty() => format!("{auth}@{proxy}"),
                _ => proxy.to_string(),
            };
            args.push(format!("--all-proxy={value}"));
        }

        args
    }
}

#[async_trait]
impl TransferAgent for Aria2Agent {
    async fn run(
        &self,
        request: AgentRequest,
        on_line: LineSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut child = Command::new(&self.binary_path)
            .args(self.args(&request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::Launch {
                binary: self.binary_path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            binary = %self.binary_path.display(),
            manifest = %request.manifest.display(),
            "Started aria2c"
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained before the exit status is collected.
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            status = async {
                tokio::join!(drain_lines(stdout, on_line), drain_lines(stderr, on_line));
                child.wait().await
            } => Some(status),
        };

        let Some(status) = outcome else {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill aria2c after cancellation");
            }
            return Err(Error::Canceled);
        };

        let status = status?;
        if status.success() {
            Ok(())
        } else {
            Err(AgentError::Exit {
                code: status.code(),
            }
            .into())
        }
    }

    fn name(&self) -> &'static str {
        "aria2c"
    }
}

/// Forward each CR- or LF-terminated line to `on_line`
async fn drain_lines<R>(reader: Option<R>, on_line: LineSink<'_>)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };

    let codec = AnyDelimiterCodec::new_with_max_length(b"\r\n".to_vec(), Vec::new(), MAX_LINE_LENGTH);
    let mut lines = FramedRead::new(reader, codec);

    while let Some(chunk) = lines.next().await {
        match chunk {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let line = text.trim();
                if !line.is_empty() {
                    on_line(line);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable aria2c output, discarding the rest");
                let mut rest = lines.into_inner();
                let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
                return;
            }
        }
    }
}
