//! Shared test helpers for creating DownloadOrchestrator instances in tests.

use crate::agent::{AgentRequest, LineSink, TransferAgent};
use crate::config::Config;
use crate::error::{AgentError, Error, ResolveError, Result};
use crate::orchestrator::DownloadOrchestrator;
use crate::resolver::ShareResolver;
use crate::types::{FileEntry, Job, JobId};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

/// What the scripted resolver does when called
#[derive(Clone)]
pub(crate) enum ResolveScript {
    Files(Vec<FileEntry>),
    Fail(String),
    HangUntilCanceled,
}

/// Resolver returning canned results
pub(crate) struct ScriptedResolver {
    script: ResolveScript,
    pub(crate) calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedResolver {
    pub(crate) fn new(script: ResolveScript) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ShareResolver for ScriptedResolver {
    async fn resolve(
        &self,
        links: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>> {
        self.calls.lock().unwrap().push(links.to_vec());
        match &self.script {
            ResolveScript::Files(files) => Ok(files.clone()),
            ResolveScript::Fail(link) => {
                Err(ResolveError::SessionNotFound { link: link.clone() }.into())
            }
            ResolveScript::HangUntilCanceled => {
                cancel.cancelled().await;
                Err(Error::Canceled)
            }
        }
    }
}

/// How the scripted agent finishes
#[derive(Clone, Copy)]
pub(crate) enum AgentOutcome {
    Success,
    Exit(i32),
    HangUntilCanceled,
}

/// Agent that replays output lines and then finishes as scripted
pub(crate) struct ScriptedAgent {
    lines: Vec<String>,
    outcome: AgentOutcome,
    pub(crate) requests: Mutex<Vec<AgentRequest>>,
    pub(crate) manifests: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub(crate) fn new(lines: &[&str], outcome: AgentOutcome) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            outcome,
            requests: Mutex::new(Vec::new()),
            manifests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TransferAgent for ScriptedAgent {
    async fn run(
        &self,
        request: AgentRequest,
        on_line: LineSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let manifest = std::fs::read_to_string(&request.manifest).unwrap_or_default();
        self.manifests.lock().unwrap().push(manifest);
        self.requests.lock().unwrap().push(request);

        for line in &self.lines {
            on_line(line);
            tokio::task::yield_now().await;
        }

        match self.outcome {
            AgentOutcome::Success => Ok(()),
            AgentOutcome::Exit(code) => Err(AgentError::Exit { code: Some(code) }.into()),
            AgentOutcome::HangUntilCanceled => {
                cancel.cancelled().await;
                Err(Error::Canceled)
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Two entries: one top-level file and one nested a folder deep
pub(crate) fn sample_files() -> Vec<FileEntry> {
    vec![
        FileEntry {
            url: "https://cloclo.example/get/AbCd/EfGh/a%20b.txt".into(),
            output: "Root/a b.txt".into(),
        },
        FileEntry {
            url: "https://cloclo.example/get/AbCd/EfGh/Sub/c.txt".into(),
            output: "Root/Sub/c.txt".into(),
        },
    ]
}

/// Test config rooted in a fresh temp dir.
/// Returns the config and the tempdir (which must be kept alive).
pub(crate) fn test_config() -> (Config, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    (config, temp_dir)
}

/// Helper to create a test DownloadOrchestrator with scripted components.
/// Returns the orchestrator and the tempdir (which must be kept alive).
pub(crate) fn create_test_orchestrator(
    resolver: Arc<ScriptedResolver>,
    agent: Arc<ScriptedAgent>,
) -> (DownloadOrchestrator, tempfile::TempDir) {
    let (config, temp_dir) = test_config();
    (
        DownloadOrchestrator::with_components(config, resolver, agent),
        temp_dir,
    )
}

/// Poll until the job reports `done`
pub(crate) async fn wait_for_done(orchestrator: &DownloadOrchestrator, id: &JobId) -> Job {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let job = orchestrator.get_progress(id).await.unwrap();
            if job.done {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not finish in time")
}

/// Poll until every job task has exited
pub(crate) async fn wait_for_idle(orchestrator: &DownloadOrchestrator) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while orchestrator.active_jobs() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job tasks did not exit in time");
}

/// Poll until the job reaches the given phase
pub(crate) async fn wait_for_phase(
    orchestrator: &DownloadOrchestrator,
    id: &JobId,
    phase: crate::types::Phase,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while orchestrator.get_progress(id).await.unwrap().phase != phase {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("job did not reach phase in time");
}
