//! Per-job background task: resolve, write the manifest, run the agent.

use crate::agent::{AgentRequest, Manifest};
use crate::error::{AgentError, Error, Result};
use crate::jobs::FileProgress;
use crate::types::{FileEntry, JobId, Phase, ProgressEvent};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use super::DownloadOrchestrator;

impl DownloadOrchestrator {
    /// Drive one job from `created` to a terminal phase
    pub(crate) async fn run_job(
        &self,
        id: JobId,
        links: Vec<String>,
        download_dir: PathBuf,
        cancel: CancellationToken,
    ) {
        self.registry.update_job(&id, |job| {
            job.apply(&ProgressEvent::phase(Phase::Resolving, "resolving links"));
        });

        let result = match self.resolver.resolve(&links, &cancel).await {
            Ok(files) => self.execute_job(&id, files, download_dir, &cancel).await,
            Err(e) => Err(e),
        };
        self.complete_job(&id, result, &cancel);
    }

    /// Drive a job whose files were resolved by the caller
    pub(crate) async fn run_resolved_job(
        &self,
        id: JobId,
        files: Vec<FileEntry>,
        download_dir: PathBuf,
        cancel: CancellationToken,
    ) {
        let result = self.execute_job(&id, files, download_dir, &cancel).await;
        self.complete_job(&id, result, &cancel);
    }

    async fn execute_job(
        &self,
        id: &JobId,
        files: Vec<FileEntry>,
        download_dir: PathBuf,
        cancel: &CancellationToken,
    ) -> Result<ProgressEvent> {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        if files.is_empty() {
            return Err(AgentError::EmptyManifest.into());
        }

        let progress = FileProgress::new(&files);
        self.registry.update_job(id, |job| {
            job.apply(&progress.started(format!("resolved {} files", progress.total())));
        });
        tracing::info!(job_id = %id, files = files.len(), "Share links resolved, starting transfer");

        tokio::fs::create_dir_all(&download_dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory '{}': {}",
                    download_dir.display(),
                    e
                ),
            ))
        })?;

        let manifest = Manifest::create(&files, &download_dir, self.config.download.keep_manifest)?;
        let request = AgentRequest {
            manifest: manifest.path().to_path_buf(),
            proxy: self.config.network.proxy.clone(),
            proxy_auth: self.config.network.proxy_auth.clone(),
        };

        let tracker = Mutex::new(progress);
        let on_line = |line: &str| {
            let event = tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observe(line);
            self.registry.update_job(id, |job| job.apply(&event));
        };

        self.registry.update_job(id, |job| {
            job.message = format!("{} started", self.agent.name());
        });
        let outcome = self.agent.run(request, &on_line, cancel).await;

        if let Manifest::Kept(path) = &manifest {
            tracing::debug!(job_id = %id, manifest = %path.display(), "Transfer manifest kept");
        }
        drop(manifest);
        outcome?;

        Ok(tracker
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .finished())
    }

    /// Record the job's final phase
    ///
    /// A canceled token always means `canceled`, never `failed`. If the job was
    /// already stopped, the registry ignores this update.
    fn complete_job(&self, id: &JobId, result: Result<ProgressEvent>, cancel: &CancellationToken) {
        match result {
            Ok(event) => {
                self.registry.update_job(id, |job| job.apply(&event));
                tracing::info!(job_id = %id, files = event.total_files, "Download job completed");
            }
            Err(e) if cancel.is_cancelled() || matches!(e, Error::Canceled) => {
                self.registry.update_job(id, |job| {
                    job.message = "canceled".to_string();
                    job.finish(Phase::Canceled);
                });
                tracing::info!(job_id = %id, "Download job canceled");
            }
            Err(e) => {
                let text = e.to_string();
                self.registry.update_job(id, |job| {
                    job.message = text.clone();
                    job.error = Some(text.clone());
                    job.finish(Phase::Failed);
                });
                tracing::warn!(job_id = %id, error = %e, "Download job failed");
            }
        }
    }
}
