//! Job control: resolve, start, stop, progress queries and subscriptions.

use crate::error::{Error, Result};
use crate::jobs::ProgressSubscription;
use crate::types::{FileEntry, Job, JobId, Phase};
use crate::utils::sanitize_path;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::DownloadOrchestrator;

impl DownloadOrchestrator {
    /// Resolve share links into file entries without starting a transfer
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty list and otherwise the
    /// first resolution error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use cloudmail_dl::*;
    /// # async fn example(orchestrator: DownloadOrchestrator) -> Result<()> {
    /// let files = orchestrator
    ///     .resolve_links(vec!["https://cloud.mail.ru/public/9bFs/gVzxjU5uC".into()])
    ///     .await?;
    /// for file in files {
    ///     println!("{} -> {}", file.url, file.output);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn resolve_links(&self, links: Vec<String>) -> Result<Vec<FileEntry>> {
        if links.is_empty() {
            return Err(Error::InvalidArgument("links must not be empty".into()));
        }
        let cancel = self.shutdown_token.child_token();
        self.resolver.resolve(&links, &cancel).await
    }

    /// Accept a download job and start it in the background
    ///
    /// Returns immediately with the new job id; progress is observed through
    /// [`get_progress`](Self::get_progress) or [`subscribe_progress`](Self::subscribe_progress).
    /// `download_dir` overrides the configured download directory for this job.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if no non-blank link was given (no job is created)
    /// - [`Error::ShuttingDown`] once shutdown has begun
    pub async fn start_download(
        &self,
        links: Vec<String>,
        download_dir: Option<PathBuf>,
    ) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if links.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::InvalidArgument("links must not be empty".into()));
        }

        let (id, download_dir, cancel) = self.accept_job(download_dir);
        tracing::info!(
            job_id = %id,
            links = links.len(),
            download_dir = %download_dir.display(),
            "Download job accepted"
        );

        let this = self.clone();
        let job_id = id.clone();
        self.tasks.spawn(async move {
            this.run_job(job_id, links, download_dir, cancel).await;
        });

        Ok(id)
    }

    /// Start a download job for files that were already resolved
    ///
    /// Pairs with [`resolve_links`](Self::resolve_links): the job skips the
    /// `resolving` phase and goes straight to `downloading`. Output paths are
    /// sanitized before they reach the transfer manifest.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty list, or an entry with a blank
    ///   URL or output path (no job is created)
    /// - [`Error::ShuttingDown`] once shutdown has begun
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use cloudmail_dl::*;
    /// # async fn example(orchestrator: DownloadOrchestrator) -> Result<()> {
    /// let files = orchestrator
    ///     .resolve_links(vec!["https://cloud.mail.ru/public/9bFs/gVzxjU5uC".into()])
    ///     .await?;
    /// let wanted = files.into_iter().filter(|f| f.output.ends_with(".mkv")).collect();
    /// let job_id = orchestrator.start_download_resolved(wanted, None).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_download_resolved(
        &self,
        files: Vec<FileEntry>,
        download_dir: Option<PathBuf>,
    ) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if files.is_empty() {
            return Err(Error::InvalidArgument("files must not be empty".into()));
        }
        let files = files
            .into_iter()
            .map(|file| {
                let output = sanitize_path(file.output.trim());
                if file.url.trim().is_empty() || output.is_empty() {
                    return Err(Error::InvalidArgument(format!(
                        "file entry needs a URL and an output path: {:?}",
                        file.output
                    )));
                }
                Ok(FileEntry {
                    url: file.url.trim().to_string(),
                    output,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (id, download_dir, cancel) = self.accept_job(download_dir);
        tracing::info!(
            job_id = %id,
            files = files.len(),
            download_dir = %download_dir.display(),
            "Resolved download job accepted"
        );

        let this = self.clone();
        let job_id = id.clone();
        self.tasks.spawn(async move {
            this.run_resolved_job(job_id, files, download_dir, cancel).await;
        });

        Ok(id)
    }

    /// Register a new job and pick its download directory
    fn accept_job(&self, download_dir: Option<PathBuf>) -> (JobId, PathBuf, CancellationToken) {
        let id = JobId::generate();
        let cancel = self.shutdown_token.child_token();
        self.registry.create_job(id.clone(), cancel.clone());

        let download_dir = download_dir
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| self.config.download.download_dir.clone());
        (id, download_dir, cancel)
    }

    /// Stop a job
    ///
    /// Cancels the job's token and marks it canceled right away. Stopping a job
    /// that already finished changes nothing. Returns the job snapshot after the stop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn stop_job(&self, id: &JobId) -> Result<Job> {
        let token = self.registry.cancel_token(id)?;
        token.cancel();

        if self
            .registry
            .update_job(id, |job| {
                job.message = "canceled by user".to_string();
                job.finish(Phase::Canceled);
            })
            .is_some()
        {
            tracing::info!(job_id = %id, "Download job stopped");
        }

        self.registry.get_job(id)
    }

    /// Current snapshot of a job
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn get_progress(&self, id: &JobId) -> Result<Job> {
        self.registry.get_job(id)
    }

    /// Subscribe to a job's snapshots
    ///
    /// The first snapshot is the current state. The subscription ends after the
    /// job finishes, or when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn subscribe_progress(&self, id: &JobId) -> Result<ProgressSubscription> {
        self.registry.subscribe(id)
    }

    /// Snapshots of every job, oldest first
    pub async fn list_jobs(&self) -> Vec<Job> {
        let mut jobs = self.registry.list_jobs();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }
}
