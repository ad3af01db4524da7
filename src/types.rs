//! Core types for cloudmail-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use utoipa::ToSchema;

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a download job (`job-<unix-seconds>-<sequence>`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Allocate a new process-unique job id
    pub fn generate() -> Self {
        let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        Self(format!("job-{}-{:06}", Utc::now().timestamp(), seq))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one progress subscription, unique per broadcaster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Job lifecycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Accepted, background task not yet running
    Created,
    /// Walking share links into file entries
    Resolving,
    /// Transfer agent running
    Downloading,
    /// Agent finished successfully
    Done,
    /// Resolution or transfer failed
    Failed,
    /// Stopped by the caller
    Canceled,
}

impl Phase {
    /// Whether this phase ends the job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed | Phase::Canceled)
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::Resolving => "resolving",
            Phase::Downloading => "downloading",
            Phase::Done => "done",
            Phase::Failed => "failed",
            Phase::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a download job
///
/// Snapshots are owned copies; mutating one never affects the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    /// Job identifier
    pub id: JobId,
    /// Current lifecycle phase
    pub phase: Phase,
    /// Overall transfer percent (0-100)
    pub percent: u8,
    /// Human-readable status line
    pub message: String,
    /// True once the job reached a terminal phase
    pub done: bool,
    /// Failure text for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of resolved files
    pub total_files: usize,
    /// Estimated number of finished files
    pub done_files: usize,
    /// `total_files - done_files`
    pub remaining_files: usize,
    /// Output path of the file currently in flight, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    /// Incremented on every accepted mutation
    pub revision: u64,
    /// When the job was accepted
    #[schema(value_type = String)]
    pub started_at: DateTime<Utc>,
    /// When the job reached a terminal phase
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Fresh job in the `created` phase
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            phase: Phase::Created,
            percent: 0,
            message: "created".to_string(),
            done: false,
            error: None,
            total_files: 0,
            done_files: 0,
            remaining_files: 0,
            current_file: None,
            revision: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Fold a progress event into the snapshot
    ///
    /// Percent never moves backwards while the phase is unchanged.
    pub fn apply(&mut self, event: &ProgressEvent) {
        if event.phase != self.phase {
            self.percent = event.percent;
        } else {
            self.percent = self.percent.max(event.percent);
        }
        self.phase = event.phase;
        self.message = event.message.clone();
        self.total_files = event.total_files;
        self.done_files = event.done_files;
        self.remaining_files = event.remaining_files;
        self.current_file = event.current_file.clone();
        if event.phase.is_terminal() {
            self.finish(event.phase);
        }
    }

    /// Move to a terminal phase and stamp the finish time
    pub fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.done = true;
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }
}

/// A single file to hand to the transfer agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    /// Absolute transfer URL with per-segment percent-encoding
    pub url: String,
    /// Sanitized output path relative to the download directory
    pub output: String,
}

/// Progress report produced while a job runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProgressEvent {
    /// Phase the job is in
    pub phase: Phase,
    /// Overall percent (0-100)
    pub percent: u8,
    /// Status line (raw agent output while downloading)
    pub message: String,
    /// Number of resolved files
    pub total_files: usize,
    /// Estimated finished files
    pub done_files: usize,
    /// Estimated files still to go
    pub remaining_files: usize,
    /// Output path of the file in flight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
}

impl ProgressEvent {
    /// Event that only announces a phase change
    pub fn phase(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent: 0,
            message: message.into(),
            total_files: 0,
            done_files: 0,
            remaining_files: 0,
            current_file: None,
        }
    }
}
