//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`]: start, stop, inspect and stream download jobs
//! - [`resolve`]: resolve share links without downloading
//! - [`system`]: health and OpenAPI

use crate::types::{FileEntry, JobId};
use serde::{Deserialize, Serialize};

mod jobs;
mod resolve;
mod system;

pub use jobs::*;
pub use resolve::*;
pub use system::*;

/// Request body for POST /resolve
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ResolveRequest {
    /// Public share links
    pub links: Vec<String>,
}

/// Response for POST /resolve
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ResolveResponse {
    /// Every file reachable from the links, in traversal order
    pub files: Vec<FileEntry>,
}

/// Request body for POST /jobs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartJobRequest {
    /// Public share links
    pub links: Vec<String>,
    /// Overrides the configured download directory for this job
    #[serde(default)]
    pub download_dir: Option<String>,
}

/// Response for POST /jobs
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartJobResponse {
    /// Identifier of the accepted job
    pub job_id: JobId,
}

/// Response for POST /jobs/:id/stop
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StopJobResponse {
    /// Always true; unknown jobs answer 404 instead
    pub stopped: bool,
    /// Job snapshot after the stop
    pub job: crate::types::Job,
}
