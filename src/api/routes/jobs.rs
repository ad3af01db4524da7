//! Download job handlers.

use super::{StartJobRequest, StartJobResponse, StopJobResponse};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{Job, JobId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::path::PathBuf;
use tokio_stream::StreamExt;

/// GET /jobs - List all jobs
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "jobs",
    responses(
        (status = 200, description = "Snapshots of every job, oldest first", body = Vec<Job>)
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.orchestrator.list_jobs().await)
}

/// POST /jobs - Start a download job
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    request_body = StartJobRequest,
    responses(
        (status = 201, description = "Job accepted", body = StartJobResponse),
        (status = 400, description = "No links given", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_job(
    State(state): State<AppState>,
    Json(request): Json<StartJobRequest>,
) -> Result<(StatusCode, Json<StartJobResponse>)> {
    let download_dir = request.download_dir.map(PathBuf::from);
    let job_id = state
        .orchestrator
        .start_download(request.links, download_dir)
        .await?;
    Ok((StatusCode::CREATED, Json(StartJobResponse { job_id })))
}

/// GET /jobs/:id - Get a job snapshot
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Current job snapshot", body = Job),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>> {
    let job = state.orchestrator.get_progress(&JobId::from(id)).await?;
    Ok(Json(job))
}

/// POST /jobs/:id/stop - Stop a job
#[utoipa::path(
    post,
    path = "/jobs/{id}/stop",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job stopped (or already finished)", body = StopJobResponse),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn stop_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StopJobResponse>> {
    let job = state.orchestrator.stop_job(&JobId::from(id)).await?;
    Ok(Json(StopJobResponse { stopped: true, job }))
}

/// GET /jobs/:id/events - Server-sent stream of job snapshots
///
/// Each snapshot is sent as a `progress` event; the terminal snapshot is sent
/// as a `done` event and closes the stream.
#[utoipa::path(
    get,
    path = "/jobs/{id}/events",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream"),
        (status = 404, description = "Job not found", body = crate::error::ApiError)
    )
)]
pub async fn job_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>>> {
    let subscription = state.orchestrator.subscribe_progress(&JobId::from(id))?;

    let stream = subscription
        .into_stream()
        .filter_map(|job| match serde_json::to_string(&job) {
            Ok(json_data) => {
                let event_type = if job.done { "done" } else { "progress" };
                Some(Ok(SseEvent::default()
                    .event(event_type)
                    .id(job.revision.to_string())
                    .data(json_data)))
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Failed to serialize job snapshot");
                None
            }
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
