//! Share link resolution handler.

use super::{ResolveRequest, ResolveResponse};
use crate::api::AppState;
use crate::error::Result;
use axum::{Json, extract::State};

/// POST /resolve - Resolve share links into file entries
#[utoipa::path(
    post,
    path = "/resolve",
    tag = "resolve",
    request_body = ResolveRequest,
    responses(
        (status = 200, description = "Resolved files", body = ResolveResponse),
        (status = 400, description = "Empty link list or malformed link", body = crate::error::ApiError),
        (status = 502, description = "Share service request failed", body = crate::error::ApiError)
    )
)]
pub async fn resolve_links(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    let files = state.orchestrator.resolve_links(request.links).await?;
    Ok(Json(ResolveResponse { files }))
}
