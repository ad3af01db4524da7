//! REST API server module
//!
//! Exposes the orchestrator over HTTP: link resolution, job control, and a
//! server-sent event stream per job.

use crate::{Config, DownloadOrchestrator, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Jobs
/// - `GET /jobs` - List all jobs
/// - `POST /jobs` - Start a download job
/// - `GET /jobs/:id` - Get a job snapshot
/// - `POST /jobs/:id/stop` - Stop a job
/// - `GET /jobs/:id/events` - Server-sent job snapshots
///
/// ## Resolution
/// - `POST /resolve` - Resolve share links without downloading
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
pub fn create_router(orchestrator: DownloadOrchestrator, config: Arc<Config>) -> Router {
    let state = AppState::new(orchestrator, config.clone());

    let router = Router::new()
        .route("/jobs", get(routes::list_jobs).post(routes::start_job))
        .route("/jobs/:id", get(routes::get_job))
        .route("/jobs/:id/stop", post(routes::stop_job))
        .route("/jobs/:id/events", get(routes::job_events))
        .route("/resolve", post(routes::resolve_links))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        router.layer(build_cors_layer(&config.server.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer from configured origins (`"*"` or empty allows any)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on the configured bind address until the process stops
///
/// # Example
///
/// ```no_run
/// use cloudmail_dl::{Config, DownloadOrchestrator};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let orchestrator = DownloadOrchestrator::new(config.clone())?;
/// cloudmail_dl::api::start_api_server(orchestrator, Arc::new(config)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(orchestrator: DownloadOrchestrator, config: Arc<Config>) -> Result<()> {
    serve_until(orchestrator, config, std::future::pending()).await
}

/// Serve the API until `shutdown` completes, then stop accepting connections
///
/// The orchestrator itself is not shut down; callers decide when to do that.
pub async fn serve_until<F>(
    orchestrator: DownloadOrchestrator,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.api.bind_address;
    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(orchestrator, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
