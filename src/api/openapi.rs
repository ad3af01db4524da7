//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the cloudmail-dl REST API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "cloudmail-dl REST API",
        version = "0.1.0",
        description = "Resolve Cloud.Mail.ru public share links and run aria2 download jobs with live progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        crate::api::routes::list_jobs,
        crate::api::routes::start_job,
        crate::api::routes::get_job,
        crate::api::routes::stop_job,
        crate::api::routes::job_events,
        crate::api::routes::resolve_links,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::JobId,
        crate::types::Phase,
        crate::types::Job,
        crate::types::FileEntry,
        crate::types::ProgressEvent,

        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::NetworkConfig,
        crate::config::ToolsConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::ResolveRequest,
        crate::api::routes::ResolveResponse,
        crate::api::routes::StartJobRequest,
        crate::api::routes::StartJobResponse,
        crate::api::routes::StopJobResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Download jobs - start, stop, inspect and stream progress"),
        (name = "resolve", description = "Share link resolution without downloading"),
        (name = "system", description = "System endpoints - health check and OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `X-Api-Key` security scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
