//! REST API server example
//!
//! Runs cloudmail-dl with the REST API enabled and stops cleanly on Ctrl+C.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:6790/swagger-ui
//! - Start jobs via POST http://localhost:6790/jobs
//! - Stream a job via GET http://localhost:6790/jobs/{id}/events

use cloudmail_dl::api::serve_until;
use cloudmail_dl::config::{ApiConfig, Config, ServerIntegrationConfig};
use cloudmail_dl::{DownloadOrchestrator, wait_for_signal};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config {
        server: ServerIntegrationConfig {
            api: ApiConfig {
                bind_address: "127.0.0.1:6790".parse::<SocketAddr>()?,
                api_key: None,
                ..Default::default()
            },
        },
        ..Default::default()
    };

    let orchestrator = DownloadOrchestrator::new(config.clone())?;

    println!("Starting cloudmail-dl REST API server");
    println!("Swagger UI: http://localhost:6790/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  # Start a job");
    println!("  curl -X POST http://localhost:6790/jobs \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"links\": [\"https://cloud.mail.ru/public/9bFs/gVzxjU5uC\"]}}'");
    println!();
    println!("  # Follow its progress (Server-Sent Events)");
    println!("  curl -N http://localhost:6790/jobs/<job_id>/events");

    serve_until(orchestrator.clone(), Arc::new(config), wait_for_signal()).await?;
    orchestrator.shutdown().await?;

    Ok(())
}
