use super::*;
use crate::orchestrator::test_helpers::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


/// Router over a scripted orchestrator whose agent succeeds immediately
fn test_app() -> (Router, DownloadOrchestrator, tempfile::TempDir) {
    test_app_with(
        ScriptedResolver::new(ResolveScript::Files(sample_files())),
        ScriptedAgent::new(&["(50%)"], AgentOutcome::Success),
        |_| {},
    )
}

fn test_app_with(
    resolver: ScriptedResolver,
    agent: ScriptedAgent,
    configure: impl FnOnce(&mut Config),
) -> (Router, DownloadOrchestrator, tempfile::TempDir) {
    let (orchestrator, temp_dir) = create_test_orchestrator(Arc::new(resolver), Arc::new(agent));
    let mut config = (*orchestrator.config).clone();
    configure(&mut config);
    let router = create_router(orchestrator.clone(), Arc::new(config));
    (router, orchestrator, temp_dir)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = tokio::time::timeout(
        Duration::from_secs(5),
        axum::body::to_bytes(response.into_body(), usize::MAX),
    )
    .await
    .unwrap()
    .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn server_binds_and_stops_on_signal() {
    let (orchestrator, _temp_dir) = create_test_orchestrator(
        Arc::new(ScriptedResolver::new(ResolveScript::Files(sample_files()))),
        Arc::new(ScriptedAgent::new(&[], AgentOutcome::Success)),
    );
    let mut config = (*orchestrator.config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(orchestrator, Arc::new(config), async {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _orchestrator, _temp_dir) = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let (app, _orchestrator, _temp_dir) = test_app_with(
        ScriptedResolver::new(ResolveScript::Files(sample_files())),
        ScriptedAgent::new(&[], AgentOutcome::Success),
        |config| config.server.api.cors_enabled = false,
    );
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn api_key_guards_every_route() {
    let (app, _orchestrator, _temp_dir) = test_app_with(
        ScriptedResolver::new(ResolveScript::Files(sample_files())),
        ScriptedAgent::new(&[], AgentOutcome::Success),
        |config| config.server.api.api_key = Some("s3cret".into()),
    );

    let response = send(&app, get("/jobs")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/jobs")
        .header("X-Api-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn cors_layer_accepts_explicit_origins() {
    let _ = build_cors_layer(&["http://localhost:3000".to_string()]);
    let _ = build_cors_layer(&[]);
}
