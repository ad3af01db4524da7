//! Shared fixtures for integration tests: a mocked share service and a
//! stand-in `aria2c` script.

#![allow(dead_code)]

use cloudmail_dl::{Config, DownloadOrchestrator, Job, JobId};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SHARE_ID: &str = "AbCd/EfGh";
pub const SESSION: &str = "sess42";
pub const TRANSFER_BASE: &str = "https://cloclo.example/weblink/get";

/// Mock server answering the share page, dispatcher and folder calls for
/// one share holding `Root/a.txt` and `Root/Sub/b.txt`
pub async fn mock_share_service() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/public/{SHARE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<script>var settings = {{"pageId":"{SESSION}","other":2}};</script>"#
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dispatcher"))
        .and(query_param("x-page-id", SESSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": { "weblink_get": [ { "url": TRANSFER_BASE } ] }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/folder"))
        .and(query_param("weblink", SHARE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": {
                "name": "Root",
                "list": [
                    { "type": "file", "name": "a.txt" },
                    { "type": "folder", "name": "Sub" }
                ]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/folder"))
        .and(query_param("weblink", format!("{SHARE_ID}/Sub")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": {
                "name": "Sub",
                "list": [ { "type": "file", "name": "b.txt" } ]
            }
        })))
        .mount(&server)
        .await;

    server
}

pub fn share_link(server: &MockServer) -> String {
    format!("{}/public/{SHARE_ID}", server.uri())
}

/// Write an executable shell script standing in for aria2c
///
/// The script records its arguments and a copy of the input file next to
/// itself, then runs `body`.
pub fn fake_aria2c(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("fake-aria2c");
    let contents = format!(
        r#"#!/bin/sh
here="$(dirname "$0")"
printf '%s\n' "$@" > "$here/args.txt"
for arg in "$@"; do
  case "$arg" in
    --input-file=*) cp "${{arg#--input-file=}}" "$here/manifest.txt" ;;
  esac
done
{body}
"#
    );
    std::fs::write(&script, contents).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Script body that reports progress with CR-separated updates and succeeds
pub const SUCCEEDING_AGENT: &str = r#"printf '[#1 5B/10B(50%%) CN:1]\r[#1 10B/10B(100%%) CN:1]\r'
printf '[NOTICE] Download complete: Root/a.txt\n'
printf '[NOTICE] Download complete: Root/Sub/b.txt\n'
exit 0"#;

/// Script body that fails with exit code 3
pub const FAILING_AGENT: &str = r#"printf 'errorCode=3 Resource not found\n' >&2
exit 3"#;

/// Script body that never finishes on its own
pub const HANGING_AGENT: &str = r#"printf '[#1 1B/10B(10%%) CN:1]\n'
exec sleep 30"#;

/// Config pointing the resolver at `server` and the agent at `agent`
pub fn config_for(server: &MockServer, agent: &Path, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.network.api_base = format!("{}/api/v2", server.uri());
    config.tools.aria2_path = Some(agent.to_path_buf());
    config.download.download_dir = temp_dir.path().join("downloads");
    config
}

pub async fn wait_for_done(orchestrator: &DownloadOrchestrator, id: &JobId) -> Job {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let job = orchestrator.get_progress(id).await.unwrap();
            if job.done {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("job did not finish in time")
}
