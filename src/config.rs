//! Configuration types for cloudmail-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

/// Default Cloud.Mail.ru API base used by the link resolver.
pub const DEFAULT_API_BASE: &str = "https://cloud.mail.ru/api/v2";

/// Environment variable consulted for the aria2c binary when no explicit path is configured.
pub const ARIA2_PATH_ENV: &str = "CLOUDMAIL_DL_ARIA2C";

/// Main configuration for [`DownloadOrchestrator`](crate::DownloadOrchestrator)
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig): target directory, manifest handling, subscriber buffers
/// - [`network`](NetworkConfig): API base, timeouts, proxy and user agent
/// - [`tools`](ToolsConfig): aria2c location and its transfer parallelism
/// - [`server`](ServerIntegrationConfig): REST API settings
///
/// All sub-config fields except `api` are flattened, so the serialized form is a
/// single flat object.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// HTTP client settings for link resolution
    #[serde(flatten)]
    pub network: NetworkConfig,

    /// External tool settings
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Check settings that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.download.subscriber_buffer == 0 {
            return Err(Error::Config {
                message: "subscriber_buffer must be at least 1".into(),
                key: Some("subscriber_buffer".into()),
            });
        }
        if self.network.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".into(),
                key: Some("timeout".into()),
            });
        }
        if url::Url::parse(&self.network.api_base).is_err() {
            return Err(Error::Config {
                message: format!("api_base is not a valid URL: {}", self.network.api_base),
                key: Some("api_base".into()),
            });
        }
        if self.network.proxy_auth.is_some() && self.network.proxy.is_none() {
            return Err(Error::Config {
                message: "proxy_auth requires proxy to be set".into(),
                key: Some("proxy_auth".into()),
            });
        }
        for (key, value) in [
            ("connections_per_server", self.tools.connections_per_server),
            ("split", self.tools.split),
            ("max_concurrent_downloads", self.tools.max_concurrent_downloads),
        ] {
            if value == 0 {
                return Err(Error::Config {
                    message: format!("{key} must be at least 1"),
                    key: Some(key.into()),
                });
            }
        }
        Ok(())
    }
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Default directory for downloaded files (default: "downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Keep the generated transfer manifest after the agent exits (default: false)
    #[serde(default)]
    pub keep_manifest: bool,

    /// Per-subscriber progress buffer; full buffers drop updates (default: 16)
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            keep_manifest: false,
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

/// HTTP client configuration used by the link resolver
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NetworkConfig {
    /// Cloud.Mail.ru API base URL (default: https://cloud.mail.ru/api/v2)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Proxy as `host:port` or a URL; used for resolution and passed to aria2c
    #[serde(default)]
    pub proxy: Option<String>,

    /// Proxy credentials as `user:pass`
    #[serde(default)]
    pub proxy_auth: Option<String>,

    /// User-Agent header for resolver requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout: default_timeout(),
            proxy: None,
            proxy_auth: None,
            user_agent: default_user_agent(),
        }
    }
}

/// External tool configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to aria2c executable (auto-detected if None)
    #[serde(default)]
    pub aria2_path: Option<PathBuf>,

    /// Whether to search PATH for aria2c if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// aria2c `--max-connection-per-server` (default: 10)
    #[serde(default = "default_parallelism")]
    pub connections_per_server: u32,

    /// aria2c `--split` (default: 10)
    #[serde(default = "default_parallelism")]
    pub split: u32,

    /// aria2c `--max-concurrent-downloads` (default: 10)
    #[serde(default = "default_parallelism")]
    pub max_concurrent_downloads: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            aria2_path: None,
            search_path: true,
            connections_per_server: default_parallelism(),
            split: default_parallelism(),
            max_concurrent_downloads: default_parallelism(),
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_subscriber_buffer() -> usize {
    16
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("cloudmail-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_parallelism() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.download.download_dir, PathBuf::from("downloads"));
        assert!(!config.download.keep_manifest);
        assert_eq!(config.download.subscriber_buffer, 16);
        assert_eq!(config.network.api_base, "https://cloud.mail.ru/api/v2");
        assert_eq!(config.network.timeout, Duration::from_secs(30));
        assert!(config.network.user_agent.starts_with("cloudmail-dl/"));
        assert_eq!(config.tools.connections_per_server, 10);
        assert_eq!(config.tools.split, 10);
        assert_eq!(config.tools.max_concurrent_downloads, 10);
        assert!(config.tools.search_path);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");
        assert_eq!(config.download.subscriber_buffer, 16);
        assert_eq!(config.network.timeout, Duration::from_secs(30));
        assert_eq!(
            config.server.api.bind_address,
            SocketAddr::from(([127, 0, 0, 1], 6790))
        );
    }

    #[test]
    fn flattened_fields_are_read_from_top_level() {
        let json = r#"{
            "download_dir": "/data/cloud",
            "keep_manifest": true,
            "timeout": 5,
            "proxy": "127.0.0.1:8080",
            "split": 4,
            "api": { "api_key": "secret" }
        }"#;
        let config: Config = serde_json::from_str(json).expect("deserialize failed");
        assert_eq!(config.download_dir(), &PathBuf::from("/data/cloud"));
        assert!(config.download.keep_manifest);
        assert_eq!(config.network.timeout, Duration::from_secs(5));
        assert_eq!(config.network.proxy.as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(config.tools.split, 4);
        assert_eq!(config.server.api.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn timeout_serializes_as_seconds() {
        let config = Config::default();
        let value = serde_json::to_value(&config).expect("serialize failed");
        assert_eq!(value["timeout"], 30);
    }

    #[test]
    fn validate_rejects_zero_subscriber_buffer() {
        let mut config = Config::default();
        config.download.subscriber_buffer = 0;
        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("subscriber_buffer")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_bad_api_base() {
        let mut config = Config::default();
        config.network.api_base = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "api_base"
        ));
    }

    #[test]
    fn validate_rejects_proxy_auth_without_proxy() {
        let mut config = Config::default();
        config.network.proxy_auth = Some("user:pass".into());
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "proxy_auth"
        ));
    }

    #[test]
    fn validate_rejects_zero_parallelism() {
        let mut config = Config::default();
        config.tools.split = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "split"
        ));
    }
}
