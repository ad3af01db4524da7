//! Cloud.Mail.ru share link resolution
//!
//! Turns public share links into a flat list of [`FileEntry`] values:
//! - [`link`] - link identifier and page session extraction
//! - [`api`] - dispatcher and folder API calls, recursive folder walk
//!
//! Resolution is fail-fast: the first error for any link aborts the whole batch.

pub mod api;
pub mod link;


pub use link::{extract_page_session, parse_link_id};

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::types::FileEntry;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for turning share links into transferable file entries
///
/// The orchestrator only talks to this seam, so tests can substitute a scripted
/// resolver for the network-backed [`LinkResolver`].
#[async_trait]
pub trait ShareResolver: Send + Sync {
    /// Resolve every non-blank link, in input order
    ///
    /// # Errors
    ///
    /// Returns the first resolution error; results for earlier links are discarded.
    /// Returns [`Error::Canceled`] once `cancel` fires.
    async fn resolve(&self, links: &[String], cancel: &CancellationToken)
    -> Result<Vec<FileEntry>>;
}

/// Network-backed resolver for Cloud.Mail.ru public links
#[derive(Clone, Debug)]
pub struct LinkResolver {
    pub(crate) client: reqwest::Client,
    pub(crate) api_base: String,
}

impl LinkResolver {
    /// Build a resolver from network settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the proxy settings cannot be parsed or the
    /// HTTP client cannot be built.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = config.proxy.as_deref().map(str::trim)
            && !proxy.is_empty()
        {
            builder = builder.proxy(build_proxy(proxy, config.proxy_auth.as_deref())?);
        }

        let client = builder.build().map_err(|e| Error::Config {
            message: format!("failed to build HTTP client: {e}"),
            key: None,
        })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Point the resolver at another API base (used against mock servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Resolve a single share link
    pub async fn resolve_link(
        &self,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>> {
        let link_id = parse_link_id(link)?;
        let session = self.fetch_page_session(link, cancel).await?;
        let base_url = self.fetch_base_url(link, &session, cancel).await?;

        tracing::debug!(link, link_id = %link_id, "Walking share folder tree");
        self.walk_folder(&link_id, "", &session, &base_url, cancel)
            .await
    }
}

#[async_trait]
impl ShareResolver for LinkResolver {
    async fn resolve(
        &self,
        links: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>> {
        let mut all = Vec::new();
        for raw in links {
            let link = raw.trim();
            if link.is_empty() {
                continue;
            }
            let files = self.resolve_link(link, cancel).await.inspect_err(|e| {
                tracing::warn!(link, error = %e, "Failed to resolve share link");
            })?;
            tracing::info!(link, files = files.len(), "Resolved share link");
            all.extend(files);
        }
        Ok(all)
    }
}

/// Build a reqwest proxy from `host:port` (or a full URL) and optional `user:pass`
fn build_proxy(proxy: &str, auth: Option<&str>) -> Result<reqwest::Proxy> {
    let with_scheme = if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("http://{proxy}")
    };

    let parsed = url::Url::parse(&with_scheme).map_err(|e| Error::Config {
        message: format!("invalid proxy '{proxy}': {e}"),
        key: Some("proxy".into()),
    })?;

    let mut built = reqwest::Proxy::all(parsed.as_str()).map_err(|e| Error::Config {
        message: format!("invalid proxy '{proxy}': {e}"),
        key: Some("proxy".into()),
    })?;

    if let Some(auth) = auth.map(str::trim)
        && !auth.is_empty()
    {
        let (user, pass) = auth.split_once(':').unwrap_or((auth, ""));
        built = built.basic_auth(user, pass);
    }

    Ok(built)
}
