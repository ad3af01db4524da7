//! Cloud.Mail.ru web API calls: share page, dispatcher and folder listing.

use super::LinkResolver;
use super::link::extract_page_session;
use crate::error::{Error, ResolveError, Result};
use crate::types::FileEntry;
use crate::utils::{encode_url_path, join_path, sanitize_path};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// `GET {api_base}/dispatcher` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DispatcherResponse {
    #[serde(default)]
    pub(crate) body: Option<DispatcherBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DispatcherBody {
    #[serde(default)]
    pub(crate) weblink_get: Option<Vec<ShardUrl>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShardUrl {
    #[serde(default)]
    pub(crate) url: Option<String>,
}

impl DispatcherResponse {
    /// First non-blank transfer base URL
    pub(crate) fn base_url(&self) -> Option<&str> {
        self.body
            .as_ref()?
            .weblink_get
            .as_ref()?
            .first()?
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }
}

/// `GET {api_base}/folder` response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FolderResponse {
    #[serde(default)]
    pub(crate) body: Option<FolderBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FolderBody {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) list: Option<Vec<FolderItem>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FolderItem {
    #[serde(default, rename = "type")]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

impl FolderItem {
    fn is_folder(&self) -> bool {
        self.kind.as_deref() == Some("folder")
    }
}

impl LinkResolver {
    /// Download the share page and mine its page session token
    pub(crate) async fn fetch_page_session(
        &self,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let page = self.get_text(link, &[], cancel).await?;
        extract_page_session(&page).ok_or_else(|| {
            ResolveError::SessionNotFound {
                link: link.to_string(),
            }
            .into()
        })
    }

    /// Ask the dispatcher for the transfer host serving this session
    pub(crate) async fn fetch_base_url(
        &self,
        link: &str,
        session: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let endpoint = format!("{}/dispatcher", self.api_base);
        let body = self
            .get_text(&endpoint, &[("x-page-id", session)], cancel)
            .await?;

        let response: DispatcherResponse = decode("dispatcher", &body)?;
        response
            .base_url()
            .map(str::to_string)
            .ok_or_else(|| {
                ResolveError::BaseUrlNotFound {
                    link: link.to_string(),
                }
                .into()
            })
    }

    /// Recursively list a share folder
    ///
    /// The output path of this level comes from the server-reported folder name,
    /// while child folders are addressed by this request's identifier joined with
    /// the listed item name.
    pub(crate) fn walk_folder<'a>(
        &'a self,
        link_id: &'a str,
        parent_path: &'a str,
        session: &'a str,
        base_url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<FileEntry>>> {
        async move {
            let endpoint = format!("{}/folder", self.api_base);
            let body = self
                .get_text(
                    &endpoint,
                    &[("weblink", link_id), ("x-page-id", session)],
                    cancel,
                )
                .await?;

            let response: FolderResponse = decode("folder", &body)?;
            let folder = response.body.unwrap_or_default();
            let current_path = join_path(&[parent_path, folder.name.as_deref().unwrap_or("")]);
            let base = base_url.trim_end_matches('/');

            let mut files = Vec::new();
            for item in folder.list.unwrap_or_default() {
                let name = item.name.as_deref().unwrap_or("");
                if item.is_folder() {
                    let child_id = join_path(&[link_id, name]);
                    let nested = self
                        .walk_folder(&child_id, &current_path, session, base_url, cancel)
                        .await?;
                    files.extend(nested);
                } else {
                    files.push(FileEntry {
                        url: format!("{base}/{}", encode_url_path(&join_path(&[link_id, name]))),
                        output: sanitize_path(&join_path(&[current_path.as_str(), name])),
                    });
                }
            }

            tracing::debug!(
                link_id,
                path = %current_path,
                files = files.len(),
                "Listed share folder"
            );
            Ok(files)
        }
        .boxed()
    }

    /// GET a URL and return its body, honoring cancellation
    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Canceled),
            result = self.send_get(url, query) => result,
        }
    }

    async fn send_get(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transfer_error(url, None, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Transfer {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("http status {}", status.as_u16()),
            }
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| transfer_error(url, Some(status.as_u16()), &e))
    }
}

fn transfer_error(url: &str, status: Option<u16>, error: &reqwest::Error) -> Error {
    ResolveError::Transfer {
        url: url.to_string(),
        status,
        reason: error.to_string(),
    }
    .into()
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        ResolveError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
