//! Text extraction from share links and share pages.

use crate::error::{ResolveError, Result};
use crate::utils::compile_pattern;
use regex::Regex;
use std::sync::LazyLock;

const PUBLIC_LINK_ID_PATTERN: &str = r"/public/([^/?#]+/[^/?#]+)";

// Token ends at a quote, whitespace, comma or backslash
const PAGE_SESSION_PATTERN: &str = r#"pageId['"]*:\s*['"]*([^"'\s,\\]+)"#;

static PUBLIC_LINK_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_pattern(PUBLIC_LINK_ID_PATTERN, "public link"));

static PAGE_SESSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_pattern(PAGE_SESSION_PATTERN, "page session"));

/// Extract the `<segment>/<segment>` share identifier from a public link
pub fn parse_link_id(link: &str) -> Result<String> {
    PUBLIC_LINK_ID
        .as_ref()
        .and_then(|re| re.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ResolveError::InvalidLink {
                link: link.to_string(),
            }
            .into()
        })
}

/// Find the page session token embedded in a share page
///
/// Returns the first match; `None` when the page carries no token.
pub fn extract_page_session(page: &str) -> Option<String> {
    PAGE_SESSION
        .as_ref()
        .and_then(|re| re.captures(page))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
