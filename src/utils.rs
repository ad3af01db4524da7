//! Utility functions for share paths (joining, sanitizing, URL encoding) and
//! pattern compilation

use regex::{Regex, RegexBuilder};

/// Characters that may not appear in an output path
const RESERVED_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Join path fragments with a single `/`
///
/// Leading and trailing slashes are trimmed from every part and empty parts are
/// skipped, so the result never starts or ends with `/` and never contains `//`.
///
/// # Examples
///
/// ```
/// use cloudmail_dl::utils::join_path;
///
/// assert_eq!(join_path(&["a/", "/b", "c"]), "a/b/c");
/// assert_eq!(join_path(&["", "x", "/"]), "x");
/// ```
pub fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Remove control characters and reserved filename characters
///
/// Drops U+0000..U+001F and `< > : " | ? *`. Everything else, including
/// non-ASCII text and `/`, passes through unchanged. Applying it twice is the
/// same as applying it once.
///
/// # Examples
///
/// ```
/// use cloudmail_dl::utils::sanitize_path;
///
/// assert_eq!(sanitize_path("folder<bad>|name:?.txt"), "folderbadname.txt");
/// ```
pub fn sanitize_path(path: &str) -> String {
    path.chars()
        .filter(|c| !(('\u{0000}'..='\u{001F}').contains(c) || RESERVED_PATH_CHARS.contains(c)))
        .collect()
}

/// Percent-encode each `/`-separated segment of a path on its own
///
/// Empty segments are dropped and separators are never encoded.
///
/// # Examples
///
/// ```
/// use cloudmail_dl::utils::encode_url_path;
///
/// assert_eq!(encode_url_path("a b/c#d"), "a%20b/c%23d");
/// ```
pub fn encode_url_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compile a built-in pattern with a bounded DFA size
///
/// A pattern that fails to compile is logged and yields `None`.
pub(crate) fn compile_pattern(pattern: &str, kind: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .size_limit(1024 * 1024)
        .build()
        .map_err(|e| {
            tracing::warn!(kind, pattern, error = %e, "Invalid built-in regex pattern");
        })
        .ok()
}
