//! aria2c console output parsing

use crate::utils::compile_pattern;
use regex::Regex;
use std::sync::LazyLock;

static PERCENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile_pattern(r"(\d{1,3})%", "percent"));

/// Marker aria2c prints (in any case) when one file finishes
pub const COMPLETION_MARKER: &str = "download complete:";

/// First percent token on the line, clamped to 100
pub fn parse_percent(line: &str) -> Option<u8> {
    let caps = PERCENT.as_ref()?.captures(line)?;
    let value: u16 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.min(100) as u8)
}

/// Whether the line reports a finished file
pub fn is_completion_marker(line: &str) -> bool {
    line.to_lowercase().contains(COMPLETION_MARKER)
}
