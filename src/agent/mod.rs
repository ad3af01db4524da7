//! External transfer agent handling
//!
//! The byte-level transfer is delegated to `aria2c`. This module writes its
//! input manifest, runs it, and splits its console output into lines.

pub mod aria2;
pub mod manifest;
pub mod parser;
pub mod traits;

pub use aria2::{ARIA2_USER_AGENT, Aria2Agent};
pub use manifest::{Manifest, write_manifest};
pub use parser::{COMPLETION_MARKER, is_completion_marker, parse_percent};
pub use traits::{AgentRequest, LineSink, TransferAgent};
