//! Job bookkeeping: registry, progress broadcast and file-count estimation.

pub mod broadcast;
pub mod progress;
pub mod registry;

pub use broadcast::{ProgressBroadcaster, ProgressSubscription};
pub use progress::FileProgress;
pub use registry::JobRegistry;
