//! Constants for the download module (timeouts).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default deadline for a whole batch (3 minutes).
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(180);
