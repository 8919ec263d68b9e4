//! Constants for the download module (timeouts, buffering).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes; recordings are large and tuners slow).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum spacing between debug progress log lines for one transfer.
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 10;

/// Bytes per MiB, for log output.
pub const MIB: u64 = 1024 * 1024;
