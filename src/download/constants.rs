//! Constants for the download module.

use std::time::Duration;

/// Suffix appended to the final path while a transfer is in progress.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Minimum interval between byte-progress reports for one transfer.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Buffer size for the partial-file writer.
pub const WRITE_BUFFER_BYTES: usize = 64 * 1024;
