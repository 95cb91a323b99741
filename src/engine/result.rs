//! Aggregated outcome of a download run.

use std::time::Duration;

use serde::Serialize;

/// Summary built once every worker has joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadResult {
    /// True when no mod failed.
    pub success: bool,
    /// Names of mods now present in the output directory, in plan order.
    pub downloaded: Vec<String>,
    /// `(mod name, error description)` pairs, in plan order.
    pub failed: Vec<(String, String)>,
    /// Bytes written during this run (skipped files count as zero).
    pub total_bytes: u64,
    /// Wall-clock seconds.
    pub duration: f64,
}

impl DownloadResult {
    /// Result for a run that failed before any mod was attempted.
    #[must_use]
    pub fn failure(mod_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            failed: vec![(mod_name.into(), error.into())],
            ..Self::default()
        }
    }

    /// Marks the end of the run and derives `success`.
    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.duration = elapsed.as_secs_f64();
        self.success = self.failed.is_empty();
    }

    /// Folds another run's result into this one.
    pub(crate) fn absorb(&mut self, other: Self) {
        self.downloaded.extend(other.downloaded);
        self.failed.extend(other.failed);
        self.total_bytes += other.total_bytes;
    }

    /// True when some mods succeeded and some failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.downloaded.is_empty() && !self.failed.is_empty()
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.failed.len()
    }
}
