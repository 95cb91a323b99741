//! Partial-download state: `.part` files and server range support.

use std::path::{Path, PathBuf};

use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT_RANGES, RANGE};
use tracing::{debug, info, instrument, warn};

use super::constants::PARTIAL_SUFFIX;
use super::error::DownloadError;

/// Detects, validates and retires `.part` files.
///
/// Every method takes the FINAL destination path; the partial path is
/// derived from it with [`partial_path`](Self::partial_path).
#[derive(Debug, Clone)]
pub struct RecoveryManager {
    client: Client,
}

impl RecoveryManager {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `{final_path}.part`
    #[must_use]
    pub fn partial_path(final_path: &Path) -> PathBuf {
        let mut os = final_path.as_os_str().to_os_string();
        os.push(PARTIAL_SUFFIX);
        PathBuf::from(os)
    }

    /// Byte length of the partial file, 0 when absent or unreadable.
    pub async fn resume_position(&self, final_path: &Path) -> u64 {
        let partial = Self::partial_path(final_path);
        match tokio::fs::metadata(&partial).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => 0,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %e, "cannot stat partial file");
                }
                0
            }
        }
    }

    /// True when the partial file is a non-empty regular file no larger than
    /// `expected_total` (when known).
    pub async fn validate_partial(&self, final_path: &Path, expected_total: Option<u64>) -> bool {
        let partial = Self::partial_path(final_path);
        let Ok(meta) = tokio::fs::metadata(&partial).await else {
            return false;
        };
        if !meta.is_file() || meta.len() == 0 {
            debug!(path = %partial.display(), "partial file is empty or not a regular file");
            return false;
        }
        if let Some(total) = expected_total
            && meta.len() > total
        {
            warn!(
                path = %partial.display(),
                bytes = meta.len(),
                expected = total,
                "partial file larger than expected total"
            );
            return false;
        }
        true
    }

    /// True iff a valid partial file exists and the server honors ranges for `url`.
    #[instrument(skip(self), fields(path = %final_path.display()))]
    pub async fn can_resume(&self, final_path: &Path, url: &str) -> bool {
        if !self.validate_partial(final_path, None).await {
            return false;
        }
        let supported = self.server_supports_ranges(url).await;
        if supported {
            let bytes = self.resume_position(final_path).await;
            info!(bytes, "found resumable partial download");
        } else {
            debug!("server does not advertise range support");
        }
        supported
    }

    /// HEAD probe: `Accept-Ranges: bytes`, else a one-byte range answered with 206.
    pub async fn server_supports_ranges(&self, url: &str) -> bool {
        if let Ok(response) = self.client.head(url).send().await
            && response.status().is_success()
            && response
                .headers()
                .get(ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"))
        {
            return true;
        }

        self.client
            .head(url)
            .header(RANGE, "bytes=0-0")
            .send()
            .await
            .is_ok_and(|response| response.status() == StatusCode::PARTIAL_CONTENT)
    }

    /// Atomically moves the partial file over the final path.
    ///
    /// `rename` replaces an existing destination, so the final path always
    /// holds either the old file or the complete new one.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when the rename fails.
    pub async fn finalize(
        &self,
        partial_path: &Path,
        final_path: &Path,
    ) -> Result<(), DownloadError> {
        tokio::fs::rename(partial_path, final_path)
            .await
            .map_err(|e| DownloadError::io(final_path, e))
    }

    /// Deletes the partial file for `final_path`; absent files are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when the file exists but cannot be removed.
    pub async fn cleanup(&self, final_path: &Path) -> Result<(), DownloadError> {
        let partial = Self::partial_path(final_path);
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => {
                debug!(path = %partial.display(), "removed partial file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DownloadError::io(partial, e)),
        }
    }
}
