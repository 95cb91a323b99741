//! Error types for the download module.
//!
//! This module defines structured errors for file downloads, providing
//! context-rich messages for logs and for the per-mod failure summary.

use std::path::PathBuf;

use thiserror::Error;

use crate::failure::ErrorCategory;

/// Errors that can occur during file downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Any non-2xx response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Received byte count disagrees with the expected total.
    #[error(
        "integrity check failed for {path}: expected {expected_bytes} bytes, got {actual_bytes}"
    )]
    Integrity {
        /// Download path that failed verification.
        path: PathBuf,
        /// Expected size in bytes.
        expected_bytes: u64,
        /// Actual size in bytes.
        actual_bytes: u64,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientInit {
        /// Builder failure description.
        reason: String,
    },

    /// The caller cancelled the transfer; the partial file was kept.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL being downloaded.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a transport error, splitting timeouts out of generic network failures.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an integrity mismatch error.
    pub fn integrity(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Integrity {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates a client construction error.
    pub fn client_init(reason: impl Into<String>) -> Self {
        Self::ClientInit {
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Error taxonomy bucket.
    ///
    /// An integrity mismatch is a transfer problem (short or overlong body),
    /// so it is retried like any other network failure.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::Integrity { .. } => ErrorCategory::Network,
            Self::Io { .. } => ErrorCategory::FileSystem,
            Self::InvalidUrl { .. } | Self::ClientInit { .. } => ErrorCategory::Validation,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::HttpStatus { status: 404, .. } => {
                "The mirror does not have this version. Try again later or pick another version."
            }
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => {
                "Check write permissions for the output directory."
            }
            Self::ClientInit { .. } => "Check proxy environment variables.",
            other => other.category().suggestion(),
        }
    }

    /// Message with a trailing `Suggestion:` line, for terminal output.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("{self}\n  Suggestion: {}", self.suggestion())
    }
}

// Note on From trait implementations:
// We do NOT implement `From<reqwest::Error>` or `From<std::io::Error>` because
// our variants require context (url, path) that the source errors don't carry.
// The helper constructors (network(), io(), etc.) supply it.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://mods-storage.re146.dev/flib/1.0.0.zip");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("flib/1.0.0.zip"));
        assert_eq!(error.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://mods-storage.re146.dev/a/1.zip", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(error.suggestion().contains("mirror"));
    }

    #[test]
    fn test_download_error_io_is_filesystem() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/test.zip"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.zip"), "Expected path in: {msg}");
        assert_eq!(error.category(), ErrorCategory::FileSystem);
        assert!(!error.category().is_retryable());
        assert!(error.suggestion().contains("permissions"));
    }

    #[test]
    fn test_download_error_cancelled() {
        let error = DownloadError::cancelled("https://x/y.zip");
        assert_eq!(error.category(), ErrorCategory::Cancelled);
        assert!(error.to_string().contains("cancelled"));
    }

    #[test]
    fn test_user_message_has_suggestion() {
        let error = DownloadError::http_status("https://x/y.zip", 503);
        let msg = error.user_message();
        assert!(msg.contains("HTTP 503"));
        assert!(msg.contains("\n  Suggestion: Check network connectivity"));
    }
}
