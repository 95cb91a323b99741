//! Terminal errors returned by [`CoreDownloader`](super::CoreDownloader).
//!
//! Per-mod download failures are not errors at this level: they are recorded
//! in [`DownloadResult::failed`](super::DownloadResult) and the run continues.

use std::path::PathBuf;

use thiserror::Error;

use crate::failure::ErrorCategory;
use crate::parser::ValidationError;
use crate::portal::FetchError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Input was rejected before any network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The root mod (or its dependency listing) could not be fetched.
    #[error("could not resolve {url}: {source}")]
    Resolution {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The output directory could not be prepared.
    #[error("IO error preparing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A download client could not be built.
    #[error("could not initialize HTTP client: {reason}")]
    ClientInit { reason: String },

    /// The worker pool semaphore closed while dispatching.
    #[error("worker pool closed unexpectedly")]
    SemaphoreClosed,

    /// The run was cancelled before resolution finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn resolution(url: impl Into<String>, source: FetchError) -> Self {
        Self::Resolution {
            url: url.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn client_init(reason: impl Into<String>) -> Self {
        Self::ClientInit {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(e) => e.category(),
            Self::Resolution { source, .. } => source.category(),
            Self::Io { .. } => ErrorCategory::FileSystem,
            Self::ClientInit { .. } => ErrorCategory::Validation,
            Self::SemaphoreClosed => ErrorCategory::Network,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.suggestion(),
            Self::Resolution { source, .. } => source.suggestion(),
            Self::ClientInit { .. } => "Check proxy environment variables.",
            other => other.category().suggestion(),
        }
    }

    /// Message with exactly one trailing `Suggestion:` line.
    ///
    /// Wrapped validation and fetch errors already carry their own.
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.contains("Suggestion:") {
            message
        } else {
            format!("{message}\n  Suggestion: {}", self.suggestion())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_keeps_fetch_category() {
        let err = EngineError::resolution(
            "https://mods.factorio.com/mod/flib",
            FetchError::parsing("https://mods.factorio.com/mod/flib", "mod name"),
        );
        assert_eq!(err.category(), ErrorCategory::Parsing);
        assert!(err.to_string().contains("could not resolve"));
    }

    #[test]
    fn test_validation_error_converts() {
        let err: EngineError = ValidationError::not_a_mod_url("ftp://x").into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_message().contains("Suggestion:"));
    }

    #[test]
    fn test_io_error_is_filesystem() {
        let err = EngineError::io(
            "/root/mods",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert_eq!(err.user_message().matches("Suggestion:").count(), 1);
    }
}
