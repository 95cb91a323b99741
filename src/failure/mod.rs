//! Failure classification and user-facing remedies shared by all error types.
//!
//! Every library error maps onto one [`ErrorCategory`]. The category decides
//! retry behavior and supplies the remedy text shown next to terminal failures.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Connection, timeout, DNS or non-2xx failures. Retryable.
    Network,
    /// Expected page structure was absent. Retried once.
    Parsing,
    /// Permission, disk-full or invalid-path failures. Never retried.
    FileSystem,
    /// Malformed URL or batch entry. Rejected before any network activity.
    Validation,
    /// The caller cancelled the operation.
    Cancelled,
}

impl ErrorCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::FileSystem => "filesystem",
            Self::Validation => "validation",
            Self::Cancelled => "cancelled",
        }
    }

    /// Default remedy for the category.
    #[must_use]
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::Network => "Check network connectivity and try again.",
            Self::Parsing => {
                "The mod page may be temporarily unavailable or its layout changed. Try again later."
            }
            Self::FileSystem => {
                "Check write permissions and free disk space for the output directory."
            }
            Self::Validation => {
                "Verify the URL format: https://mods.factorio.com/mod/<mod_name>"
            }
            Self::Cancelled => "Run the command again to resume from the partial files.",
        }
    }

    /// Returns true when an operation failing with this category may succeed on retry.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Parsing)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Appends a `Suggestion:` line to an error message unless one is already present.
#[must_use]
pub fn with_suggestion(message: &str, category: ErrorCategory) -> String {
    if message.contains("Suggestion:") {
        return message.to_string();
    }
    format!("{message}\n  Suggestion: {}", category.suggestion())
}

/// Classifies an error message recorded in a result summary.
///
/// Used for failures that were flattened to strings (for example entries in
/// [`DownloadResult::failed`](crate::engine::DownloadResult)).
#[must_use]
pub fn classify_message(error: &str) -> ErrorCategory {
    let lower = error.to_ascii_lowercase();
    if lower.contains("cancelled") {
        ErrorCategory::Cancelled
    } else if lower.contains("io error") || lower.contains("permission") {
        ErrorCategory::FileSystem
    } else if lower.contains("could not find") || lower.contains("parse") {
        ErrorCategory::Parsing
    } else if lower.contains("invalid") {
        ErrorCategory::Validation
    } else {
        ErrorCategory::Network
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Parsing.is_retryable());
        assert!(!ErrorCategory::FileSystem.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
        assert!(!ErrorCategory::Cancelled.is_retryable());
    }

    #[test]
    fn test_with_suggestion_appends_once() {
        let msg = with_suggestion("HTTP 503 fetching page", ErrorCategory::Network);
        assert!(msg.contains("Suggestion: Check network connectivity"));

        let again = with_suggestion(&msg, ErrorCategory::Network);
        assert_eq!(again.matches("Suggestion:").count(), 1);
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            classify_message("IO error writing to /tmp/x.zip: denied"),
            ErrorCategory::FileSystem
        );
        assert_eq!(
            classify_message("download cancelled: https://x"),
            ErrorCategory::Cancelled
        );
        assert_eq!(
            classify_message("HTTP 500 downloading https://x"),
            ErrorCategory::Network
        );
        assert_eq!(
            classify_message("could not find mod name on https://x"),
            ErrorCategory::Parsing
        );
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(ErrorCategory::FileSystem.to_string(), "filesystem");
    }
}
