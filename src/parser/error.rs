//! Error types for mod URL and batch input validation.

use thiserror::Error;

use crate::failure::ErrorCategory;

/// Maximum URL length to accept (standard browser limit).
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors raised before any network activity takes place.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// URL is not a mod portal page URL.
    #[error("invalid mod URL '{url}': {reason}\n  Suggestion: {suggestion}")]
    InvalidUrl {
        url: String,
        reason: String,
        suggestion: String,
    },

    /// URL exceeds maximum allowed length.
    #[error(
        "URL too long ({length} chars, max {max}): {url_preview}...\n  Suggestion: Check the input for extraneous content"
    )]
    UrlTooLong {
        url_preview: String,
        length: usize,
        max: usize,
    },

    /// A batch entry had the wrong shape.
    #[error("invalid batch entry {index}: {reason}\n  Suggestion: {suggestion}")]
    InvalidBatchEntry {
        /// One-based entry (or line) number.
        index: usize,
        reason: String,
        suggestion: String,
    },

    /// The batch source could not be read or decoded.
    #[error("invalid batch input: {reason}\n  Suggestion: {suggestion}")]
    InvalidBatch { reason: String, suggestion: String },

    /// A configuration value is out of range.
    #[error(
        "invalid config value for {key}: {value}\n  Suggestion: Check the value in your config file or command-line flags"
    )]
    InvalidConfig { key: String, value: String },
}

impl ValidationError {
    /// Creates an `InvalidUrl` error for a URL outside the portal pattern.
    #[must_use]
    pub fn not_a_mod_url(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "expected a mod portal page URL".to_string(),
            suggestion: ErrorCategory::Validation.suggestion().to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a malformed URL.
    #[must_use]
    pub fn malformed(url: &str, parse_error: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: parse_error.to_string(),
            suggestion: ErrorCategory::Validation.suggestion().to_string(),
        }
    }

    /// Creates a `UrlTooLong` error for URLs exceeding the maximum length.
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::UrlTooLong {
            url_preview: url.chars().take(50).collect(),
            length: url.len(),
            max: MAX_URL_LENGTH,
        }
    }

    /// Creates an `InvalidBatchEntry` error for an entry that is neither a URL
    /// string nor an object with a `url` field.
    #[must_use]
    pub fn bad_entry(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidBatchEntry {
            index,
            reason: reason.into(),
            suggestion: "Each entry must be a mod URL string or an object with a \"url\" field"
                .to_string(),
        }
    }

    /// Creates an `InvalidBatch` error for undecodable batch content.
    #[must_use]
    pub fn bad_batch(reason: impl Into<String>) -> Self {
        Self::InvalidBatch {
            reason: reason.into(),
            suggestion:
                "Use a JSON object with a \"mods\" array, a JSON array, or one URL per line"
                    .to_string(),
        }
    }

    /// Creates an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }

    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        ErrorCategory::Validation.suggestion()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_mod_url_message() {
        let err = ValidationError::not_a_mod_url("https://example.com/x");
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/x"));
        assert!(msg.contains("Suggestion: Verify the URL format"));
    }

    #[test]
    fn test_too_long_truncates_preview() {
        let url = format!("https://mods.factorio.com/mod/{}", "a".repeat(3000));
        let err = ValidationError::too_long(&url);
        match err {
            ValidationError::UrlTooLong {
                url_preview,
                length,
                max,
            } => {
                assert_eq!(url_preview.len(), 50);
                assert_eq!(length, url.len());
                assert_eq!(max, MAX_URL_LENGTH);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_bad_entry_reports_index() {
        let err = ValidationError::bad_entry(3, "expected string");
        assert!(err.to_string().contains("entry 3"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}
