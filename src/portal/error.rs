//! Error types for mod portal page fetches.

use thiserror::Error;

use crate::failure::ErrorCategory;

/// Errors that can occur while fetching or scraping a mod page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure.
    #[error(
        "network error fetching {url}: {source}\n  Suggestion: {}",
        ErrorCategory::Network.suggestion()
    )]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The page did not respond in time.
    #[error("timeout fetching {url}\n  Suggestion: {}", ErrorCategory::Network.suggestion())]
    Timeout { url: String },

    /// Non-2xx response.
    #[error("HTTP {status} fetching {url}\n  Suggestion: {suggestion}")]
    HttpStatus {
        url: String,
        status: u16,
        suggestion: &'static str,
    },

    /// A required page element was missing.
    #[error(
        "could not find {element} on {url}\n  Suggestion: {}",
        ErrorCategory::Parsing.suggestion()
    )]
    Parsing {
        url: String,
        /// Human-readable name of the missing element.
        element: &'static str,
    },

    /// The page URL could not be built or parsed.
    #[error(
        "invalid page URL '{url}': {reason}\n  Suggestion: {}",
        ErrorCategory::Validation.suggestion()
    )]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error(
        "HTTP client construction failed: {reason}\n  Suggestion: Check proxy environment variables"
    )]
    Client { reason: String },
}

impl FetchError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a transport error, splitting timeouts out of generic network failures.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::network(url, source)
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let suggestion = if status == 404 {
            "Verify the mod name; the page does not exist on the portal."
        } else {
            ErrorCategory::Network.suggestion()
        };
        Self::HttpStatus {
            url: url.into(),
            status,
            suggestion,
        }
    }

    pub fn parsing(url: impl Into<String>, element: &'static str) -> Self {
        Self::Parsing {
            url: url.into(),
            element,
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn client(reason: impl Into<String>) -> Self {
        Self::Client {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. } => {
                ErrorCategory::Network
            }
            Self::Parsing { .. } => ErrorCategory::Parsing,
            Self::InvalidUrl { .. } | Self::Client { .. } => ErrorCategory::Validation,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::HttpStatus { suggestion, .. } => suggestion,
            Self::Client { .. } => "Check proxy environment variables",
            other => other.category().suggestion(),
        }
    }

    /// Returns true when another fetch attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
