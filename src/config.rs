//! Read-only configuration snapshot handed to the core at construction.
//!
//! The core never reads ambient global state: the binary loads a config file,
//! merges CLI flags and passes the resulting [`CoreConfig`] into
//! [`CoreDownloader::new`](crate::engine::CoreDownloader::new).

use std::path::PathBuf;
use std::time::Duration;

use crate::parser::ValidationError;
use crate::resolver::OptionalPolicy;

/// Default maximum retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default number of concurrent file downloads.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Upper bound for `concurrent_downloads`.
pub const MAX_CONCURRENCY: usize = 32;

/// Default mod portal base URL.
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://mods.factorio.com";

/// Default file mirror base URL.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://mods-storage.re146.dev";

/// Default page-fetch connect timeout (10 seconds).
pub const PAGE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default page-fetch read timeout (30 seconds).
pub const PAGE_READ_TIMEOUT_SECS: u64 = 30;

/// Default file download connect timeout (30 seconds).
pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default file download read timeout (5 minutes).
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 300;

/// Configuration consumed by the resolver and download engine.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Worker pool size (1..=32).
    pub concurrent_downloads: usize,
    /// Directory downloaded archives are written to.
    pub default_output_path: PathBuf,
    /// Include the root's optional dependencies.
    pub include_optional: bool,
    /// Include optional dependencies at every depth.
    pub include_optional_all: bool,
    /// Resume from `.part` files when the server honors ranges.
    pub resume: bool,
    /// Cancel remaining downloads after the first failure.
    pub fail_fast: bool,
    /// Report already-present archives as downloaded without fetching them.
    pub skip_existing: bool,
    pub portal_base_url: String,
    pub download_base_url: String,
    pub page_connect_timeout_secs: u64,
    pub page_read_timeout_secs: u64,
    pub download_connect_timeout_secs: u64,
    pub download_read_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            concurrent_downloads: DEFAULT_CONCURRENCY,
            default_output_path: default_mods_dir(),
            include_optional: false,
            include_optional_all: false,
            resume: true,
            fail_fast: false,
            skip_existing: true,
            portal_base_url: DEFAULT_PORTAL_BASE_URL.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            page_connect_timeout_secs: PAGE_CONNECT_TIMEOUT_SECS,
            page_read_timeout_secs: PAGE_READ_TIMEOUT_SECS,
            download_connect_timeout_secs: DOWNLOAD_CONNECT_TIMEOUT_SECS,
            download_read_timeout_secs: DOWNLOAD_READ_TIMEOUT_SECS,
        }
    }
}

impl CoreConfig {
    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrent_downloads) {
            return Err(ValidationError::invalid_config(
                "concurrent_downloads",
                format!(
                    "{} (expected 1..={MAX_CONCURRENCY})",
                    self.concurrent_downloads
                ),
            ));
        }
        for (key, value) in [
            ("page_connect_timeout_secs", self.page_connect_timeout_secs),
            ("page_read_timeout_secs", self.page_read_timeout_secs),
            (
                "download_connect_timeout_secs",
                self.download_connect_timeout_secs,
            ),
            ("download_read_timeout_secs", self.download_read_timeout_secs),
        ] {
            if !(1..=3600).contains(&value) {
                return Err(ValidationError::invalid_config(
                    key,
                    format!("{value} (expected 1..=3600)"),
                ));
            }
        }
        for (key, value) in [
            ("portal_base_url", &self.portal_base_url),
            ("download_base_url", &self.download_base_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ValidationError::invalid_config(key, value.clone()));
            }
        }
        Ok(())
    }

    /// Optional-dependency policy selected by the two inclusion flags.
    #[must_use]
    pub fn optional_policy(&self) -> OptionalPolicy {
        OptionalPolicy::from_flags(self.include_optional, self.include_optional_all)
    }

    /// Total attempts per download (`max_retries + 1`).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Default game mods directory for the current platform.
#[must_use]
pub fn default_mods_dir() -> PathBuf {
    if cfg!(windows)
        && let Some(appdata) = std::env::var_os("APPDATA").filter(|v| !v.is_empty())
    {
        return PathBuf::from(appdata).join("Factorio").join("mods");
    }
    match std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home).join(".factorio").join("mods"),
        None => PathBuf::from("mods"),
    }
}
