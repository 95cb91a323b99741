//! Mod portal access: page fetching, scraping and the [`ModSource`] seam.
//!
//! [`PortalFetcher`] is the production [`ModSource`]. The resolver only sees
//! the trait, so resolution logic can be exercised with in-memory fakes.

mod error;
mod fetcher;
pub(crate) mod html;

pub use error::FetchError;
pub use fetcher::{DEPENDENCIES_QUERY, PortalFetcher};

use async_trait::async_trait;
use serde::Serialize;

use crate::download::sanitize_filename;

/// Mods shipped with the game itself; never fetched or downloaded.
pub const BUILTIN_MODS: &[&str] = &[
    "base",
    "core",
    "freeplay",
    "quality",
    "elevated-rails",
    "space-age",
];

/// Returns true if `name` is a game-provided mod.
#[must_use]
pub fn is_builtin_mod(name: &str) -> bool {
    BUILTIN_MODS
        .iter()
        .any(|builtin| builtin.eq_ignore_ascii_case(name.trim()))
}

/// Metadata scraped from one mod page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModInfo {
    pub name: String,
    pub version: String,
    /// Page the metadata was read from.
    pub portal_url: String,
    pub download_url: String,
    /// Archive size in bytes, when the page declares it.
    pub size: Option<u64>,
    /// True when the mod was reached through an optional dependency edge.
    pub is_optional: bool,
}

impl ModInfo {
    /// Identity key: the case-insensitive mod name.
    #[must_use]
    pub fn identity(&self) -> String {
        self.name.to_lowercase()
    }

    /// Archive file name, `{name}_{version}.zip`.
    #[must_use]
    pub fn file_name(&self) -> String {
        sanitize_filename(&format!("{}_{}.zip", self.name, self.version))
    }
}

/// One dependency declared on a mod's dependencies page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLink {
    /// Absolute mod page URL of the dependency.
    pub mod_url: String,
    pub is_optional: bool,
}

/// Source of mod metadata.
#[async_trait]
pub trait ModSource: Send + Sync {
    /// Fetches the metadata for one mod page.
    ///
    /// # Errors
    ///
    /// [`FetchError::Parsing`] when required elements are absent, network
    /// variants when the page cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<ModInfo, FetchError>;

    /// Lists declared dependencies in page order.
    ///
    /// # Errors
    ///
    /// Network variants when the dependencies page cannot be retrieved.
    async fn fetch_dependencies(&self, url: &str) -> Result<Vec<DependencyLink>, FetchError>;
}
