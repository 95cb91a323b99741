//! Downloaded-mod registry collaborator.
//!
//! The engine informs a [`ModRegistry`] after each successful download. The
//! registry is advisory: failures are logged by the caller and never fail
//! the download that triggered them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Registry record for one downloaded mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModEntry {
    pub name: String,
    pub version: String,
    pub file_path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// RFC 7231 HTTP-date of the download.
    pub download_date: String,
}

impl ModEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(name: &str, version: &str, file_path: &Path, size: u64) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            file_path: file_path.to_path_buf(),
            size,
            download_date: httpdate::fmt_http_date(SystemTime::now()),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Observer told about successfully downloaded mods.
#[async_trait]
pub trait ModRegistry: Send + Sync {
    /// Records (or replaces) the entry for `entry.name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the entry cannot be persisted.
    async fn record(&self, entry: ModEntry) -> Result<(), RegistryError>;
}

/// Registry persisted as a JSON object keyed by mod name.
#[derive(Debug)]
pub struct JsonModRegistry {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, ModEntry>>,
}

impl JsonModRegistry {
    /// Opens the registry at `path`.
    ///
    /// A missing file starts an empty registry. An unreadable or corrupt file
    /// is logged and also starts empty; it is overwritten on the next record.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "could not load mod registry; starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), count = entries.len(), "opened mod registry");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, ModEntry>, RegistryError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| RegistryError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Entry for `name`, if recorded.
    pub async fn get(&self, name: &str) -> Option<ModEntry> {
        self.entries.lock().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModRegistry for JsonModRegistry {
    async fn record(&self, entry: ModEntry) -> Result<(), RegistryError> {
        // Held across the write so concurrent workers never interleave saves.
        let mut entries = self.entries.lock().await;
        entries.insert(entry.name.clone(), entry);

        let io_err = |source| RegistryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&*entries).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json).await.map_err(io_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mod_registry.json");

        let registry = JsonModRegistry::open(&path).await;
        assert!(registry.is_empty().await);
        registry
            .record(ModEntry::now("flib", "0.13.1", Path::new("/mods/flib_0.13.1.zip"), 42))
            .await
            .unwrap();

        let reopened = JsonModRegistry::open(&path).await;
        let entry = reopened.get("flib").await.unwrap();
        assert_eq!(entry.version, "0.13.1");
        assert_eq!(entry.size, 42);
        assert!(entry.download_date.ends_with("GMT"));
    }

    #[tokio::test]
    async fn test_record_replaces_existing_entry() {
        let dir = TempDir::new().unwrap();
        let registry = JsonModRegistry::open(dir.path().join("r.json")).await;
        for version in ["1.0.0", "1.1.0"] {
            registry
                .record(ModEntry::now("flib", version, Path::new("x.zip"), 1))
                .await
                .unwrap();
        }
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get("flib").await.unwrap().version, "1.1.0");
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");
        std::fs::write(&path, "{not json").unwrap();
        let registry = JsonModRegistry::open(&path).await;
        assert!(registry.is_empty().await);
    }
}
