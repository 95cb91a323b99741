//! In-memory [`ModSource`] for resolver and engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::parser::mod_name_from_url;
use crate::portal::{DependencyLink, FetchError, ModInfo, ModSource};

const PORTAL: &str = "https://mods.factorio.com";

#[derive(Debug, Clone)]
struct FakeMod {
    name: String,
    version: String,
    size: Option<u64>,
    deps: Vec<(String, bool)>,
}

/// Synthetic portal: mods, their dependency edges and injected failures.
#[derive(Debug, Clone)]
pub(crate) struct FakeModSource {
    mods: HashMap<String, FakeMod>,
    failures: HashSet<String>,
    /// Remaining failing fetches per mod before it starts succeeding.
    transient_failures: Arc<Mutex<HashMap<String, usize>>>,
    download_base: String,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
    dependency_fetches: Arc<Mutex<usize>>,
}

impl FakeModSource {
    pub(crate) fn new() -> Self {
        Self {
            mods: HashMap::new(),
            failures: HashSet::new(),
            transient_failures: Arc::new(Mutex::new(HashMap::new())),
            download_base: "https://mods-storage.re146.dev".to_string(),
            fetches: Arc::new(Mutex::new(HashMap::new())),
            dependency_fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Page URL of `name` on the fake portal.
    pub(crate) fn url(name: &str) -> String {
        format!("{PORTAL}/mod/{name}")
    }

    /// Adds a mod with `(dependency, is_optional)` edges.
    pub(crate) fn with_mod(self, name: &str, deps: &[(&str, bool)]) -> Self {
        self.with_sized_mod(name, None, deps)
    }

    pub(crate) fn with_sized_mod(
        mut self,
        name: &str,
        size: Option<u64>,
        deps: &[(&str, bool)],
    ) -> Self {
        self.mods.insert(
            name.to_lowercase(),
            FakeMod {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                size,
                deps: deps.iter().map(|(d, o)| ((*d).to_string(), *o)).collect(),
            },
        );
        self
    }

    /// Makes every fetch of `name` fail with HTTP 500.
    pub(crate) fn with_failure(mut self, name: &str) -> Self {
        self.failures.insert(name.to_lowercase());
        self
    }

    /// Makes the first `count` metadata fetches of `name` fail with HTTP 503.
    pub(crate) fn with_transient_failure(self, name: &str, count: usize) -> Self {
        self.transient_failures
            .lock()
            .unwrap()
            .insert(name.to_lowercase(), count);
        self
    }

    /// Points generated download URLs at `base`.
    pub(crate) fn with_download_base(mut self, base: &str) -> Self {
        self.download_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Number of metadata fetches issued for `name`.
    pub(crate) fn fetch_count(&self, name: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn dependency_fetch_count(&self) -> usize {
        *self.dependency_fetches.lock().unwrap()
    }

    fn lookup(&self, url: &str) -> Result<&FakeMod, FetchError> {
        let key = mod_name_from_url(url)
            .ok_or_else(|| FetchError::invalid_url(url, "not a mod page"))?
            .to_lowercase();
        if self.failures.contains(&key) {
            return Err(FetchError::http_status(url, 500));
        }
        self.mods
            .get(&key)
            .ok_or_else(|| FetchError::parsing(url, "mod name"))
    }
}

#[async_trait]
impl ModSource for FakeModSource {
    async fn fetch(&self, url: &str) -> Result<ModInfo, FetchError> {
        if let Some(name) = mod_name_from_url(url) {
            *self
                .fetches
                .lock()
                .unwrap()
                .entry(name.to_lowercase())
                .or_insert(0) += 1;
        }
        if let Some(name) = mod_name_from_url(url) {
            let mut transient = self.transient_failures.lock().unwrap();
            if let Some(remaining) = transient.get_mut(&name.to_lowercase())
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(FetchError::http_status(url, 503));
            }
        }
        let fake = self.lookup(url)?;
        Ok(ModInfo {
            name: fake.name.clone(),
            version: fake.version.clone(),
            portal_url: Self::url(&fake.name),
            download_url: format!("{}/{}/{}.zip", self.download_base, fake.name, fake.version),
            size: fake.size,
            is_optional: false,
        })
    }

    async fn fetch_dependencies(&self, url: &str) -> Result<Vec<DependencyLink>, FetchError> {
        *self.dependency_fetches.lock().unwrap() += 1;
        let fake = self.lookup(url)?;
        Ok(fake
            .deps
            .iter()
            .map(|(name, is_optional)| DependencyLink {
                mod_url: Self::url(name),
                is_optional: *is_optional,
            })
            .collect())
    }
}
