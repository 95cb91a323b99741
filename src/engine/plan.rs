//! Dry-run download plan.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::portal::ModInfo;
use crate::resolver::{DependencyTree, get_download_list};

/// Ordered, duplicate-free list of mods to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadPlan {
    pub mods: Vec<ModInfo>,
    pub total_count: usize,
    /// Sum of declared sizes; `None` when any mod's size is unknown.
    pub total_size_estimate: Option<u64>,
}

impl DownloadPlan {
    /// Flattens a resolved tree (pre-order, root first).
    #[must_use]
    pub fn from_tree(tree: &DependencyTree) -> Self {
        Self::from_mods(get_download_list(tree))
    }

    /// Builds a plan, dropping repeated identities (first seen wins).
    #[must_use]
    pub fn from_mods(mods: impl IntoIterator<Item = ModInfo>) -> Self {
        let mut seen = HashSet::new();
        let mods: Vec<ModInfo> = mods
            .into_iter()
            .filter(|info| seen.insert(info.identity()))
            .collect();
        let total_size_estimate = mods
            .iter()
            .map(|info| info.size)
            .sum::<Option<u64>>();
        Self {
            total_count: mods.len(),
            total_size_estimate,
            mods,
        }
    }

    /// Appends another plan's mods that are not already planned.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::from_mods(self.mods.into_iter().chain(other.mods))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Mods reached through optional dependency edges.
    pub fn optional_mods(&self) -> impl Iterator<Item = &ModInfo> {
        self.mods.iter().filter(|info| info.is_optional)
    }
}

impl fmt::Display for DownloadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mod(s)", self.total_count)?;
        if let Some(bytes) = self.total_size_estimate {
            write!(f, ", {bytes} bytes")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(name: &str, size: Option<u64>) -> ModInfo {
        ModInfo {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            portal_url: format!("https://mods.factorio.com/mod/{name}"),
            download_url: format!("https://mods-storage.re146.dev/{name}/1.0.0.zip"),
            size,
            is_optional: false,
        }
    }

    #[test]
    fn test_from_mods_dedupes_case_insensitively() {
        let plan = DownloadPlan::from_mods([
            info("flib", Some(10)),
            info("Krastorio2", Some(20)),
            info("FLIB", Some(99)),
        ]);
        assert_eq!(plan.total_count, 2);
        assert_eq!(plan.mods[0].size, Some(10));
        assert_eq!(plan.total_size_estimate, Some(30));
    }

    #[test]
    fn test_unknown_size_makes_estimate_none() {
        let plan = DownloadPlan::from_mods([info("a", Some(10)), info("b", None)]);
        assert_eq!(plan.total_size_estimate, None);
        assert_eq!(plan.to_string(), "2 mod(s)");
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let first = DownloadPlan::from_mods([info("a", Some(1)), info("shared", Some(2))]);
        let second = DownloadPlan::from_mods([info("shared", Some(2)), info("b", Some(3))]);
        let merged = first.merge(second);
        let names: Vec<_> = merged.mods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "shared", "b"]);
        assert_eq!(merged.total_size_estimate, Some(6));
    }

    #[test]
    fn test_empty_plan() {
        let plan = DownloadPlan::from_mods(Vec::new());
        assert!(plan.is_empty());
        assert_eq!(plan.total_size_estimate, Some(0));
    }
}
