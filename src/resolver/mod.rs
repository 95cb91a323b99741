//! Dependency resolution: mod URL to deduplicated download list.
//!
//! # Architecture
//!
//! - [`DependencyResolver`] - depth-first expansion over a [`ModSource`]
//! - [`DependencyTree`] - arena of resolved mods, one node per identity
//! - [`OptionalPolicy`] - which optional dependency edges are followed
//! - [`get_download_list`] - pre-order flattening with dedup
//!
//! Resolution is sequential. The visited set lives for one [`resolve`] call
//! and is owned by it, so no locking is involved.
//!
//! [`resolve`]: DependencyResolver::resolve

mod tree;

pub use tree::{DependencyTree, NodeId, TreeNode};

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::download::{ModStatus, ProgressReporter};
use crate::parser::{mod_identity_from_url, mod_name_from_url};
use crate::portal::{DependencyLink, FetchError, ModInfo, ModSource, is_builtin_mod};

/// Which optional dependency edges the resolver follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionalPolicy {
    /// Required dependencies only.
    #[default]
    RequiredOnly,
    /// The root's own optional dependencies (and their required dependencies).
    DirectOptional,
    /// Optional dependencies at every depth.
    AllOptional,
}

impl OptionalPolicy {
    /// Maps the two inclusion flags onto a policy.
    ///
    /// `include_optional_all` implies `include_optional`.
    #[must_use]
    pub fn from_flags(include_optional: bool, include_optional_all: bool) -> Self {
        match (include_optional, include_optional_all) {
            (_, true) => Self::AllOptional,
            (true, false) => Self::DirectOptional,
            (false, false) => Self::RequiredOnly,
        }
    }

    /// Returns true if an optional edge leaving `parent` should be expanded.
    #[must_use]
    pub fn follows_optional_from(self, parent: NodeId) -> bool {
        match self {
            Self::RequiredOnly => false,
            Self::DirectOptional => parent == DependencyTree::ROOT,
            Self::AllOptional => true,
        }
    }
}

/// Expands a root mod into its dependency tree.
#[derive(Clone)]
pub struct DependencyResolver {
    source: Arc<dyn ModSource>,
    progress: ProgressReporter,
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver").finish_non_exhaustive()
    }
}

/// One level of the explicit DFS stack.
struct Frame {
    node: NodeId,
    pending: std::vec::IntoIter<DependencyLink>,
}

impl DependencyResolver {
    #[must_use]
    pub fn new(source: Arc<dyn ModSource>) -> Self {
        Self {
            source,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Reports `FetchingMetadata` transitions while resolving.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Resolves `root_url` using the two optional-inclusion flags.
    ///
    /// # Errors
    ///
    /// Returns the root's [`FetchError`] when the root page or its dependency
    /// listing cannot be fetched. Failures below the root skip that branch.
    pub async fn resolve(
        &self,
        root_url: &str,
        include_optional: bool,
        include_optional_all: bool,
    ) -> Result<DependencyTree, FetchError> {
        self.resolve_with_policy(
            root_url,
            OptionalPolicy::from_flags(include_optional, include_optional_all),
        )
        .await
    }

    /// Resolves `root_url` with an explicit [`OptionalPolicy`].
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    #[instrument(skip(self), fields(url = %root_url))]
    pub async fn resolve_with_policy(
        &self,
        root_url: &str,
        policy: OptionalPolicy,
    ) -> Result<DependencyTree, FetchError> {
        let mut visited: HashSet<String> = HashSet::new();
        if let Some(key) = mod_identity_from_url(root_url) {
            visited.insert(key);
        }

        self.progress
            .status(&display_name(root_url), ModStatus::FetchingMetadata);
        let root = self.source.fetch(root_url).await?;
        visited.insert(root.identity());
        info!(mod_name = %root.name, version = %root.version, ?policy, "resolving dependencies");

        let root_deps = self.source.fetch_dependencies(&root.portal_url).await?;
        let mut tree = DependencyTree::new(root);
        let mut stack = vec![Frame {
            node: DependencyTree::ROOT,
            pending: root_deps.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let parent = frame.node;
            let Some(link) = frame.pending.next() else {
                stack.pop();
                continue;
            };

            if link.is_optional && !policy.follows_optional_from(parent) {
                debug!(url = %link.mod_url, "optional dependency not followed");
                continue;
            }

            let url_key = mod_identity_from_url(&link.mod_url);
            if let Some(key) = &url_key {
                if is_builtin_mod(key) {
                    debug!(mod_name = %key, "skipping built-in dependency");
                    continue;
                }
                if !visited.insert(key.clone()) {
                    debug!(mod_name = %key, "dependency already visited");
                    continue;
                }
            }

            let Some(child) = self.expand_child(&mut tree, &mut visited, parent, &link).await
            else {
                continue;
            };

            let child_url = tree
                .node(child)
                .map(|node| node.info.portal_url.clone())
                .unwrap_or_default();
            let deps = match self.source.fetch_dependencies(&child_url).await {
                Ok(deps) => deps,
                Err(error) => {
                    warn!(
                        url = %child_url,
                        error = %error,
                        "dependency listing fetch failed; treating mod as a leaf"
                    );
                    Vec::new()
                }
            };
            stack.push(Frame {
                node: child,
                pending: deps.into_iter(),
            });
        }

        info!(mod_count = tree.len(), "dependency resolution complete");
        Ok(tree)
    }

    /// Fetches one dependency and attaches it under `parent`.
    ///
    /// Returns `None` when the fetch failed or the fetched identity was
    /// already present under another URL.
    async fn expand_child(
        &self,
        tree: &mut DependencyTree,
        visited: &mut HashSet<String>,
        parent: NodeId,
        link: &DependencyLink,
    ) -> Option<NodeId> {
        self.progress
            .status(&display_name(&link.mod_url), ModStatus::FetchingMetadata);
        let mut info = match self.source.fetch(&link.mod_url).await {
            Ok(info) => info,
            Err(error) => {
                warn!(
                    url = %link.mod_url,
                    category = %error.category(),
                    error = %error,
                    "dependency fetch failed; skipping branch"
                );
                // A later edge to the same mod may still succeed.
                if let Some(key) = mod_identity_from_url(&link.mod_url) {
                    visited.remove(&key);
                }
                return None;
            }
        };

        if is_builtin_mod(&info.name) {
            debug!(mod_name = %info.name, "skipping built-in dependency");
            return None;
        }
        let identity = info.identity();
        if mod_identity_from_url(&link.mod_url).as_deref() != Some(identity.as_str())
            && !visited.insert(identity)
        {
            debug!(mod_name = %info.name, "dependency already visited under another URL");
            return None;
        }

        let parent_optional = tree.node(parent).is_some_and(|node| node.info.is_optional);
        info.is_optional = link.is_optional || parent_optional;
        debug!(mod_name = %info.name, optional = info.is_optional, "dependency resolved");
        tree.add_child(parent, info)
    }
}

/// Flattens a tree into its download list.
///
/// Pre-order: the root first, then each child subtree in discovery order.
/// Every mod identity appears exactly once.
#[must_use]
pub fn get_download_list(tree: &DependencyTree) -> Vec<ModInfo> {
    let mut seen = HashSet::new();
    tree.pre_order()
        .into_iter()
        .filter_map(|id| tree.node(id))
        .filter(|node| seen.insert(node.info.identity()))
        .map(|node| node.info.clone())
        .collect()
}

fn display_name(url: &str) -> String {
    mod_name_from_url(url).unwrap_or_else(|| url.to_string())
}
