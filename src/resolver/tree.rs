//! Arena-backed dependency tree.
//!
//! Nodes live in a `Vec` and refer to their children by index, so the tree
//! never owns cycles. The identity index doubles as the lookup for "is this
//! mod already in the tree".

use std::collections::HashMap;

use crate::portal::ModInfo;

/// Index of a node in a [`DependencyTree`].
pub type NodeId = usize;

/// One resolved mod and the dependencies first discovered through it.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub info: ModInfo,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Resolved dependency graph of one root mod.
///
/// Each mod identity occurs at most once. A mod reachable through several
/// paths sits under the parent that discovered it first.
#[derive(Debug, Clone)]
pub struct DependencyTree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, NodeId>,
}

impl DependencyTree {
    /// Root node id.
    pub const ROOT: NodeId = 0;

    pub(crate) fn new(root: ModInfo) -> Self {
        let mut index = HashMap::new();
        index.insert(root.identity(), Self::ROOT);
        Self {
            nodes: vec![TreeNode {
                info: root,
                parent: None,
                children: Vec::new(),
            }],
            index,
        }
    }

    /// Adds `info` under `parent`.
    ///
    /// Returns `None` without modifying the tree when the identity is already
    /// present or `parent` does not exist.
    pub(crate) fn add_child(&mut self, parent: NodeId, info: ModInfo) -> Option<NodeId> {
        let identity = info.identity();
        if self.index.contains_key(&identity) || parent >= self.nodes.len() {
            return None;
        }
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            info,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        self.index.insert(identity, id);
        Some(id)
    }

    #[must_use]
    pub fn root(&self) -> &ModInfo {
        &self.nodes[Self::ROOT].info
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Direct dependencies of `id`, in discovery order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ModInfo> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|child| self.nodes.get(*child).map(|node| &node.info))
    }

    /// Looks up a mod by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModInfo> {
        self.index
            .get(&name.to_lowercase())
            .and_then(|id| self.nodes.get(*id))
            .map(|node| &node.info)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Number of distance-from-root edges to `id`.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes.get(parent).and_then(|node| node.parent);
        }
        depth
    }

    /// Number of mods in the tree, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in pre-order (parent before children, children in order).
    #[must_use]
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }
}
