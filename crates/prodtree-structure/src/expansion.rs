use crate::tree::{TreeNode, walk_forest};
use prodtree_core::ItemId;
use std::collections::HashSet;

/// Which nodes currently show their children.
///
/// The set is seeded with the root ids the first time a non-empty forest is
/// seen. After every reload, ids that vanished are pruned; if nothing is left
/// the set goes back to the root ids, so a refresh never collapses the whole
/// table because of stale ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<ItemId>,
    seeded: bool,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted set. An empty set is treated as "never seeded".
    pub fn from_ids<I: IntoIterator<Item = ItemId>>(ids: I) -> Self {
        let expanded: HashSet<ItemId> = ids.into_iter().collect();
        let seeded = !expanded.is_empty();
        Self { expanded, seeded }
    }

    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Sorted ids, for persistence and stable output.
    pub fn ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.expanded.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn toggle(&mut self, id: ItemId) -> bool {
        let now_expanded = !self.expanded.remove(&id);
        if now_expanded {
            self.expanded.insert(id);
        }
        now_expanded
    }

    pub fn expand_all(&mut self, forest: &[TreeNode]) {
        self.expanded = walk_forest(forest)
            .filter(|node| node.has_children())
            .map(TreeNode::id)
            .collect();
        self.seeded = true;
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.seeded = true;
    }

    /// Opens the top `level` layers of the forest.
    ///
    /// A node at depth `d` with children is expanded iff `d < level`; every
    /// other node with children is collapsed. With 0-based depths this shows
    /// depths `0..=level`; `level == 0` leaves only the roots.
    pub fn expand_to_level(&mut self, forest: &[TreeNode], level: u32) {
        self.expanded = walk_forest(forest)
            .filter(|node| node.has_children() && node.depth < level)
            .map(TreeNode::id)
            .collect();
        self.seeded = true;
    }

    /// Aligns the set with a freshly built forest. Returns true if the set changed.
    pub fn reconcile(&mut self, forest: &[TreeNode]) -> bool {
        if forest.is_empty() {
            return false;
        }

        let before = self.expanded.clone();
        if self.seeded {
            let present: HashSet<ItemId> = walk_forest(forest).map(TreeNode::id).collect();
            self.expanded.retain(|id| present.contains(id));
            if self.expanded.is_empty() {
                tracing::debug!("Expansion state emptied by reload; reseeding with roots");
                self.seed_roots(forest);
            }
        } else {
            self.seed_roots(forest);
        }
        self.seeded = true;
        before != self.expanded
    }

    fn seed_roots(&mut self, forest: &[TreeNode]) {
        self.expanded = forest.iter().map(TreeNode::id).collect();
    }

    /// Display order: pre-order, descending only into expanded nodes.
    pub fn flatten<'a>(&self, forest: &'a [TreeNode]) -> Vec<&'a TreeNode> {
        let mut rows = Vec::new();
        let mut stack: Vec<&TreeNode> = forest.iter().rev().collect();
        while let Some(node) = stack.pop() {
            rows.push(node);
            if self.is_expanded(node.id()) {
                stack.extend(node.children.iter().rev());
            }
        }
        rows
    }
}
