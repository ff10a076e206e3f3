use prodtree_core::{Item, ItemId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One item placed in the forest.
///
/// Nodes are derived state: the forest is rebuilt from the flat item list on
/// every change and never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub item: Item,
    /// Root nodes have depth 0.
    pub depth: u32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Pre-order walk over this node and everything below it.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Number of nodes below this one, excluding itself.
    pub fn descendant_count(&self) -> usize {
        self.walk().count() - 1
    }

    pub fn descendant_ids(&self) -> Vec<ItemId> {
        self.walk().skip(1).map(TreeNode::id).collect()
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Pre-order walk over a whole forest.
pub fn walk_forest(forest: &[TreeNode]) -> Walk<'_> {
    Walk {
        stack: forest.iter().rev().collect(),
    }
}

pub fn find_node(forest: &[TreeNode], id: ItemId) -> Option<&TreeNode> {
    walk_forest(forest).find(|node| node.id() == id)
}

/// Parent of `id` inside the forest, if it is not a root.
pub fn find_parent(forest: &[TreeNode], id: ItemId) -> Option<&TreeNode> {
    walk_forest(forest).find(|node| node.children.iter().any(|child| child.id() == id))
}

pub fn root_ids(forest: &[TreeNode]) -> Vec<ItemId> {
    forest.iter().map(TreeNode::id).collect()
}

pub fn max_depth(forest: &[TreeNode]) -> Option<u32> {
    walk_forest(forest).map(|node| node.depth).max()
}

/// Sibling order: category ascending (unordered last), then name, then id.
///
/// Names compare case-insensitively first and fall back to the exact text, so
/// "alpha" and "Alpha" are adjacent but still totally ordered.
pub fn sibling_order(a: &Item, b: &Item) -> Ordering {
    a.category_key()
        .cmp(&b.category_key())
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Builds the forest from a flat item list.
///
/// One pass indexes the items, one pass links each item to its parent. An
/// item whose parent is missing from the list (or is the item itself) becomes
/// a root. Sibling groups are then sorted and depths assigned top-down.
pub fn build_forest<I>(items: I) -> Vec<TreeNode>
where
    I: IntoIterator<Item = Item>,
{
    let mut slots: Vec<Option<Item>> = Vec::new();
    let mut index: HashMap<ItemId, usize> = HashMap::new();

    for item in items {
        if index.contains_key(&item.id) {
            tracing::warn!("Duplicate item id {} in structure list; keeping first", item.id);
            continue;
        }
        index.insert(item.id, slots.len());
        slots.push(Some(item));
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (idx, slot) in slots.iter().enumerate() {
        let Some(item) = slot else { continue };
        match item.parent_item.and_then(|parent| index.get(&parent).copied()) {
            Some(parent_idx) if parent_idx != idx => children[parent_idx].push(idx),
            _ => {
                if item.parent_item.is_some() {
                    tracing::debug!(
                        "Item {} references parent {:?} outside the list; promoting to root",
                        item.id,
                        item.parent_item
                    );
                }
                roots.push(idx);
            }
        }
    }

    let by_order = |a: &usize, b: &usize| match (&slots[*a], &slots[*b]) {
        (Some(a), Some(b)) => sibling_order(a, b),
        _ => Ordering::Equal,
    };
    roots.sort_by(by_order);
    for group in children.iter_mut() {
        group.sort_by(by_order);
    }

    let forest: Vec<TreeNode> = roots
        .iter()
        .filter_map(|&idx| assemble(idx, 0, &mut slots, &children))
        .collect();

    let stranded = slots.iter().filter(|slot| slot.is_some()).count();
    if stranded > 0 {
        tracing::warn!(
            "{} item(s) are unreachable from any root (parent cycle); they are not displayed",
            stranded
        );
    }

    forest
}

fn assemble(
    idx: usize,
    depth: u32,
    slots: &mut [Option<Item>],
    children: &[Vec<usize>],
) -> Option<TreeNode> {
    let item = slots[idx].take()?;
    let kids = children[idx]
        .iter()
        .filter_map(|&child| assemble(child, depth + 1, slots, children))
        .collect();
    Some(TreeNode {
        item,
        depth,
        children: kids,
    })
}

/// Result of the explicit reachability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForestReport {
    pub item_count: usize,
    pub node_count: usize,
    pub duplicate_ids: Vec<ItemId>,
    /// Items naming themselves as parent; displayed as roots.
    pub self_parented: Vec<ItemId>,
    /// Items caught in a parent cycle and therefore not placed in the forest.
    pub unreachable: Vec<ItemId>,
}

impl ForestReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.self_parented.is_empty() && self.unreachable.is_empty()
    }
}

/// Checks a built forest against the list it came from.
pub fn validate_forest(items: &[Item], forest: &[TreeNode]) -> ForestReport {
    let mut seen = HashSet::new();
    let mut report = ForestReport {
        item_count: items.len(),
        ..Default::default()
    };

    for item in items {
        if !seen.insert(item.id) {
            report.duplicate_ids.push(item.id);
        }
        if item.parent_item == Some(item.id) {
            report.self_parented.push(item.id);
        }
    }

    let placed: HashSet<ItemId> = walk_forest(forest).map(TreeNode::id).collect();
    report.node_count = walk_forest(forest).count();
    report.unreachable = seen
        .into_iter()
        .filter(|id| !placed.contains(id))
        .collect();
    report.unreachable.sort();
    report.duplicate_ids.sort();
    report.duplicate_ids.dedup();
    report
}
