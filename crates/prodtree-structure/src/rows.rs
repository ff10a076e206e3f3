//! Flattened, render-ready rows for the table and schedule views.

use crate::expansion::ExpansionState;
use crate::schedule::{AxisTick, NodeBars, TimeAxis, date_range};
use crate::severity::{Classification, DescendantSignal, SeverityClassifier};
use crate::style::{Badge, RowColors, descendant_badge, row_colors};
use crate::tree::{TreeNode, walk_forest};
use chrono::NaiveDate;
use prodtree_core::{Item, ItemId};
use prodtree_events::ZoomLevel;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBuildOptions {
    pub today: NaiveDate,
    pub zoom: ZoomLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub id: ItemId,
    pub parent: Option<ItemId>,
    pub depth: u32,
    pub has_children: bool,
    pub expanded: bool,
    pub item: Item,
    pub classification: Classification,
    pub descendant_signal: DescendantSignal,
    pub badge: Option<Badge>,
    pub progress: f32,
    pub bars: NodeBars,
    pub colors: RowColors,
}

impl DisplayRow {
    pub fn name(&self) -> &str {
        &self.item.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRows {
    pub axis: TimeAxis,
    pub ticks: Vec<AxisTick>,
    pub today_marker: Option<f32>,
    pub rows: Vec<DisplayRow>,
}

/// Everything a view needs for one render pass.
///
/// The time axis covers the whole forest, not only the visible rows, so
/// expanding a node never shifts the bars already on screen.
pub fn build_display_rows(
    forest: &[TreeNode],
    expansion: &ExpansionState,
    options: RowBuildOptions,
) -> DisplayRows {
    let classifier = SeverityClassifier::new(options.today);
    let signals = classifier.aggregate(forest);

    let range = date_range(walk_forest(forest).map(|node| &node.item), options.today);
    let axis = TimeAxis::new(range, options.zoom);

    let rows = expansion
        .flatten(forest)
        .into_iter()
        .map(|node| {
            let classification = classifier.classify(&node.item);
            let descendant_signal = signals
                .get(&node.id())
                .copied()
                .unwrap_or(DescendantSignal::Clean);
            DisplayRow {
                id: node.id(),
                parent: node.item.parent_item.filter(|_| node.depth > 0),
                depth: node.depth,
                has_children: node.has_children(),
                expanded: node.has_children() && expansion.is_expanded(node.id()),
                classification,
                descendant_signal,
                badge: descendant_badge(descendant_signal),
                progress: node.item.effective_progress(),
                bars: axis.node_bars(&node.item, options.today),
                colors: row_colors(classification.severity),
                item: node.item.clone(),
            }
        })
        .collect();

    DisplayRows {
        ticks: axis.ticks(),
        today_marker: axis.today_marker(options.today),
        axis,
        rows,
    }
}
