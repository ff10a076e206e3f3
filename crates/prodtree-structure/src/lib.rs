//! Production-structure view model: forest building, expansion, severity,
//! schedule geometry and render-ready rows.
//!
//! Everything here is synchronous and pure over its inputs; callers rebuild
//! on every data or preference change.

pub mod expansion;
pub mod rows;
pub mod schedule;
pub mod severity;
pub mod style;
pub mod tree;

pub use expansion::ExpansionState;
pub use rows::{DisplayRow, DisplayRows, RowBuildOptions, build_display_rows};
pub use schedule::{
    AxisTick, BarGeometry, DateRange, NodeBars, RANGE_PADDING_DAYS, TickKind, TimeAxis,
    bar_geometry, date_range, pixels_per_day,
};
pub use severity::{Classification, DescendantSignal, Severity, SeverityClassifier};
pub use style::{
    Badge, Color, RowColors, descendant_badge, executor_glyph, expander_glyph, row_colors,
    severity_color, severity_label,
};
pub use tree::{
    ForestReport, TreeNode, build_forest, find_node, find_parent, max_depth, root_ids,
    validate_forest, walk_forest,
};
