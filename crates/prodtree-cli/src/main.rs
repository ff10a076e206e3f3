use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use prodtree_api::{ItemBackend, ListItemsRequest};
use prodtree_app::{EditOutcome, SqlitePreferences, StorageBackend, StructureController};
use prodtree_core::{Item, ItemField, ItemId, ProjectId, format_day, parse_day};
use prodtree_events::{CascadeScope, ZoomLevel};
use prodtree_structure::{
    DisplayRow, DisplayRows, build_forest, executor_glyph, expander_glyph, severity_label,
    validate_forest,
};
use std::path::PathBuf;
use std::sync::Arc;

const GANTT_COLUMNS: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "prodtree.db")]
    db: PathBuf,

    /// Project to work on
    #[arg(short, long, default_value_t = 0)]
    project: i64,

    /// Name recorded in the change history
    #[arg(short, long, default_value = "cli")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load items from a JSON array
    Import { file: PathBuf },
    /// Print the structure table
    Rows {
        /// Expand every node shallower than this depth
        #[arg(long, conflicts_with = "all")]
        level: Option<u32>,
        #[arg(long)]
        all: bool,
        #[arg(long, value_enum)]
        zoom: Option<ZoomArg>,
        /// Reference day, `YYYY-MM-DD`; defaults to today
        #[arg(long, value_parser = parse_day_arg)]
        today: Option<NaiveDate>,
        /// Append a text schedule to every row
        #[arg(long)]
        gantt: bool,
    },
    /// Change one field of an item
    Edit {
        id: i64,
        field: String,
        /// New value; omit to clear the field
        value: Option<String>,
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
    },
    /// Show the change history of an item
    History { id: i64 },
    /// Report structural problems in the parent links
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ZoomArg {
    Months,
    Weeks,
    Days,
}

impl From<ZoomArg> for ZoomLevel {
    fn from(value: ZoomArg) -> Self {
        match value {
            ZoomArg::Months => ZoomLevel::Months,
            ZoomArg::Weeks => ZoomLevel::Weeks,
            ZoomArg::Days => ZoomLevel::Days,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScopeArg {
    /// Only the edited item
    Node,
    /// The edited item and all its descendants
    Subtree,
}

impl From<ScopeArg> for CascadeScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Node => CascadeScope::NodeOnly,
            ScopeArg::Subtree => CascadeScope::WithDescendants,
        }
    }
}

fn parse_day_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_day(raw).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let project = ProjectId(args.project);

    let backend = Arc::new(
        StorageBackend::open(&args.db, args.user.clone())
            .with_context(|| format!("opening {}", args.db.display()))?,
    );

    match args.command {
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut items: Vec<Item> = serde_json::from_str(&content)?;
            for item in &mut items {
                item.project = project;
            }
            backend.import(&items)?;
            println!("Imported {} items into project {}.", items.len(), project);
        }
        Command::Rows {
            level,
            all,
            zoom,
            today,
            gantt,
        } => {
            let controller = open_controller(&args.db, project, backend)?;
            if let Some(level) = level {
                controller.expand_to_level(level);
            } else if all {
                controller.expand_all();
            }
            if let Some(zoom) = zoom {
                controller.set_zoom(zoom.into());
            }
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            print_rows(&controller.build_display_rows(today), gantt);
        }
        Command::Edit {
            id,
            field,
            value,
            scope,
        } => {
            let controller = open_controller(&args.db, project, backend)?;
            let field = ItemField::try_from(field.as_str())?;
            let outcome = controller.on_commit_edit(ItemId(id), field, value.as_deref())?;
            let outcome = match (outcome, scope) {
                (EditOutcome::NeedsScope(prompt), Some(scope)) => {
                    controller.on_confirm_scope(&prompt.token, scope.into())?
                }
                (EditOutcome::NeedsScope(prompt), None) => {
                    controller.on_cancel_edit(&prompt.token);
                    bail!(
                        "item {id} has {} descendant(s); pass --scope node or --scope subtree",
                        prompt.descendant_count
                    );
                }
                (outcome, _) => outcome,
            };
            match outcome {
                EditOutcome::Applied(report) => {
                    for warning in &report.warnings {
                        println!("warning: {}", warning.message());
                    }
                    println!("{} ({} item(s) updated)", report.message, report.updated_count);
                }
                EditOutcome::Rejected(err) => bail!("rejected: {err}"),
                EditOutcome::Busy => bail!("{field} of item {id} is already being saved"),
                EditOutcome::NeedsScope(_) => bail!("scope was not applied"),
            }
        }
        Command::History { id } => {
            let controller = open_controller(&args.db, project, backend)?;
            let today = chrono::Local::now().date_naive();
            let detail = controller.on_open_detail(ItemId(id), today)?;
            println!(
                "{} [{}]",
                detail.item.name,
                severity_label(detail.classification.severity)
            );
            if detail.history.is_empty() {
                println!("  no changes recorded");
            }
            for entry in detail.history {
                println!("  {}  {:<12} {}", entry.date, entry.user, entry.change_description);
            }
        }
        Command::Check => {
            let items = backend.list_items(&ListItemsRequest {
                project_id: project.into(),
            })?;
            let forest = build_forest(items.iter().cloned());
            let report = validate_forest(&items, &forest);
            println!(
                "{} item(s), {} placed in the tree.",
                report.item_count, report.node_count
            );
            for id in &report.duplicate_ids {
                println!("duplicate id: {id}");
            }
            for id in &report.self_parented {
                println!("item {id} is its own parent; shown as a root");
            }
            for id in &report.unreachable {
                println!("item {id} is part of a parent cycle; not shown");
            }
            if !report.is_clean() {
                bail!("structure has problems");
            }
        }
    }

    Ok(())
}

fn open_controller(
    db: &std::path::Path,
    project: ProjectId,
    backend: Arc<StorageBackend>,
) -> Result<StructureController> {
    let preferences = Arc::new(SqlitePreferences::new(db));
    let controller = StructureController::new(project, backend, preferences);
    let count = controller.refresh()?;
    tracing::debug!("{} item(s) loaded", count);
    Ok(controller)
}

fn day_or_dash(day: Option<NaiveDate>) -> String {
    day.map(format_day).unwrap_or_else(|| "-".to_string())
}

fn print_rows(rows: &DisplayRows, gantt: bool) {
    for row in &rows.rows {
        let label = format!(
            "{}{} {} {}",
            "  ".repeat(row.depth as usize),
            expander_glyph(row.has_children, row.expanded),
            executor_glyph(row.classification.executor_kind),
            row.name()
        );
        let badge = row.badge.as_ref().map(|badge| badge.glyph).unwrap_or(" ");
        print!(
            "{:>5} {:<40} {} {:<12} {:>5.0}% {:>10} {:>10}",
            row.id.0,
            label,
            badge,
            severity_label(row.classification.severity),
            row.progress,
            day_or_dash(row.item.effective_start()),
            day_or_dash(row.item.effective_end()),
        );
        if gantt {
            print!("  |{}|", gantt_line(rows, row));
        }
        println!();
    }
}

fn gantt_line(rows: &DisplayRows, row: &DisplayRow) -> String {
    let scale = GANTT_COLUMNS / rows.axis.total_width().max(1.0);
    let columns = GANTT_COLUMNS as usize;
    let mut line = vec![' '; columns];
    let mut paint = |offset: f32, width: f32, glyph: char| {
        let start = ((offset * scale).floor() as usize).min(columns - 1);
        let len = ((width * scale).round() as usize).max(1);
        for cell in line.iter_mut().skip(start).take(len) {
            *cell = glyph;
        }
    };
    if let Some(bar) = row.bars.planned {
        paint(bar.offset, bar.width, '=');
    }
    if let Some(bar) = row.bars.actual {
        paint(bar.offset, bar.width, '#');
    }
    if let Some(marker) = rows.today_marker {
        paint(marker, 0.0, '|');
    }
    line.into_iter().collect()
}
