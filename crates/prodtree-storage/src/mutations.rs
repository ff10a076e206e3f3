use super::*;

/// Who is changing data, and on which day; stamped on every history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationContext {
    pub user: String,
    pub date: NaiveDate,
}

impl MutationContext {
    pub fn new(user: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user: user.into(),
            date,
        }
    }

    pub fn now(user: impl Into<String>) -> Self {
        Self::new(user, today())
    }
}

fn describe_change(field: ItemField, before: Option<&str>, after: Option<&str>) -> String {
    format!(
        "{field}: {} -> {}",
        before.unwrap_or("(empty)"),
        after.unwrap_or("(empty)")
    )
}

/// Applies the patch to `item` and writes it back. Returns whether anything changed.
fn patch_item(
    tx: &Transaction,
    item: &mut Item,
    field: ItemField,
    raw: Option<&str>,
    ctx: &MutationContext,
) -> Result<bool, StorageError> {
    let before = item.field_value(field);
    item.set_field(field, raw)?;
    let after = item.field_value(field);
    if before == after {
        return Ok(false);
    }
    row_mapping::write_item(tx, item)?;
    history::append_history(
        tx,
        item.id,
        ctx,
        &describe_change(field, before.as_deref(), after.as_deref()),
    )?;
    Ok(true)
}

pub(super) fn update_field(
    tx: &Transaction,
    id: ItemId,
    field: ItemField,
    raw: Option<&str>,
    ctx: &MutationContext,
) -> Result<Item, StorageError> {
    let mut item = require_item(tx, id)?;
    patch_item(tx, &mut item, field, raw, ctx)?;
    Ok(item)
}

pub(super) fn assign_with_cascade(
    tx: &Transaction,
    id: ItemId,
    field: ItemField,
    raw: Option<&str>,
    cascade: bool,
    ctx: &MutationContext,
) -> Result<usize, StorageError> {
    if !matches!(
        field,
        ItemField::Responsible | ItemField::Contractor | ItemField::ManufacturerType
    ) {
        return Err(StorageError::Other(format!(
            "{field} cannot be assigned with cascade"
        )));
    }
    let executor_field = field != ItemField::Responsible;

    let mut targets = vec![id];
    if cascade {
        targets.extend(descendant_ids(tx, id)?);
    }

    let mut addressed = 0;
    for target in &targets {
        let mut item = require_item(tx, *target)?;
        // Purchased items have a supplier, never an executor.
        if executor_field && item.is_purchased {
            continue;
        }
        patch_item(tx, &mut item, field, raw, ctx)?;
        addressed += 1;
    }
    Ok(addressed)
}

/// New planned start for `id` plus the descendant shift, as one unit.
pub(super) fn reschedule_with_descendants(
    tx: &Transaction,
    id: ItemId,
    raw: Option<&str>,
    ctx: &MutationContext,
) -> Result<usize, StorageError> {
    update_field(tx, id, ItemField::PlannedStart, raw, ctx)?;
    recompute_descendant_dates(tx, id, ctx)
}

pub(super) fn recompute_descendant_dates(
    tx: &Transaction,
    id: ItemId,
    ctx: &MutationContext,
) -> Result<usize, StorageError> {
    let root = require_item(tx, id)?;
    let mut starts: HashMap<ItemId, Option<NaiveDate>> = HashMap::new();
    starts.insert(root.id, root.planned_start);

    let mut moved = 0;
    // Parents come before children, so each child sees its parent's final start.
    for child_id in descendant_ids(tx, id)? {
        let mut child = require_item(tx, child_id)?;
        let parent_start = child
            .parent_item
            .and_then(|parent| starts.get(&parent).copied())
            .flatten();

        if let (Some(parent_start), Some(child_start)) = (parent_start, child.planned_start)
            && child_start < parent_start
        {
            let shift = parent_start - child_start;
            let before = format!(
                "{}..{}",
                prodtree_core::format_day(child_start),
                child.planned_end.map(prodtree_core::format_day).unwrap_or_default()
            );
            child.planned_start = Some(parent_start);
            child.planned_end = child.planned_end.map(|end| end + shift);
            row_mapping::write_item(tx, &child)?;
            history::append_history(
                tx,
                child.id,
                ctx,
                &format!(
                    "planned dates shifted by {} day(s) to follow item {} (was {before})",
                    shift.num_days(),
                    root.id
                ),
            )?;
            moved += 1;
        }
        starts.insert(child.id, child.planned_start);
    }

    tracing::info!("Recomputed dates under item {}: {} moved", id, moved);
    Ok(moved)
}
