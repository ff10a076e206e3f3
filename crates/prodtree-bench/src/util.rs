use chrono::{Duration, NaiveDate};
use prodtree_core::{Item, ItemId, ManufacturingStatus};

/// Synthetic breakdown: `roots` machines, each `depth` levels deep with
/// `fanout` children per node.
pub fn generate_synthetic_structure(roots: usize, fanout: usize, depth: usize) -> Vec<Item> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut items = Vec::new();
    let mut next_id = 1i64;
    let mut level: Vec<ItemId> = Vec::new();

    for r in 0..roots {
        items.push(synthetic_item(next_id, None, format!("Machine {r}"), base, 0));
        level.push(ItemId(next_id));
        next_id += 1;
    }

    for d in 1..depth {
        let mut next_level = Vec::with_capacity(level.len() * fanout);
        for parent in &level {
            for c in 0..fanout {
                let name = format!("Part {}.{c}", parent.0);
                items.push(synthetic_item(next_id, Some(*parent), name, base, d));
                next_level.push(ItemId(next_id));
                next_id += 1;
            }
        }
        level = next_level;
    }
    items
}

fn synthetic_item(id: i64, parent: Option<ItemId>, name: String, base: NaiveDate, depth: usize) -> Item {
    let start = base + Duration::days((id % 90) + depth as i64 * 3);
    let mut item = Item::new(id, name);
    item.parent_item = parent;
    item.planned_start = Some(start);
    item.planned_end = Some(start + Duration::days(5 + id % 20));
    item.is_purchased = id % 7 == 0;
    if id % 5 == 0 {
        item.manufacturing_status = ManufacturingStatus::InProgress;
        item.actual_start = Some(start);
    }
    item
}
