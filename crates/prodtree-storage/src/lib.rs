use chrono::NaiveDate;
use prodtree_core::{
    DayParseError, EnumConversionError, FieldValueError, HistoryEntry, Item, ItemField, ItemId,
    ProjectId,
};
use rusqlite::{Connection, OptionalExtension, Result, Row, Transaction, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod history;
mod mutations;
mod row_mapping;
mod schema;
mod settings;

pub use mutations::MutationContext;

const SCHEMA_VERSION: u32 = 1;
const ITEM_COLUMNS: &str = "id, project_id, parent_id, name, quantity, unit, is_purchased, category_sort_order,
     manufacturer_type, manufacturing_status, contractor_status, purchase_status,
     planned_start, planned_end, actual_start, actual_end, order_date, required_date,
     responsible_id, contractor_id, supplier_id, progress_percent, calculated_progress,
     has_problem, problem_reason_id, problem_subreason_id, problem_notes";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid enum value: {0}")]
    EnumConversion(#[from] EnumConversionError),
    #[error("Invalid stored date: {0}")]
    Day(#[from] DayParseError),
    #[error("Invalid field value: {0}")]
    FieldValue(#[from] FieldValueError),
    #[error("Invalid setting payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Item not found: {0}")]
    NotFound(ItemId),
    #[error("Other error: {0}")]
    Other(String),
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        // Readers (CLI, views) may hit the file while a cascade is committing.
        let _ = conn.busy_timeout(Duration::from_millis(2_500));
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM item_history", [])?;
        tx.execute("DELETE FROM item", [])?;
        tx.commit()?;
        Ok(())
    }

    fn init(&self) -> Result<(), StorageError> {
        schema::create_tables(&self.conn)?;
        schema::create_indexes(&self.conn)?;
        schema::apply_schema_migrations(self)
    }

    fn schema_version(&self) -> Result<u32, StorageError> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version.max(0) as u32)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StorageError> {
        self.conn
            .pragma_update(None, "user_version", version.to_string())?;
        Ok(())
    }

    /// Inserts or replaces items as given; history is not touched.
    pub fn insert_items_batch(&mut self, items: &[Item]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for item in items {
            row_mapping::write_item(&tx, item)?;
        }
        tx.commit()?;
        tracing::info!("Stored {} item(s)", items.len());
        Ok(())
    }

    /// All items of a project, with `children_count` filled in.
    pub fn get_items(&self, project: ProjectId) -> Result<Vec<Item>, StorageError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM item WHERE project_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut items = Vec::new();
        let mut rows = stmt.query(params![project.0])?;
        while let Some(row) = rows.next()? {
            items.push(Self::item_from_row(row)?);
        }
        fill_descendant_counts(&mut items);
        Ok(items)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Option<Item>, StorageError> {
        load_item(&self.conn, id)
    }

    pub fn get_item_count(&self) -> Result<i64, StorageError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM item", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Every descendant of `id`, parents before their children.
    pub fn get_descendant_ids(&self, id: ItemId) -> Result<Vec<ItemId>, StorageError> {
        descendant_ids(&self.conn, id)
    }

    /// Single-field patch, recorded in the item's history.
    pub fn update_field(
        &mut self,
        id: ItemId,
        field: ItemField,
        raw: Option<&str>,
        ctx: &MutationContext,
    ) -> Result<Item, StorageError> {
        let tx = self.conn.transaction()?;
        let item = mutations::update_field(&tx, id, field, raw, ctx)?;
        tx.commit()?;
        Ok(item)
    }

    /// Sets `field` on `id` and, with `cascade`, on all its descendants in one
    /// transaction. Returns the number of items addressed, `id` included.
    /// Executor fields skip purchased items, which are not counted.
    pub fn assign_with_cascade(
        &mut self,
        id: ItemId,
        field: ItemField,
        raw: Option<&str>,
        cascade: bool,
        ctx: &MutationContext,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let count = mutations::assign_with_cascade(&tx, id, field, raw, cascade, ctx)?;
        tx.commit()?;
        tracing::info!(
            "Assigned {} on item {} (cascade: {}): {} item(s) updated",
            field,
            id,
            cascade,
            count
        );
        Ok(count)
    }

    /// Shifts descendants that start before their parent. Returns how many moved.
    pub fn recompute_descendant_dates(
        &mut self,
        id: ItemId,
        ctx: &MutationContext,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let moved = mutations::recompute_descendant_dates(&tx, id, ctx)?;
        tx.commit()?;
        Ok(moved)
    }

    /// Sets the planned start of `id` and shifts its descendants in the same
    /// transaction. Returns how many descendants moved.
    pub fn reschedule_with_descendants(
        &mut self,
        id: ItemId,
        raw: Option<&str>,
        ctx: &MutationContext,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let moved = mutations::reschedule_with_descendants(&tx, id, raw, ctx)?;
        tx.commit()?;
        Ok(moved)
    }

    /// Newest first.
    pub fn get_history(&self, id: ItemId) -> Result<Vec<HistoryEntry>, StorageError> {
        history::get_history(&self.conn, id)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        settings::get_setting(&self.conn, key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        settings::set_setting(&self.conn, key, value)
    }

    pub fn get_setting_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        self.get_setting(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(StorageError::from))
            .transpose()
    }

    pub fn set_setting_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_setting(key, &raw)
    }

    fn item_from_row(row: &Row) -> Result<Item, StorageError> {
        row_mapping::item_from_row(row)
    }
}

fn load_item(conn: &Connection, id: ItemId) -> Result<Option<Item>, StorageError> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM item WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.0])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_mapping::item_from_row(row)?)),
        None => Ok(None),
    }
}

fn require_item(conn: &Connection, id: ItemId) -> Result<Item, StorageError> {
    load_item(conn, id)?.ok_or(StorageError::NotFound(id))
}

fn descendant_ids(conn: &Connection, id: ItemId) -> Result<Vec<ItemId>, StorageError> {
    // The depth bound keeps parent cycles finite.
    let mut stmt = conn.prepare(
        "WITH RECURSIVE sub(id, depth) AS (
             SELECT id, 1 FROM item WHERE parent_id = ?1 AND id != ?1
             UNION
             SELECT i.id, sub.depth + 1 FROM item i JOIN sub ON i.parent_id = sub.id
             WHERE sub.depth < 256
         )
         SELECT id, MIN(depth) AS d FROM sub WHERE id != ?1 GROUP BY id ORDER BY d, id",
    )?;
    let ids = stmt
        .query_map(params![id.0], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids.into_iter().map(ItemId).collect())
}

/// Counts all descendants of every item present in `items`.
fn fill_descendant_counts(items: &mut [Item]) {
    let parents: HashMap<ItemId, ItemId> = items
        .iter()
        .filter_map(|item| item.parent_item.map(|parent| (item.id, parent)))
        .collect();
    let mut counts: HashMap<ItemId, u32> = HashMap::new();
    for item in items.iter() {
        let mut seen = HashSet::from([item.id]);
        let mut cursor = parents.get(&item.id).copied();
        while let Some(ancestor) = cursor {
            if !seen.insert(ancestor) {
                break;
            }
            *counts.entry(ancestor).or_default() += 1;
            cursor = parents.get(&ancestor).copied();
        }
    }
    for item in items.iter_mut() {
        item.children_count = counts.get(&item.id).copied().unwrap_or(0);
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests;
