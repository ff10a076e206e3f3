use super::*;

const TABLE_STATEMENTS: &[&str] = &[
    // parent_id carries no foreign key: items may point at parents outside
    // the stored set and are shown as roots.
    "CREATE TABLE IF NOT EXISTS item (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL,
        parent_id INTEGER,
        name TEXT NOT NULL,
        quantity REAL NOT NULL DEFAULT 1,
        unit TEXT NOT NULL DEFAULT 'pcs',
        is_purchased INTEGER NOT NULL DEFAULT 0,
        category_sort_order INTEGER,
        manufacturer_type TEXT NOT NULL DEFAULT 'internal',
        manufacturing_status TEXT NOT NULL DEFAULT 'not_started',
        contractor_status TEXT NOT NULL DEFAULT 'sent_to_contractor',
        purchase_status TEXT NOT NULL DEFAULT 'waiting_order',
        planned_start TEXT,
        planned_end TEXT,
        actual_start TEXT,
        actual_end TEXT,
        order_date TEXT,
        required_date TEXT,
        responsible_id INTEGER,
        contractor_id INTEGER,
        supplier_id INTEGER,
        progress_percent INTEGER NOT NULL DEFAULT 0,
        calculated_progress REAL,
        has_problem INTEGER NOT NULL DEFAULT 0,
        problem_reason_id INTEGER,
        problem_subreason_id INTEGER,
        problem_notes TEXT
    )",
    "CREATE TABLE IF NOT EXISTS item_history (
        id INTEGER PRIMARY KEY,
        item_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        user TEXT NOT NULL,
        change_description TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS setting (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];

const INDEX_STATEMENTS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_item_project ON item(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_item_parent ON item(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_item_history_item ON item_history(item_id)",
];

pub(super) fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    for statement in TABLE_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

pub(super) fn create_indexes(conn: &Connection) -> Result<(), StorageError> {
    for statement in INDEX_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

pub(super) fn apply_schema_migrations(storage: &Storage) -> Result<(), StorageError> {
    let stored_version = storage.schema_version()?;

    if stored_version > SCHEMA_VERSION {
        return Err(StorageError::Other(format!(
            "Unsupported database schema version: {stored_version} (max supported: {SCHEMA_VERSION})"
        )));
    }

    if stored_version < SCHEMA_VERSION {
        tracing::info!(
            "Upgrading item database schema from v{} to v{}",
            stored_version,
            SCHEMA_VERSION
        );
        storage.set_schema_version(SCHEMA_VERSION)?;
    }
    Ok(())
}
