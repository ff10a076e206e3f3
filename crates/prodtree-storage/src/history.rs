use super::*;

pub(super) fn append_history(
    conn: &Connection,
    id: ItemId,
    ctx: &MutationContext,
    change_description: &str,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO item_history (item_id, date, user, change_description) VALUES (?1, ?2, ?3, ?4)",
        params![
            id.0,
            prodtree_core::format_day(ctx.date),
            ctx.user,
            change_description
        ],
    )?;
    Ok(())
}

pub(super) fn get_history(conn: &Connection, id: ItemId) -> Result<Vec<HistoryEntry>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT date, user, change_description FROM item_history
         WHERE item_id = ?1 ORDER BY id DESC",
    )?;
    let mut entries = Vec::new();
    let mut rows = stmt.query(params![id.0])?;
    while let Some(row) = rows.next()? {
        let date: String = row.get(0)?;
        entries.push(HistoryEntry {
            date: prodtree_core::parse_day(&date)?,
            user: row.get(1)?,
            change_description: row.get(2)?,
        });
    }
    Ok(entries)
}
