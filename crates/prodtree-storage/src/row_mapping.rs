use super::*;
use prodtree_core::{
    ContractorId, ContractorStatus, ManufacturerType, ManufacturingStatus, PurchaseStatus,
    ReasonId, SupplierId, UserId, format_day, parse_day,
};

fn day_from_db(raw: Option<String>) -> Result<Option<NaiveDate>, StorageError> {
    Ok(raw.as_deref().map(parse_day).transpose()?)
}

fn day_to_db(day: Option<NaiveDate>) -> Option<String> {
    day.map(format_day)
}

pub(super) fn item_from_row(row: &Row) -> Result<Item, StorageError> {
    let manufacturer_type: String = row.get(8)?;
    let manufacturing_status: String = row.get(9)?;
    let contractor_status: String = row.get(10)?;
    let purchase_status: String = row.get(11)?;
    let progress: i64 = row.get(21)?;
    Ok(Item {
        id: ItemId(row.get(0)?),
        project: ProjectId(row.get(1)?),
        parent_item: row.get::<_, Option<i64>>(2)?.map(ItemId),
        name: row.get(3)?,
        quantity: row.get(4)?,
        unit: row.get(5)?,
        is_purchased: row.get(6)?,
        category_sort_order: row.get(7)?,
        manufacturer_type: ManufacturerType::try_from(manufacturer_type.as_str())?,
        manufacturing_status: ManufacturingStatus::try_from(manufacturing_status.as_str())?,
        contractor_status: ContractorStatus::try_from(contractor_status.as_str())?,
        purchase_status: PurchaseStatus::try_from(purchase_status.as_str())?,
        planned_start: day_from_db(row.get(12)?)?,
        planned_end: day_from_db(row.get(13)?)?,
        actual_start: day_from_db(row.get(14)?)?,
        actual_end: day_from_db(row.get(15)?)?,
        order_date: day_from_db(row.get(16)?)?,
        required_date: day_from_db(row.get(17)?)?,
        responsible: row.get::<_, Option<i64>>(18)?.map(UserId),
        contractor: row.get::<_, Option<i64>>(19)?.map(ContractorId),
        supplier: row.get::<_, Option<i64>>(20)?.map(SupplierId),
        progress_percent: progress.clamp(0, 100) as u8,
        calculated_progress: row.get::<_, Option<f64>>(22)?.map(|value| value as f32),
        has_problem: row.get(23)?,
        problem_reason: row.get::<_, Option<i64>>(24)?.map(ReasonId),
        problem_subreason: row.get::<_, Option<i64>>(25)?.map(ReasonId),
        problem_notes: row.get(26)?,
        children_count: 0,
    })
}

pub(super) fn write_item(conn: &Connection, item: &Item) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT OR REPLACE INTO item ({ITEM_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                 ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)"
    );
    conn.execute(
        &sql,
        params![
            item.id.0,
            item.project.0,
            item.parent_item.map(|id| id.0),
            item.name,
            item.quantity,
            item.unit,
            item.is_purchased,
            item.category_sort_order,
            item.manufacturer_type.as_str(),
            item.manufacturing_status.as_str(),
            item.contractor_status.as_str(),
            item.purchase_status.as_str(),
            day_to_db(item.planned_start),
            day_to_db(item.planned_end),
            day_to_db(item.actual_start),
            day_to_db(item.actual_end),
            day_to_db(item.order_date),
            day_to_db(item.required_date),
            item.responsible.map(|id| id.0),
            item.contractor.map(|id| id.0),
            item.supplier.map(|id| id.0),
            i64::from(item.progress_percent),
            item.calculated_progress.map(f64::from),
            item.has_problem,
            item.problem_reason.map(|id| id.0),
            item.problem_subreason.map(|id| id.0),
            item.problem_notes,
        ],
    )?;
    Ok(())
}
