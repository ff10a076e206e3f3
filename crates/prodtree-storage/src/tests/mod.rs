use super::*;
use prodtree_core::{ContractorId, ManufacturerType, UserId, parse_day};

fn day(raw: &str) -> NaiveDate {
    parse_day(raw).unwrap()
}

fn ctx() -> MutationContext {
    MutationContext::new("planner", day("2024-03-15"))
}

fn item(id: i64, parent: Option<i64>, name: &str) -> Item {
    Item {
        project: ProjectId(1),
        parent_item: parent.map(ItemId),
        ..Item::new(id, name)
    }
}

/// Machine(1) -> Frame(2) -> {Plate(3), Bolt(4)}, Machine -> Motor(5), Motor -> Rotor(6)
fn seeded() -> Result<Storage, StorageError> {
    let mut storage = Storage::new_in_memory()?;
    storage.insert_items_batch(&[
        item(1, None, "Machine"),
        item(2, Some(1), "Frame"),
        item(3, Some(2), "Plate"),
        item(4, Some(2), "Bolt"),
        item(5, Some(1), "Motor"),
        item(6, Some(5), "Rotor"),
    ])?;
    Ok(storage)
}

#[test]
fn test_items_round_trip_with_all_fields() -> Result<(), StorageError> {
    let mut storage = Storage::new_in_memory()?;
    let original = Item {
        project: ProjectId(3),
        is_purchased: true,
        category_sort_order: Some(2),
        purchase_status: prodtree_core::PurchaseStatus::InOrder,
        order_date: Some(day("2024-01-05")),
        required_date: Some(day("2024-02-01")),
        supplier: Some(prodtree_core::SupplierId(8)),
        calculated_progress: Some(37.5),
        has_problem: true,
        problem_notes: Some("late".into()),
        ..Item::new(10, "Bearing")
    };
    storage.insert_items_batch(std::slice::from_ref(&original))?;

    let loaded = storage.get_item(ItemId(10))?.expect("stored item");
    assert_eq!(loaded, original);
    assert!(storage.get_item(ItemId(11))?.is_none());
    Ok(())
}

#[test]
fn test_get_items_fills_descendant_counts() -> Result<(), StorageError> {
    let storage = seeded()?;
    let items = storage.get_items(ProjectId(1))?;
    let counts: Vec<(i64, u32)> = items.iter().map(|i| (i.id.0, i.children_count)).collect();
    assert_eq!(counts, vec![(1, 5), (2, 2), (3, 0), (4, 0), (5, 1), (6, 0)]);
    assert!(storage.get_items(ProjectId(2))?.is_empty());
    Ok(())
}

#[test]
fn test_descendants_listed_parents_first() -> Result<(), StorageError> {
    let storage = seeded()?;
    let ids: Vec<i64> = storage
        .get_descendant_ids(ItemId(1))?
        .into_iter()
        .map(|id| id.0)
        .collect();
    assert_eq!(ids, vec![2, 5, 3, 4, 6]);
    Ok(())
}

#[test]
fn test_descendants_terminate_on_cycle() -> Result<(), StorageError> {
    let mut storage = Storage::new_in_memory()?;
    storage.insert_items_batch(&[item(1, Some(2), "a"), item(2, Some(1), "b")])?;
    let ids = storage.get_descendant_ids(ItemId(1))?;
    assert_eq!(ids, vec![ItemId(2)]);
    Ok(())
}

#[test]
fn test_update_field_records_history() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let updated = storage.update_field(ItemId(3), ItemField::PlannedEnd, Some("2024-04-01"), &ctx())?;
    assert_eq!(updated.planned_end, Some(day("2024-04-01")));

    // Same value again: nothing to record.
    storage.update_field(ItemId(3), ItemField::PlannedEnd, Some("2024-04-01"), &ctx())?;

    let history = storage.get_history(ItemId(3))?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user, "planner");
    assert_eq!(history[0].date, day("2024-03-15"));
    assert_eq!(history[0].change_description, "planned_end: (empty) -> 2024-04-01");
    Ok(())
}

#[test]
fn test_update_unknown_item_is_not_found() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let err = storage
        .update_field(ItemId(99), ItemField::Name, Some("x"), &ctx())
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(ItemId(99))));
    Ok(())
}

#[test]
fn test_invalid_value_rolls_back() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let err = storage
        .update_field(ItemId(2), ItemField::ProgressPercent, Some("250"), &ctx())
        .unwrap_err();
    assert!(matches!(err, StorageError::FieldValue(_)));
    assert!(storage.get_history(ItemId(2))?.is_empty());
    Ok(())
}

#[test]
fn test_cascade_count_includes_node() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let count =
        storage.assign_with_cascade(ItemId(1), ItemField::Responsible, Some("7"), true, &ctx())?;
    assert_eq!(count, 6);
    for item in storage.get_items(ProjectId(1))? {
        assert_eq!(item.responsible, Some(UserId(7)), "item {}", item.id);
    }

    let count =
        storage.assign_with_cascade(ItemId(5), ItemField::Responsible, Some("8"), false, &ctx())?;
    assert_eq!(count, 1);
    assert_eq!(
        storage.get_item(ItemId(6))?.and_then(|i| i.responsible),
        Some(UserId(7))
    );
    Ok(())
}

#[test]
fn test_contractor_cascade_switches_executor() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let count =
        storage.assign_with_cascade(ItemId(2), ItemField::Contractor, Some("4"), true, &ctx())?;
    assert_eq!(count, 3);
    let plate = storage.get_item(ItemId(3))?.expect("plate");
    assert_eq!(plate.manufacturer_type, ManufacturerType::Contractor);
    assert_eq!(plate.contractor, Some(ContractorId(4)));

    storage.assign_with_cascade(
        ItemId(2),
        ItemField::ManufacturerType,
        Some("internal"),
        true,
        &ctx(),
    )?;
    let plate = storage.get_item(ItemId(3))?.expect("plate");
    assert_eq!(plate.manufacturer_type, ManufacturerType::Internal);
    assert_eq!(plate.contractor, None);
    Ok(())
}

#[test]
fn test_contractor_cascade_skips_purchased_items() -> Result<(), StorageError> {
    let mut storage = Storage::new_in_memory()?;
    storage.insert_items_batch(&[
        item(1, None, "Frame"),
        Item {
            is_purchased: true,
            ..item(2, Some(1), "Bolt")
        },
        item(3, Some(1), "Plate"),
    ])?;

    let count =
        storage.assign_with_cascade(ItemId(1), ItemField::Contractor, Some("4"), true, &ctx())?;
    assert_eq!(count, 2);

    let bolt = storage.get_item(ItemId(2))?.expect("bolt");
    assert_eq!(bolt.contractor, None);
    assert_eq!(bolt.manufacturer_type, ManufacturerType::Internal);
    assert!(storage.get_history(ItemId(2))?.is_empty());
    assert_eq!(
        storage.get_item(ItemId(3))?.and_then(|i| i.contractor),
        Some(ContractorId(4))
    );

    // Responsible still reaches purchased items.
    let count =
        storage.assign_with_cascade(ItemId(1), ItemField::Responsible, Some("7"), true, &ctx())?;
    assert_eq!(count, 3);
    Ok(())
}

#[test]
fn test_cascade_rejects_plain_fields() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    let err = storage
        .assign_with_cascade(ItemId(1), ItemField::Name, Some("x"), true, &ctx())
        .unwrap_err();
    assert!(matches!(err, StorageError::Other(_)));
    Ok(())
}

#[test]
fn test_failed_cascade_leaves_subtree_untouched() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    assert!(
        storage
            .assign_with_cascade(ItemId(1), ItemField::Responsible, Some("nobody"), true, &ctx())
            .is_err()
    );
    for item in storage.get_items(ProjectId(1))? {
        assert_eq!(item.responsible, None);
    }
    Ok(())
}

#[test]
fn test_recompute_shifts_children_that_start_too_early() -> Result<(), StorageError> {
    let mut storage = Storage::new_in_memory()?;
    storage.insert_items_batch(&[
        Item {
            planned_start: Some(day("2024-02-01")),
            ..item(1, None, "Machine")
        },
        Item {
            planned_start: Some(day("2024-01-20")),
            planned_end: Some(day("2024-01-25")),
            ..item(2, Some(1), "Frame")
        },
        Item {
            planned_start: Some(day("2024-01-28")),
            planned_end: Some(day("2024-02-03")),
            ..item(3, Some(2), "Plate")
        },
        Item {
            planned_start: Some(day("2024-03-01")),
            ..item(4, Some(1), "Motor")
        },
    ])?;

    let moved = storage.recompute_descendant_dates(ItemId(1), &ctx())?;
    assert_eq!(moved, 2);

    let frame = storage.get_item(ItemId(2))?.expect("frame");
    assert_eq!(frame.planned_start, Some(day("2024-02-01")));
    assert_eq!(frame.planned_end, Some(day("2024-02-06")));

    // Plate follows the already shifted frame.
    let plate = storage.get_item(ItemId(3))?.expect("plate");
    assert_eq!(plate.planned_start, Some(day("2024-02-01")));
    assert_eq!(plate.planned_end, Some(day("2024-02-07")));

    let motor = storage.get_item(ItemId(4))?.expect("motor");
    assert_eq!(motor.planned_start, Some(day("2024-03-01")));
    assert_eq!(storage.get_history(ItemId(2))?.len(), 1);
    Ok(())
}

#[test]
fn test_reschedule_moves_node_and_descendants_together() -> Result<(), StorageError> {
    let mut storage = Storage::new_in_memory()?;
    storage.insert_items_batch(&[
        Item {
            planned_start: Some(day("2024-02-01")),
            planned_end: Some(day("2024-02-20")),
            ..item(1, None, "Drive")
        },
        Item {
            planned_start: Some(day("2024-02-03")),
            planned_end: Some(day("2024-02-05")),
            ..item(2, Some(1), "Motor")
        },
    ])?;

    let moved = storage.reschedule_with_descendants(ItemId(1), Some("2024-02-10"), &ctx())?;
    assert_eq!(moved, 1);
    assert_eq!(
        storage.get_item(ItemId(1))?.and_then(|i| i.planned_start),
        Some(day("2024-02-10"))
    );
    let motor = storage.get_item(ItemId(2))?.expect("motor");
    assert_eq!(motor.planned_start, Some(day("2024-02-10")));
    assert_eq!(motor.planned_end, Some(day("2024-02-12")));

    assert!(
        storage
            .reschedule_with_descendants(ItemId(1), Some("soon"), &ctx())
            .is_err()
    );
    assert_eq!(
        storage.get_item(ItemId(1))?.and_then(|i| i.planned_start),
        Some(day("2024-02-10"))
    );
    assert_eq!(storage.get_history(ItemId(1))?.len(), 1);
    Ok(())
}

#[test]
fn test_settings_upsert_and_json() -> Result<(), StorageError> {
    let storage = Storage::new_in_memory()?;
    assert_eq!(storage.get_setting("view")?, None);
    storage.set_setting("view", "table")?;
    storage.set_setting("view", "gantt")?;
    assert_eq!(storage.get_setting("view")?.as_deref(), Some("gantt"));

    storage.set_setting_json("ids", &vec![1, 2, 3])?;
    let ids: Option<Vec<i64>> = storage.get_setting_json("ids")?;
    assert_eq!(ids, Some(vec![1, 2, 3]));

    storage.set_setting("broken", "{")?;
    assert!(matches!(
        storage.get_setting_json::<Vec<i64>>("broken"),
        Err(StorageError::Json(_))
    ));
    Ok(())
}

#[test]
fn test_on_disk_database_persists_and_rejects_newer_schema() -> Result<(), StorageError> {
    let dir = tempfile::tempdir().map_err(|e| StorageError::Other(e.to_string()))?;
    let path = dir.path().join("items.db");
    {
        let mut storage = Storage::open(&path)?;
        storage.insert_items_batch(&[item(1, None, "Machine")])?;
    }
    let storage = Storage::open(&path)?;
    assert_eq!(storage.get_item_count()?, 1);

    storage.set_schema_version(SCHEMA_VERSION + 1)?;
    drop(storage);
    assert!(matches!(Storage::open(&path), Err(StorageError::Other(_))));
    Ok(())
}

#[test]
fn test_clear_removes_items_and_history() -> Result<(), StorageError> {
    let mut storage = seeded()?;
    storage.update_field(ItemId(1), ItemField::Name, Some("Press"), &ctx())?;
    storage.clear()?;
    assert_eq!(storage.get_item_count()?, 0);
    assert!(storage.get_history(ItemId(1))?.is_empty());
    Ok(())
}
