use parking_lot::Mutex;
use prodtree_api::{
    ApiError, AssignTarget, CascadeAssignRequest, CascadeResponse, HistoryEntryDto,
    ItemBackend, ItemHistoryRequest, ListItemsRequest, RecomputeDatesRequest,
    RecomputeDatesResponse, RescheduleRequest, UpdateItemRequest,
};
use prodtree_core::{Item, ItemField};
use prodtree_storage::{MutationContext, Storage, StorageError};
use std::path::Path;

fn clamp_usize_to_u32(v: usize) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

fn storage_error(context: &str, err: StorageError) -> ApiError {
    match err {
        StorageError::NotFound(id) => ApiError::not_found(format!("Item not found: {id}")),
        StorageError::FieldValue(e) => ApiError::from(e),
        other => ApiError::internal(format!("{context}: {other}")),
    }
}

/// [`ItemBackend`] over the local SQLite database.
pub struct StorageBackend {
    storage: Mutex<Storage>,
    user: String,
}

impl StorageBackend {
    pub fn new(storage: Storage, user: impl Into<String>) -> Self {
        Self {
            storage: Mutex::new(storage),
            user: user.into(),
        }
    }

    pub fn open(path: impl AsRef<Path>, user: impl Into<String>) -> Result<Self, ApiError> {
        let storage = Storage::open(path)
            .map_err(|e| ApiError::internal(format!("Failed to open storage: {e}")))?;
        Ok(Self::new(storage, user))
    }

    pub fn in_memory(user: impl Into<String>) -> Result<Self, ApiError> {
        let storage = Storage::new_in_memory()
            .map_err(|e| ApiError::internal(format!("Failed to open storage: {e}")))?;
        Ok(Self::new(storage, user))
    }

    /// Seeds items directly, bypassing history.
    pub fn import(&self, items: &[Item]) -> Result<(), ApiError> {
        self.storage
            .lock()
            .insert_items_batch(items)
            .map_err(|e| storage_error("Failed to import items", e))
    }

    fn context(&self) -> MutationContext {
        MutationContext::now(self.user.clone())
    }
}

impl ItemBackend for StorageBackend {
    fn list_items(&self, request: &ListItemsRequest) -> Result<Vec<Item>, ApiError> {
        let project = request.project_id.to_core()?;
        self.storage
            .lock()
            .get_items(project)
            .map_err(|e| storage_error("Failed to load items", e))
    }

    fn update_item(&self, request: &UpdateItemRequest) -> Result<Item, ApiError> {
        let id = request.item_id.to_core()?;
        let field = ItemField::try_from(request.field.as_str())?;
        self.storage
            .lock()
            .update_field(id, field, request.value.as_deref(), &self.context())
            .map_err(|e| storage_error("Failed to update item", e))
    }

    fn assign_with_cascade(
        &self,
        request: &CascadeAssignRequest,
    ) -> Result<CascadeResponse, ApiError> {
        let id = request.item_id.to_core()?;
        let (field, value) = match request.target {
            AssignTarget::Responsible => (ItemField::Responsible, request.value.as_deref()),
            AssignTarget::Contractor => {
                let value = request.value.as_deref().ok_or_else(|| {
                    ApiError::invalid_argument("Contractor assignment needs a contractor id")
                })?;
                (ItemField::Contractor, Some(value))
            }
            AssignTarget::InternalExecutor => (ItemField::ManufacturerType, Some("internal")),
        };
        let count = self
            .storage
            .lock()
            .assign_with_cascade(id, field, value, request.cascade, &self.context())
            .map_err(|e| storage_error("Failed to assign", e))?;
        Ok(CascadeResponse {
            updated_count: clamp_usize_to_u32(count),
        })
    }

    fn recompute_descendant_dates(
        &self,
        request: &RecomputeDatesRequest,
    ) -> Result<RecomputeDatesResponse, ApiError> {
        let id = request.item_id.to_core()?;
        let moved = self
            .storage
            .lock()
            .recompute_descendant_dates(id, &self.context())
            .map_err(|e| storage_error("Failed to recompute dates", e))?;
        Ok(RecomputeDatesResponse {
            updated_count: clamp_usize_to_u32(moved),
            message: format!("{moved} descendant item(s) rescheduled"),
        })
    }

    fn reschedule_with_descendants(
        &self,
        request: &RescheduleRequest,
    ) -> Result<RecomputeDatesResponse, ApiError> {
        let id = request.item_id.to_core()?;
        let moved = self
            .storage
            .lock()
            .reschedule_with_descendants(id, request.planned_start.as_deref(), &self.context())
            .map_err(|e| storage_error("Failed to reschedule", e))?;
        Ok(RecomputeDatesResponse {
            updated_count: clamp_usize_to_u32(moved.saturating_add(1)),
            message: format!("Planned start set, {moved} descendant item(s) rescheduled"),
        })
    }

    fn item_history(&self, request: &ItemHistoryRequest) -> Result<Vec<HistoryEntryDto>, ApiError> {
        let id = request.item_id.to_core()?;
        let entries = self
            .storage
            .lock()
            .get_history(id)
            .map_err(|e| storage_error("Failed to load history", e))?;
        Ok(entries.into_iter().map(HistoryEntryDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodtree_api::{ItemId, ProjectId};

    fn backend() -> StorageBackend {
        let backend = StorageBackend::in_memory("tester").unwrap();
        backend
            .import(&[
                Item::new(1, "Machine"),
                Item {
                    parent_item: Some(prodtree_core::ItemId(1)),
                    ..Item::new(2, "Frame")
                },
            ])
            .unwrap();
        backend
    }

    #[test]
    fn test_unknown_item_maps_to_not_found() {
        let err = backend()
            .update_item(&UpdateItemRequest {
                item_id: ItemId("77".into()),
                field: "name".into(),
                value: Some("x".into()),
                request_id: None,
            })
            .unwrap_err();
        assert_eq!(err.code, "not_found");
    }

    #[test]
    fn test_bad_value_maps_to_invalid_argument() {
        let err = backend()
            .update_item(&UpdateItemRequest {
                item_id: ItemId("1".into()),
                field: "progress_percent".into(),
                value: Some("abc".into()),
                request_id: None,
            })
            .unwrap_err();
        assert_eq!(err.code, "invalid_argument");
    }

    #[test]
    fn test_internal_executor_clears_contractor() {
        let backend = backend();
        let request = |target, value: Option<&str>| CascadeAssignRequest {
            item_id: ItemId("1".into()),
            target,
            value: value.map(str::to_string),
            cascade: true,
            request_id: None,
        };
        let response = backend
            .assign_with_cascade(&request(AssignTarget::Contractor, Some("5")))
            .unwrap();
        assert_eq!(response.updated_count, 2);

        backend
            .assign_with_cascade(&request(AssignTarget::InternalExecutor, None))
            .unwrap();
        let items = backend
            .list_items(&ListItemsRequest {
                project_id: ProjectId("0".into()),
            })
            .unwrap();
        assert!(items.iter().all(|item| item.contractor.is_none()));
        assert!(
            items
                .iter()
                .all(|item| item.manufacturer_type == prodtree_core::ManufacturerType::Internal)
        );

        let history = backend
            .item_history(&ItemHistoryRequest {
                item_id: ItemId("2".into()),
            })
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user, "tester");
        assert_eq!(
            history[0].change_description,
            "manufacturer_type: contractor -> internal"
        );
    }

    #[test]
    fn test_reschedule_counts_the_item_itself() {
        let backend = StorageBackend::in_memory("tester").unwrap();
        backend
            .import(&[
                Item {
                    planned_start: prodtree_core::parse_day("2024-02-01").ok(),
                    ..Item::new(1, "Drive")
                },
                Item {
                    parent_item: Some(prodtree_core::ItemId(1)),
                    planned_start: prodtree_core::parse_day("2024-02-03").ok(),
                    ..Item::new(2, "Motor")
                },
            ])
            .unwrap();
        let response = backend
            .reschedule_with_descendants(&RescheduleRequest {
                item_id: ItemId("1".into()),
                planned_start: Some("2024-02-10".into()),
                request_id: None,
            })
            .unwrap();
        assert_eq!(response.updated_count, 2);

        let response = backend
            .reschedule_with_descendants(&RescheduleRequest {
                item_id: ItemId("1".into()),
                planned_start: Some("2024-02-11".into()),
                request_id: None,
            })
            .unwrap();
        assert_eq!(response.updated_count, 2);
    }

    #[test]
    fn test_contractor_target_requires_value() {
        let err = backend()
            .assign_with_cascade(&CascadeAssignRequest {
                item_id: ItemId("1".into()),
                target: AssignTarget::Contractor,
                value: None,
                cascade: false,
                request_id: None,
            })
            .unwrap_err();
        assert_eq!(err.code, "invalid_argument");
    }
}
