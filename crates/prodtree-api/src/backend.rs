use crate::dto::{
    CascadeAssignRequest, CascadeResponse, HistoryEntryDto, ItemHistoryRequest, ListItemsRequest,
    RecomputeDatesRequest, RecomputeDatesResponse, RescheduleRequest, UpdateItemRequest,
};
use crate::errors::ApiError;
use prodtree_core::Item;

/// The mutation and query surface the structure views depend on.
///
/// Every call is one logical request: a cascade either updates the whole
/// subtree or nothing, and reports how many items it touched.
pub trait ItemBackend: Send + Sync {
    fn list_items(&self, request: &ListItemsRequest) -> Result<Vec<Item>, ApiError>;

    /// Applies a single-field patch and returns the item as stored.
    fn update_item(&self, request: &UpdateItemRequest) -> Result<Item, ApiError>;

    fn assign_with_cascade(
        &self,
        request: &CascadeAssignRequest,
    ) -> Result<CascadeResponse, ApiError>;

    /// Moves descendants so none starts before its parent.
    fn recompute_descendant_dates(
        &self,
        request: &RecomputeDatesRequest,
    ) -> Result<RecomputeDatesResponse, ApiError>;

    /// Sets the planned start and moves descendants as one unit. The count
    /// includes the item itself.
    fn reschedule_with_descendants(
        &self,
        request: &RescheduleRequest,
    ) -> Result<RecomputeDatesResponse, ApiError>;

    /// Newest entry first.
    fn item_history(&self, request: &ItemHistoryRequest) -> Result<Vec<HistoryEntryDto>, ApiError>;
}
