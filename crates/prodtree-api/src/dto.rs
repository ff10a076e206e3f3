use crate::ids::{ItemId, ProjectId};
use crate::types::AssignTarget;
use prodtree_core::{HistoryEntry, format_day};
use serde::{Deserialize, Serialize};
use specta::Type;

#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct ListItemsRequest {
    pub project_id: ProjectId,
}

/// Partial update of one field. `value` uses the field's wire form
/// (`YYYY-MM-DD` for dates, snake_case for statuses, decimal ids);
/// `None` clears the field.
#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct UpdateItemRequest {
    pub item_id: ItemId,
    pub field: String,
    #[serde(default)]
    pub value: Option<String>,
    /// Correlation id for logs and events.
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct CascadeAssignRequest {
    pub item_id: ItemId,
    pub target: AssignTarget,
    #[serde(default)]
    pub value: Option<String>,
    /// Apply to every descendant as well, in the same request.
    pub cascade: bool,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct CascadeResponse {
    /// Items changed, the addressed node included.
    // Use u32 so TS can safely represent this as `number` without BigInt.
    pub updated_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct RecomputeDatesRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// New planned start for an item, with its descendants shifted in the same
/// request.
#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct RescheduleRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub planned_start: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct RecomputeDatesResponse {
    /// Items whose dates changed.
    pub updated_count: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Type)]
pub struct ItemHistoryRequest {
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct HistoryEntryDto {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub user: String,
    pub change_description: String,
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(value: HistoryEntry) -> Self {
        Self {
            date: format_day(value.date),
            user: value.user,
            change_description: value.change_description,
        }
    }
}
