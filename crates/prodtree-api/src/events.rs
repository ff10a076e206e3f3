use crate::errors::ApiError;
use crate::ids::{ItemId, ProjectId};
use serde::{Deserialize, Serialize};
use specta::Type;

/// Notifications from the controller to whatever renders the views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", content = "data")]
pub enum AppEventPayload {
    /// The project item list is stale; rebuild the forest from a fresh fetch.
    ItemsInvalidated {
        project_id: ProjectId,
    },
    /// Aggregate project and contractor views are stale.
    ProjectViewsInvalidated {
        project_id: ProjectId,
    },
    /// A cascading edit waits for the user to pick a scope.
    ScopeRequired {
        token: String,
        item_id: ItemId,
        field: String,
        descendant_count: u32,
    },
    MutationSucceeded {
        request_id: String,
        item_id: ItemId,
        field: String,
        updated_count: u32,
        message: String,
    },
    MutationFailed {
        /// Absent when the failure happened before a request id was issued.
        request_id: Option<String>,
        item_id: ItemId,
        field: String,
        error: ApiError,
    },
    ValidationFailed {
        item_id: ItemId,
        field: String,
        message: String,
    },
    ValidationWarning {
        item_id: ItemId,
        field: String,
        message: String,
    },
    StatusUpdate {
        message: String,
    },
}
