mod backend;
mod dto;
mod errors;
mod events;
mod ids;
mod types;

pub use backend::ItemBackend;
pub use dto::{
    CascadeAssignRequest, CascadeResponse, HistoryEntryDto, ItemHistoryRequest, ListItemsRequest,
    RecomputeDatesRequest, RecomputeDatesResponse, RescheduleRequest, UpdateItemRequest,
};
pub use errors::ApiError;
pub use events::AppEventPayload;
pub use ids::{ItemId, ProjectId};
pub use types::AssignTarget;
