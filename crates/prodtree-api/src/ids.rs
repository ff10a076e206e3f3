use crate::errors::ApiError;
use prodtree_core as core;
use serde::{Deserialize, Serialize};
use specta::Type;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn to_core(&self) -> Result<core::ItemId, ApiError> {
        let raw = self.0.trim();
        let parsed = raw
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_argument(format!("Invalid ItemId: {raw}")))?;
        Ok(core::ItemId(parsed))
    }
}

impl From<core::ItemId> for ItemId {
    fn from(value: core::ItemId) -> Self {
        Self(value.0.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Type)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn to_core(&self) -> Result<core::ProjectId, ApiError> {
        let raw = self.0.trim();
        let parsed = raw
            .parse::<i64>()
            .map_err(|_| ApiError::invalid_argument(format!("Invalid ProjectId: {raw}")))?;
        Ok(core::ProjectId(parsed))
    }
}

impl From<core::ProjectId> for ProjectId {
    fn from(value: core::ProjectId) -> Self {
        Self(value.0.to_string())
    }
}
