use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod day;
pub mod field;
pub mod item;
pub mod patch;
pub mod status;

pub use day::{DayParseError, format_day, parse_day};
pub use field::{DateRole, ItemField, UnknownFieldError};
pub use item::Item;
pub use patch::FieldValueError;
pub use status::{
    ContractorStatus, ExecutorKind, ManufacturerType, ManufacturingStatus, PurchaseStatus,
    StatusValue,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an employee (the `responsible` person of an item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractorId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(pub i64);

/// Reference into the problem reason / subreason dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonId(pub i64);

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionError {
    #[error("Invalid manufacturing status: {0}")]
    InvalidManufacturingStatus(String),
    #[error("Invalid contractor status: {0}")]
    InvalidContractorStatus(String),
    #[error("Invalid purchase status: {0}")]
    InvalidPurchaseStatus(String),
    #[error("Invalid manufacturer type: {0}")]
    InvalidManufacturerType(String),
}

/// Sort key used for items without a category order. Greater than any real value.
pub const UNORDERED_CATEGORY: i64 = i64::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "day::required")]
    pub date: chrono::NaiveDate,
    pub user: String,
    pub change_description: String,
}
