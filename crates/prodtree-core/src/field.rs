use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Editable item fields, named the way the backend names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Name,
    Quantity,
    ProgressPercent,
    PlannedStart,
    PlannedEnd,
    ActualStart,
    ActualEnd,
    OrderDate,
    RequiredDate,
    ManufacturingStatus,
    ContractorStatus,
    PurchaseStatus,
    Responsible,
    /// Executor choice: `internal` shop or `contractor`.
    ManufacturerType,
    /// Contractor doing the work; setting one switches the executor to contractor.
    Contractor,
    Supplier,
    ProblemReason,
    ProblemSubreason,
    ProblemNotes,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown item field: {0}")]
pub struct UnknownFieldError(pub String);

impl ItemField {
    pub const ALL: &'static [ItemField] = &[
        ItemField::Name,
        ItemField::Quantity,
        ItemField::ProgressPercent,
        ItemField::PlannedStart,
        ItemField::PlannedEnd,
        ItemField::ActualStart,
        ItemField::ActualEnd,
        ItemField::OrderDate,
        ItemField::RequiredDate,
        ItemField::ManufacturingStatus,
        ItemField::ContractorStatus,
        ItemField::PurchaseStatus,
        ItemField::Responsible,
        ItemField::ManufacturerType,
        ItemField::Contractor,
        ItemField::Supplier,
        ItemField::ProblemReason,
        ItemField::ProblemSubreason,
        ItemField::ProblemNotes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemField::Name => "name",
            ItemField::Quantity => "quantity",
            ItemField::ProgressPercent => "progress_percent",
            ItemField::PlannedStart => "planned_start",
            ItemField::PlannedEnd => "planned_end",
            ItemField::ActualStart => "actual_start",
            ItemField::ActualEnd => "actual_end",
            ItemField::OrderDate => "order_date",
            ItemField::RequiredDate => "required_date",
            ItemField::ManufacturingStatus => "manufacturing_status",
            ItemField::ContractorStatus => "contractor_status",
            ItemField::PurchaseStatus => "purchase_status",
            ItemField::Responsible => "responsible",
            ItemField::ManufacturerType => "manufacturer_type",
            ItemField::Contractor => "contractor",
            ItemField::Supplier => "supplier",
            ItemField::ProblemReason => "problem_reason",
            ItemField::ProblemSubreason => "problem_subreason",
            ItemField::ProblemNotes => "problem_notes",
        }
    }

    /// Start/end pairing used by date-order validation.
    pub fn date_counterpart(self) -> Option<(ItemField, DateRole)> {
        match self {
            ItemField::PlannedStart => Some((ItemField::PlannedEnd, DateRole::Start)),
            ItemField::PlannedEnd => Some((ItemField::PlannedStart, DateRole::End)),
            ItemField::ActualStart => Some((ItemField::ActualEnd, DateRole::Start)),
            ItemField::ActualEnd => Some((ItemField::ActualStart, DateRole::End)),
            ItemField::OrderDate => Some((ItemField::RequiredDate, DateRole::Start)),
            ItemField::RequiredDate => Some((ItemField::OrderDate, DateRole::End)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateRole {
    Start,
    End,
}

impl TryFrom<&str> for ItemField {
    type Error = UnknownFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        ItemField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| UnknownFieldError(value.to_string()))
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
