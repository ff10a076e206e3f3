//! Per-field editing rules.
//!
//! Every editable [`ItemField`] maps to exactly one [`FieldKind`] through
//! [`field_kind`]; the kind tells a view which editor to open and which
//! values are acceptable. Parsing itself goes through the item so the stored
//! and the validated forms never drift.

use prodtree_api::AssignTarget;
use prodtree_core::{
    ContractorStatus, DateRole, Item, ItemField, ManufacturerType, ManufacturingStatus,
    PurchaseStatus,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Employee,
    Contractor,
    Supplier,
    ProblemReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Calendar day, `YYYY-MM-DD`.
    Date { role: DateRole },
    EnumWithOptions { options: &'static [&'static str] },
    ReferencePicker { reference: ReferenceKind, clearable: bool },
    FreeformText { required: bool },
    Numeric { min: f64, max: Option<f64>, integer: bool },
}

pub fn field_kind(field: ItemField) -> FieldKind {
    match field {
        ItemField::Name => FieldKind::FreeformText { required: true },
        ItemField::ProblemNotes => FieldKind::FreeformText { required: false },
        ItemField::Quantity => FieldKind::Numeric {
            min: 0.0,
            max: None,
            integer: false,
        },
        ItemField::ProgressPercent => FieldKind::Numeric {
            min: 0.0,
            max: Some(100.0),
            integer: true,
        },
        ItemField::PlannedStart | ItemField::ActualStart | ItemField::OrderDate => {
            FieldKind::Date {
                role: DateRole::Start,
            }
        }
        ItemField::PlannedEnd | ItemField::ActualEnd | ItemField::RequiredDate => FieldKind::Date {
            role: DateRole::End,
        },
        ItemField::ManufacturingStatus => FieldKind::EnumWithOptions {
            options: ManufacturingStatus::OPTIONS,
        },
        ItemField::ContractorStatus => FieldKind::EnumWithOptions {
            options: ContractorStatus::OPTIONS,
        },
        ItemField::PurchaseStatus => FieldKind::EnumWithOptions {
            options: PurchaseStatus::OPTIONS,
        },
        ItemField::Responsible => FieldKind::ReferencePicker {
            reference: ReferenceKind::Employee,
            clearable: true,
        },
        ItemField::ManufacturerType => FieldKind::EnumWithOptions {
            options: ManufacturerType::OPTIONS,
        },
        // Back to the internal shop goes through the executor choice.
        ItemField::Contractor => FieldKind::ReferencePicker {
            reference: ReferenceKind::Contractor,
            clearable: false,
        },
        ItemField::Supplier => FieldKind::ReferencePicker {
            reference: ReferenceKind::Supplier,
            clearable: true,
        },
        ItemField::ProblemReason | ItemField::ProblemSubreason => FieldKind::ReferencePicker {
            reference: ReferenceKind::ProblemReason,
            clearable: true,
        },
    }
}

/// How a field edit reaches the backend when the node has descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeAction {
    /// Plain single-item update.
    None,
    /// Assignment that may be applied to the whole subtree in one request.
    Assign,
    /// New start for the node with descendant dates moved in the same request.
    RecomputeDates,
}

pub fn cascade_action(field: ItemField) -> CascadeAction {
    match field {
        ItemField::Responsible | ItemField::Contractor | ItemField::ManufacturerType => {
            CascadeAction::Assign
        }
        ItemField::PlannedStart => CascadeAction::RecomputeDates,
        _ => CascadeAction::None,
    }
}

/// Backend target and value for an assignment of the checked `value`.
///
/// Choosing the contractor executor hands the item's current contractor down
/// the subtree; choosing internal clears it.
pub fn assign_request(
    field: ItemField,
    item: &Item,
    value: Option<&str>,
) -> Option<(AssignTarget, Option<String>)> {
    match field {
        ItemField::Responsible => Some((AssignTarget::Responsible, value.map(str::to_string))),
        ItemField::Contractor => Some((AssignTarget::Contractor, Some(value?.to_string()))),
        ItemField::ManufacturerType => match ManufacturerType::try_from(value?).ok()? {
            ManufacturerType::Internal => Some((AssignTarget::InternalExecutor, None)),
            ManufacturerType::Contractor => Some((
                AssignTarget::Contractor,
                Some(item.contractor?.0.to_string()),
            )),
        },
        _ => None,
    }
}

/// Whether `field` is relevant for `item`: purchased items have no
/// manufacturing schedule or executor; manufactured ones no purchase fields.
pub fn applies_to(field: ItemField, item: &Item) -> bool {
    match field {
        ItemField::PlannedStart
        | ItemField::PlannedEnd
        | ItemField::ManufacturingStatus
        | ItemField::ContractorStatus
        | ItemField::ManufacturerType
        | ItemField::Contractor => !item.is_purchased,
        ItemField::OrderDate
        | ItemField::RequiredDate
        | ItemField::PurchaseStatus
        | ItemField::Supplier => item.is_purchased,
        _ => true,
    }
}
