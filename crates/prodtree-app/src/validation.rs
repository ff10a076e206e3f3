use chrono::NaiveDate;
use prodtree_core::{DateRole, FieldValueError, Item, ItemField, ManufacturerType, format_day};
use serde::Serialize;
use thiserror::Error;

/// Edit rejected locally; nothing is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    InvalidValue(#[from] FieldValueError),
    #[error("{field} {} is later than {other} {}", format_day(*.value), format_day(*.other_value))]
    StartAfterEnd {
        field: ItemField,
        value: NaiveDate,
        other: ItemField,
        other_value: NaiveDate,
    },
    #[error("{field} {} is earlier than {other} {}", format_day(*.value), format_day(*.other_value))]
    EndBeforeStart {
        field: ItemField,
        value: NaiveDate,
        other: ItemField,
        other_value: NaiveDate,
    },
    #[error("{field} does not apply to this item")]
    NotApplicable { field: ItemField },
    #[error("contractor execution needs a contractor")]
    ContractorRequired,
}

/// Accepted edit that the user should still hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    EndsAfterParentStart {
        end: NaiveDate,
        parent_start: NaiveDate,
    },
}

impl ValidationWarning {
    pub fn message(&self) -> String {
        match self {
            ValidationWarning::EndsAfterParentStart { end, parent_start } => format!(
                "Ends {} while the parent item starts {}",
                format_day(*end),
                format_day(*parent_start)
            ),
        }
    }
}

/// Result of checking one edit against the item as currently loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedEdit {
    /// Value in canonical wire form; `None` clears the field.
    pub value: Option<String>,
    pub warnings: Vec<ValidationWarning>,
}

/// Parses `raw` against `item`, checks the date order on the item itself and
/// the parent relation.
pub fn check_edit(
    item: &Item,
    parent: Option<&Item>,
    field: ItemField,
    raw: Option<&str>,
) -> Result<CheckedEdit, ValidationError> {
    if !crate::field::applies_to(field, item) {
        return Err(ValidationError::NotApplicable { field });
    }
    if needs_contractor(item, field, raw) {
        return Err(ValidationError::ContractorRequired);
    }

    let mut edited = item.clone();
    edited.set_field(field, raw)?;
    let value = edited.field_value(field);

    let mut warnings = Vec::new();
    if let (Some(new_day), Some((other, role))) = (edited.date_value(field), field.date_counterpart())
        && let Some(other_day) = item.date_value(other)
    {
        match role {
            DateRole::Start if new_day > other_day => {
                return Err(ValidationError::StartAfterEnd {
                    field,
                    value: new_day,
                    other,
                    other_value: other_day,
                });
            }
            DateRole::End if new_day < other_day => {
                return Err(ValidationError::EndBeforeStart {
                    field,
                    value: new_day,
                    other,
                    other_value: other_day,
                });
            }
            _ => {}
        }
    }

    if matches!(field, ItemField::PlannedEnd | ItemField::RequiredDate)
        && let (Some(end), Some(parent_start)) = (
            edited.date_value(field),
            parent.and_then(Item::effective_start),
        )
        && end > parent_start
    {
        warnings.push(ValidationWarning::EndsAfterParentStart { end, parent_start });
    }

    Ok(CheckedEdit { value, warnings })
}

/// A contractor edit without an id, or a switch to contractor execution while
/// the item has no contractor.
fn needs_contractor(item: &Item, field: ItemField, raw: Option<&str>) -> bool {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
    match field {
        ItemField::Contractor => raw.is_none(),
        ItemField::ManufacturerType => {
            raw == Some(ManufacturerType::Contractor.as_str()) && item.contractor.is_none()
        }
        _ => false,
    }
}
