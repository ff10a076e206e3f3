//! Reading and writing single fields in their wire form.
//!
//! Wire forms: `YYYY-MM-DD` for dates, snake_case for statuses, decimal for
//! ids and numbers, plain text otherwise. `None` clears an optional field.

use crate::day::{DayParseError, format_day, parse_day};
use crate::field::ItemField;
use crate::item::Item;
use crate::status::{ContractorStatus, ManufacturerType, ManufacturingStatus, PurchaseStatus};
use crate::{ContractorId, EnumConversionError, ReasonId, SupplierId, UserId};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldValueError {
    #[error(transparent)]
    Day(#[from] DayParseError),
    #[error(transparent)]
    Enum(#[from] EnumConversionError),
    #[error("{field} expects a number, got {value:?}")]
    NotANumber { field: ItemField, value: String },
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: ItemField, value: String },
    #[error("{field} cannot be empty")]
    Required { field: ItemField },
}

fn normalized(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_id(field: ItemField, raw: Option<&str>) -> Result<Option<i64>, FieldValueError> {
    normalized(raw)
        .map(|value| {
            value.parse::<i64>().map_err(|_| FieldValueError::NotANumber {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

fn parse_optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>, FieldValueError> {
    Ok(normalized(raw).map(parse_day).transpose()?)
}

fn required(field: ItemField, raw: Option<&str>) -> Result<&str, FieldValueError> {
    normalized(raw).ok_or(FieldValueError::Required { field })
}

impl Item {
    /// Current value of `field` in wire form.
    pub fn field_value(&self, field: ItemField) -> Option<String> {
        let day = |value: Option<NaiveDate>| value.map(format_day);
        match field {
            ItemField::Name => Some(self.name.clone()),
            ItemField::Quantity => Some(self.quantity.to_string()),
            ItemField::ProgressPercent => Some(self.progress_percent.to_string()),
            ItemField::PlannedStart => day(self.planned_start),
            ItemField::PlannedEnd => day(self.planned_end),
            ItemField::ActualStart => day(self.actual_start),
            ItemField::ActualEnd => day(self.actual_end),
            ItemField::OrderDate => day(self.order_date),
            ItemField::RequiredDate => day(self.required_date),
            ItemField::ManufacturingStatus => Some(self.manufacturing_status.to_string()),
            ItemField::ContractorStatus => Some(self.contractor_status.to_string()),
            ItemField::PurchaseStatus => Some(self.purchase_status.to_string()),
            ItemField::Responsible => self.responsible.map(|id| id.0.to_string()),
            ItemField::ManufacturerType => Some(self.manufacturer_type.as_str().to_string()),
            ItemField::Contractor => self.contractor.map(|id| id.0.to_string()),
            ItemField::Supplier => self.supplier.map(|id| id.0.to_string()),
            ItemField::ProblemReason => self.problem_reason.map(|id| id.0.to_string()),
            ItemField::ProblemSubreason => self.problem_subreason.map(|id| id.0.to_string()),
            ItemField::ProblemNotes => self.problem_notes.clone(),
        }
    }

    /// Date stored in `field`, if it is a date field.
    pub fn date_value(&self, field: ItemField) -> Option<NaiveDate> {
        match field {
            ItemField::PlannedStart => self.planned_start,
            ItemField::PlannedEnd => self.planned_end,
            ItemField::ActualStart => self.actual_start,
            ItemField::ActualEnd => self.actual_end,
            ItemField::OrderDate => self.order_date,
            ItemField::RequiredDate => self.required_date,
            _ => None,
        }
    }

    /// Parses `raw` for `field` and stores it. On error the item is unchanged.
    ///
    /// Setting a contractor switches the item to contractor execution; the
    /// internal executor choice clears it.
    pub fn set_field(&mut self, field: ItemField, raw: Option<&str>) -> Result<(), FieldValueError> {
        match field {
            ItemField::Name => self.name = required(field, raw)?.to_string(),
            ItemField::Quantity => {
                let value = required(field, raw)?;
                let quantity = value.parse::<f64>().map_err(|_| FieldValueError::NotANumber {
                    field,
                    value: value.to_string(),
                })?;
                if !quantity.is_finite() || quantity < 0.0 {
                    return Err(FieldValueError::OutOfRange {
                        field,
                        value: value.to_string(),
                    });
                }
                self.quantity = quantity;
            }
            ItemField::ProgressPercent => {
                let value = required(field, raw)?;
                let percent = value.parse::<u8>().map_err(|_| FieldValueError::NotANumber {
                    field,
                    value: value.to_string(),
                })?;
                if percent > 100 {
                    return Err(FieldValueError::OutOfRange {
                        field,
                        value: value.to_string(),
                    });
                }
                self.progress_percent = percent;
            }
            ItemField::PlannedStart => self.planned_start = parse_optional_day(raw)?,
            ItemField::PlannedEnd => self.planned_end = parse_optional_day(raw)?,
            ItemField::ActualStart => self.actual_start = parse_optional_day(raw)?,
            ItemField::ActualEnd => self.actual_end = parse_optional_day(raw)?,
            ItemField::OrderDate => self.order_date = parse_optional_day(raw)?,
            ItemField::RequiredDate => self.required_date = parse_optional_day(raw)?,
            ItemField::ManufacturingStatus => {
                self.manufacturing_status = ManufacturingStatus::try_from(required(field, raw)?)?
            }
            ItemField::ContractorStatus => {
                self.contractor_status = ContractorStatus::try_from(required(field, raw)?)?
            }
            ItemField::PurchaseStatus => {
                self.purchase_status = PurchaseStatus::try_from(required(field, raw)?)?
            }
            ItemField::Responsible => self.responsible = parse_id(field, raw)?.map(UserId),
            ItemField::ManufacturerType => {
                let executor = ManufacturerType::try_from(required(field, raw)?)?;
                match executor {
                    ManufacturerType::Internal => self.contractor = None,
                    ManufacturerType::Contractor if self.contractor.is_none() => {
                        return Err(FieldValueError::Required {
                            field: ItemField::Contractor,
                        });
                    }
                    ManufacturerType::Contractor => {}
                }
                self.manufacturer_type = executor;
            }
            ItemField::Contractor => {
                let id = parse_id(field, raw)?.ok_or(FieldValueError::Required { field })?;
                self.contractor = Some(ContractorId(id));
                self.manufacturer_type = ManufacturerType::Contractor;
            }
            ItemField::Supplier => self.supplier = parse_id(field, raw)?.map(SupplierId),
            ItemField::ProblemReason => self.problem_reason = parse_id(field, raw)?.map(ReasonId),
            ItemField::ProblemSubreason => {
                self.problem_subreason = parse_id(field, raw)?.map(ReasonId)
            }
            ItemField::ProblemNotes => self.problem_notes = normalized(raw).map(str::to_string),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dates_round_trip_through_wire_form() {
        let mut item = Item::new(1, "Frame");
        item.set_field(ItemField::PlannedStart, Some("2024-01-10T08:30:00Z"))
            .unwrap();
        assert_eq!(
            item.field_value(ItemField::PlannedStart).as_deref(),
            Some("2024-01-10")
        );
        item.set_field(ItemField::PlannedStart, Some("  ")).unwrap();
        assert_eq!(item.planned_start, None);
    }

    #[test]
    fn test_contractor_assignment_switches_executor() {
        let mut item = Item::new(1, "Casting");
        item.set_field(ItemField::Contractor, Some("42")).unwrap();
        assert_eq!(item.manufacturer_type, ManufacturerType::Contractor);
        assert_eq!(item.contractor, Some(ContractorId(42)));

        assert_eq!(
            item.set_field(ItemField::Contractor, None),
            Err(FieldValueError::Required {
                field: ItemField::Contractor
            })
        );
        assert_eq!(item.contractor, Some(ContractorId(42)));

        item.set_field(ItemField::ManufacturerType, Some("internal"))
            .unwrap();
        assert_eq!(item.manufacturer_type, ManufacturerType::Internal);
        assert_eq!(item.contractor, None);
    }

    #[test]
    fn test_contractor_executor_needs_a_contractor() {
        let mut item = Item::new(1, "Casting");
        assert_eq!(
            item.set_field(ItemField::ManufacturerType, Some("contractor")),
            Err(FieldValueError::Required {
                field: ItemField::Contractor
            })
        );
        assert_eq!(item.manufacturer_type, ManufacturerType::Internal);
        assert_eq!(
            item.field_value(ItemField::ManufacturerType).as_deref(),
            Some("internal")
        );
    }

    #[test]
    fn test_invalid_values_leave_item_untouched() {
        let mut item = Item::new(1, "Gear");
        let before = item.clone();

        assert!(matches!(
            item.set_field(ItemField::ProgressPercent, Some("140")),
            Err(FieldValueError::OutOfRange { .. })
        ));
        assert!(matches!(
            item.set_field(ItemField::Responsible, Some("bob")),
            Err(FieldValueError::NotANumber { .. })
        ));
        assert!(matches!(
            item.set_field(ItemField::Name, Some("")),
            Err(FieldValueError::Required { .. })
        ));
        assert!(matches!(
            item.set_field(ItemField::PurchaseStatus, Some("lost")),
            Err(FieldValueError::Enum(_))
        ));
        assert!(matches!(
            item.set_field(ItemField::ActualEnd, Some("tomorrow")),
            Err(FieldValueError::Day(_))
        ));
        assert_eq!(item, before);
    }

    #[test]
    fn test_every_field_reads_back_what_was_written() {
        let samples = [
            (ItemField::Name, "Housing"),
            (ItemField::Quantity, "2.5"),
            (ItemField::ProgressPercent, "40"),
            (ItemField::OrderDate, "2024-05-01"),
            (ItemField::ManufacturingStatus, "suspended"),
            (ItemField::ContractorStatus, "manufactured_by_contractor"),
            (ItemField::PurchaseStatus, "in_order"),
            (ItemField::Supplier, "9"),
            (ItemField::ProblemSubreason, "3"),
            (ItemField::ProblemNotes, "late casting"),
        ];
        let mut item = Item::new(1, "x");
        for (field, raw) in samples {
            item.set_field(field, Some(raw)).unwrap();
            assert_eq!(item.field_value(field).as_deref(), Some(raw), "{field}");
        }
    }
}
