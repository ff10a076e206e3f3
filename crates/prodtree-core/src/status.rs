use crate::EnumConversionError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturingStatus {
    #[default]
    NotStarted,
    InProgress,
    Suspended,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractorStatus {
    #[default]
    SentToContractor,
    InProgressByContractor,
    SuspendedByContractor,
    ManufacturedByContractor,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    #[default]
    WaitingOrder,
    InOrder,
    Closed,
    WrittenOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManufacturerType {
    #[default]
    Internal,
    Contractor,
}

/// Who executes an item: the own shop floor, an external contractor, or a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Internal,
    Contractor,
    Supplier,
}

/// The one status value that governs an item, picked from the vocabulary its
/// discriminator and executor select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "vocabulary", content = "value", rename_all = "snake_case")]
pub enum StatusValue {
    Manufacturing(ManufacturingStatus),
    Contractor(ContractorStatus),
    Purchase(PurchaseStatus),
}

impl StatusValue {
    /// True for the first value of each vocabulary.
    pub fn is_earliest(self) -> bool {
        matches!(
            self,
            StatusValue::Manufacturing(ManufacturingStatus::NotStarted)
                | StatusValue::Contractor(ContractorStatus::SentToContractor)
                | StatusValue::Purchase(PurchaseStatus::WaitingOrder)
        )
    }

    pub fn is_completed(self) -> bool {
        matches!(
            self,
            StatusValue::Manufacturing(ManufacturingStatus::Completed)
                | StatusValue::Contractor(ContractorStatus::Completed)
                | StatusValue::Purchase(PurchaseStatus::Closed)
        )
    }

    pub fn is_suspended(self) -> bool {
        matches!(
            self,
            StatusValue::Manufacturing(ManufacturingStatus::Suspended)
                | StatusValue::Contractor(ContractorStatus::SuspendedByContractor)
                | StatusValue::Purchase(PurchaseStatus::WrittenOff)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusValue::Manufacturing(s) => s.as_str(),
            StatusValue::Contractor(s) => s.as_str(),
            StatusValue::Purchase(s) => s.as_str(),
        }
    }
}

macro_rules! string_enum {
    ($ty:ident, $err:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];
            pub const OPTIONS: &'static [&'static str] = &[$($text),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = EnumConversionError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.trim() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(EnumConversionError::$err(other.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(ManufacturingStatus, InvalidManufacturingStatus, {
    NotStarted => "not_started",
    InProgress => "in_progress",
    Suspended => "suspended",
    Completed => "completed",
});

string_enum!(ContractorStatus, InvalidContractorStatus, {
    SentToContractor => "sent_to_contractor",
    InProgressByContractor => "in_progress_by_contractor",
    SuspendedByContractor => "suspended_by_contractor",
    ManufacturedByContractor => "manufactured_by_contractor",
    Completed => "completed",
});

string_enum!(PurchaseStatus, InvalidPurchaseStatus, {
    WaitingOrder => "waiting_order",
    InOrder => "in_order",
    Closed => "closed",
    WrittenOff => "written_off",
});

string_enum!(ManufacturerType, InvalidManufacturerType, {
    Internal => "internal",
    Contractor => "contractor",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms_match_serde() {
        for status in ContractorStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(ContractorStatus::try_from(status.as_str()).unwrap(), *status);
        }
    }

    #[test]
    fn test_unknown_value_is_rejected() {
        let err = PurchaseStatus::try_from("lost").unwrap_err();
        assert_eq!(err, EnumConversionError::InvalidPurchaseStatus("lost".into()));
    }

    #[test]
    fn test_earliest_values() {
        assert!(StatusValue::Manufacturing(ManufacturingStatus::NotStarted).is_earliest());
        assert!(StatusValue::Contractor(ContractorStatus::SentToContractor).is_earliest());
        assert!(StatusValue::Purchase(PurchaseStatus::WaitingOrder).is_earliest());
        assert!(!StatusValue::Purchase(PurchaseStatus::InOrder).is_earliest());
    }
}
