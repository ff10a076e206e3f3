use crate::day;
use crate::status::{
    ContractorStatus, ExecutorKind, ManufacturerType, ManufacturingStatus, PurchaseStatus,
    StatusValue,
};
use crate::{ContractorId, ItemId, ProjectId, ReasonId, SupplierId, UNORDERED_CATEGORY, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One unit of work in the breakdown: a manufactured part/assembly or a purchased item.
///
/// Purchased and manufactured items share the record but read different
/// fields: purchased items are scheduled by `order_date`/`required_date` and
/// tracked by `purchase_status`; manufactured ones by the planned dates and
/// either `manufacturing_status` or, for contractor work, `contractor_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Item {
    pub id: ItemId,
    pub project: ProjectId,
    pub parent_item: Option<ItemId>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub is_purchased: bool,
    pub category_sort_order: Option<i64>,

    pub manufacturer_type: ManufacturerType,
    pub manufacturing_status: ManufacturingStatus,
    pub contractor_status: ContractorStatus,
    pub purchase_status: PurchaseStatus,

    #[serde(with = "day::optional")]
    pub planned_start: Option<NaiveDate>,
    #[serde(with = "day::optional")]
    pub planned_end: Option<NaiveDate>,
    #[serde(with = "day::optional")]
    pub actual_start: Option<NaiveDate>,
    #[serde(with = "day::optional")]
    pub actual_end: Option<NaiveDate>,
    #[serde(with = "day::optional")]
    pub order_date: Option<NaiveDate>,
    #[serde(with = "day::optional")]
    pub required_date: Option<NaiveDate>,

    pub responsible: Option<UserId>,
    pub contractor: Option<ContractorId>,
    pub supplier: Option<SupplierId>,

    pub progress_percent: u8,
    pub calculated_progress: Option<f32>,

    pub has_problem: bool,
    pub problem_reason: Option<ReasonId>,
    pub problem_subreason: Option<ReasonId>,
    pub problem_notes: Option<String>,

    /// Descendant count as reported by the server.
    pub children_count: u32,
}

impl Item {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            quantity: 1.0,
            unit: "pcs".to_string(),
            ..Default::default()
        }
    }

    pub fn executor_kind(&self) -> ExecutorKind {
        if self.is_purchased {
            ExecutorKind::Supplier
        } else if self.manufacturer_type == ManufacturerType::Contractor {
            ExecutorKind::Contractor
        } else {
            ExecutorKind::Internal
        }
    }

    pub fn status(&self) -> StatusValue {
        match self.executor_kind() {
            ExecutorKind::Supplier => StatusValue::Purchase(self.purchase_status),
            ExecutorKind::Contractor => StatusValue::Contractor(self.contractor_status),
            ExecutorKind::Internal => StatusValue::Manufacturing(self.manufacturing_status),
        }
    }

    /// Start date used for scheduling: `order_date` for purchases, `planned_start` otherwise.
    pub fn effective_start(&self) -> Option<NaiveDate> {
        if self.is_purchased {
            self.order_date
        } else {
            self.planned_start
        }
    }

    /// End date used for scheduling: `required_date` for purchases, `planned_end` otherwise.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        if self.is_purchased {
            self.required_date
        } else {
            self.planned_end
        }
    }

    pub fn category_key(&self) -> i64 {
        self.category_sort_order.unwrap_or(UNORDERED_CATEGORY)
    }

    /// Every date field that is set, regardless of discriminator.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        [
            self.planned_start,
            self.planned_end,
            self.actual_start,
            self.actual_end,
            self.order_date,
            self.required_date,
        ]
        .into_iter()
        .flatten()
    }

    /// A problem flag, a reason reference or a non-blank note.
    pub fn has_deviation(&self) -> bool {
        self.has_problem
            || self.problem_reason.is_some()
            || self.problem_subreason.is_some()
            || self
                .problem_notes
                .as_deref()
                .is_some_and(|notes| !notes.trim().is_empty())
    }

    /// Backend-computed progress when present and finite, else the manually
    /// entered percent.
    pub fn effective_progress(&self) -> f32 {
        self.calculated_progress
            .filter(|progress| progress.is_finite())
            .unwrap_or(f32::from(self.progress_percent))
            .clamp(0.0, 100.0)
    }
}
