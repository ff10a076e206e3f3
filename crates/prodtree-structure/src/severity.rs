//! Severity classification.
//!
//! Every row gets exactly one [`Severity`], derived from its status, its
//! effective dates and its executor. Several signals are often true at once
//! (an item can be overdue and carry a deviation note); the precedence in
//! [`SeverityClassifier::classify`] decides which one is shown:
//!
//! done → paused → overdue → not started (at-risk variant) →
//! in progress (deviation variant) → waiting.
//!
//! Parents additionally get a [`DescendantSignal`] computed from their
//! descendants only, which badges the row without changing its own colour.

use crate::tree::TreeNode;
use chrono::NaiveDate;
use prodtree_core::{ExecutorKind, Item, ItemId, PurchaseStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Done,
    Paused,
    Overdue,
    AtRisk,
    NotStarted,
    Deviation,
    InProgress,
    Waiting,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[
        Severity::Done,
        Severity::Paused,
        Severity::Overdue,
        Severity::AtRisk,
        Severity::NotStarted,
        Severity::Deviation,
        Severity::InProgress,
        Severity::Waiting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Done => "done",
            Severity::Paused => "paused",
            Severity::Overdue => "overdue",
            Severity::AtRisk => "at_risk",
            Severity::NotStarted => "not_started",
            Severity::Deviation => "deviation",
            Severity::InProgress => "in_progress",
            Severity::Waiting => "waiting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub severity: Severity,
    pub is_done: bool,
    pub is_paused: bool,
    pub is_not_started: bool,
    pub is_in_progress: bool,
    pub is_past_due: bool,
    pub is_at_risk: bool,
    pub has_deviation: bool,
    pub executor_kind: ExecutorKind,
}

/// Badge for a parent row, summarising its descendants (never the row itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescendantSignal {
    OverdueDescendant,
    RiskOrDeviationDescendant,
    Clean,
}

/// Classifies items against one shared "today", so a whole render agrees on
/// what is overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityClassifier {
    today: NaiveDate,
}

impl SeverityClassifier {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn classify(&self, item: &Item) -> Classification {
        let status = item.status();

        let is_done = status.is_completed() || item.actual_end.is_some();
        let is_paused = status.is_suspended();
        let is_not_started = status.is_earliest() && item.actual_start.is_none();
        let order_placed = item.is_purchased && item.purchase_status == PurchaseStatus::InOrder;
        let is_in_progress = (item.actual_start.is_some() || order_placed) && !is_done;
        let is_past_due = !is_done && item.effective_end().is_some_and(|end| end < self.today);
        let is_at_risk =
            is_not_started && item.effective_start().is_some_and(|start| start < self.today);
        let has_deviation = item.has_deviation();

        let severity = if is_done {
            Severity::Done
        } else if is_paused {
            Severity::Paused
        } else if is_past_due {
            Severity::Overdue
        } else if is_not_started {
            if is_at_risk {
                Severity::AtRisk
            } else {
                Severity::NotStarted
            }
        } else if is_in_progress {
            if has_deviation {
                Severity::Deviation
            } else {
                Severity::InProgress
            }
        } else {
            Severity::Waiting
        };

        Classification {
            severity,
            is_done,
            is_paused,
            is_not_started,
            is_in_progress,
            is_past_due,
            is_at_risk,
            has_deviation,
            executor_kind: item.executor_kind(),
        }
    }

    /// Descendant badges for every node that has children, keyed by node id.
    pub fn aggregate(&self, forest: &[TreeNode]) -> HashMap<ItemId, DescendantSignal> {
        let mut signals = HashMap::new();
        for root in forest {
            self.summarize(root, &mut signals);
        }
        signals
    }

    /// Post-order pass; returns the flags of `node`'s subtree including itself.
    fn summarize(
        &self,
        node: &TreeNode,
        signals: &mut HashMap<ItemId, DescendantSignal>,
    ) -> SubtreeFlags {
        let mut below = SubtreeFlags::default();
        for child in &node.children {
            below.merge(self.summarize(child, signals));
        }
        if node.has_children() {
            signals.insert(node.id(), below.signal());
        }

        let own = self.classify(&node.item);
        below.merge(SubtreeFlags {
            overdue: own.is_past_due,
            risk_or_deviation: own.is_at_risk || own.has_deviation,
        });
        below
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SubtreeFlags {
    overdue: bool,
    risk_or_deviation: bool,
}

impl SubtreeFlags {
    fn merge(&mut self, other: SubtreeFlags) {
        self.overdue |= other.overdue;
        self.risk_or_deviation |= other.risk_or_deviation;
    }

    fn signal(self) -> DescendantSignal {
        if self.overdue {
            DescendantSignal::OverdueDescendant
        } else if self.risk_or_deviation {
            DescendantSignal::RiskOrDeviationDescendant
        } else {
            DescendantSignal::Clean
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_forest;
    use prodtree_core::{
        ContractorStatus, ManufacturerType, ManufacturingStatus, ReasonId, parse_day,
    };

    fn day(raw: &str) -> NaiveDate {
        parse_day(raw).unwrap()
    }

    fn classifier() -> SeverityClassifier {
        SeverityClassifier::new(day("2024-03-15"))
    }

    fn manufactured(status: ManufacturingStatus) -> Item {
        Item {
            manufacturing_status: status,
            ..Item::new(1, "Shaft")
        }
    }

    #[test]
    fn test_completed_with_deviation_is_done() {
        let item = Item {
            actual_end: Some(day("2024-02-01")),
            problem_notes: Some("weld rework".into()),
            ..manufactured(ManufacturingStatus::Completed)
        };
        let c = classifier().classify(&item);
        assert_eq!(c.severity, Severity::Done);
        assert!(c.has_deviation);
    }

    #[test]
    fn test_actual_end_alone_means_done() {
        let item = Item {
            actual_start: Some(day("2024-01-01")),
            actual_end: Some(day("2024-01-20")),
            planned_end: Some(day("2024-01-10")),
            ..manufactured(ManufacturingStatus::InProgress)
        };
        let c = classifier().classify(&item);
        assert_eq!(c.severity, Severity::Done);
        assert!(!c.is_past_due);
    }

    #[test]
    fn test_suspended_beats_overdue() {
        let item = Item {
            planned_end: Some(day("2024-01-01")),
            ..manufactured(ManufacturingStatus::Suspended)
        };
        let c = classifier().classify(&item);
        assert_eq!(c.severity, Severity::Paused);
        assert!(c.is_past_due);
    }

    #[test]
    fn test_overdue_beats_deviation() {
        let item = Item {
            actual_start: Some(day("2024-01-01")),
            planned_end: Some(day("2024-03-14")),
            has_problem: true,
            problem_reason: Some(ReasonId(3)),
            ..manufactured(ManufacturingStatus::InProgress)
        };
        let c = classifier().classify(&item);
        assert!(c.is_past_due && c.has_deviation && c.is_in_progress);
        assert_eq!(c.severity, Severity::Overdue);
    }

    #[test]
    fn test_end_today_is_not_overdue() {
        let item = Item {
            actual_start: Some(day("2024-03-01")),
            planned_end: Some(day("2024-03-15")),
            ..manufactured(ManufacturingStatus::InProgress)
        };
        let c = classifier().classify(&item);
        assert!(!c.is_past_due);
        assert_eq!(c.severity, Severity::InProgress);
    }

    #[test]
    fn test_not_started_with_past_start_is_at_risk() {
        let item = Item {
            planned_start: Some(day("2024-03-01")),
            planned_end: Some(day("2024-04-01")),
            ..manufactured(ManufacturingStatus::NotStarted)
        };
        let c = classifier().classify(&item);
        assert!(c.is_at_risk);
        assert_eq!(c.severity, Severity::AtRisk);

        let later = Item {
            planned_start: Some(day("2024-03-20")),
            ..item
        };
        assert_eq!(classifier().classify(&later).severity, Severity::NotStarted);
    }

    #[test]
    fn test_in_progress_with_deviation() {
        let item = Item {
            actual_start: Some(day("2024-03-01")),
            problem_notes: Some("late casting".into()),
            ..manufactured(ManufacturingStatus::InProgress)
        };
        assert_eq!(classifier().classify(&item).severity, Severity::Deviation);
    }

    #[test]
    fn test_in_progress_status_without_actual_start_waits() {
        let item = manufactured(ManufacturingStatus::InProgress);
        let c = classifier().classify(&item);
        assert!(!c.is_not_started && !c.is_in_progress);
        assert_eq!(c.severity, Severity::Waiting);
    }

    #[test]
    fn test_contractor_vocabulary_is_used() {
        let item = Item {
            manufacturer_type: ManufacturerType::Contractor,
            manufacturing_status: ManufacturingStatus::Completed,
            contractor_status: ContractorStatus::SuspendedByContractor,
            ..Item::new(2, "Casting")
        };
        let c = classifier().classify(&item);
        assert_eq!(c.executor_kind, ExecutorKind::Contractor);
        assert_eq!(c.severity, Severity::Paused);

        let sent = Item {
            contractor_status: ContractorStatus::SentToContractor,
            ..item
        };
        assert_eq!(classifier().classify(&sent).severity, Severity::NotStarted);
    }

    #[test]
    fn test_purchase_states() {
        let base = Item {
            is_purchased: true,
            order_date: Some(day("2024-03-01")),
            required_date: Some(day("2024-04-01")),
            ..Item::new(3, "Bearing 6204")
        };

        let waiting = classifier().classify(&base);
        assert_eq!(waiting.executor_kind, ExecutorKind::Supplier);
        assert_eq!(waiting.severity, Severity::AtRisk);

        let ordered = Item {
            purchase_status: PurchaseStatus::InOrder,
            ..base.clone()
        };
        assert_eq!(classifier().classify(&ordered).severity, Severity::InProgress);

        let closed = Item {
            purchase_status: PurchaseStatus::Closed,
            ..base.clone()
        };
        assert_eq!(classifier().classify(&closed).severity, Severity::Done);

        let written_off = Item {
            purchase_status: PurchaseStatus::WrittenOff,
            ..base
        };
        assert_eq!(classifier().classify(&written_off).severity, Severity::Paused);
    }

    #[test]
    fn test_purchase_past_required_date_is_overdue() {
        let item = Item {
            is_purchased: true,
            purchase_status: PurchaseStatus::InOrder,
            planned_end: Some(day("2024-12-01")),
            required_date: Some(day("2024-03-01")),
            ..Item::new(4, "Motor")
        };
        assert_eq!(classifier().classify(&item).severity, Severity::Overdue);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let item = Item {
            actual_start: Some(day("2024-01-01")),
            planned_end: Some(day("2024-02-01")),
            problem_notes: Some("x".into()),
            ..manufactured(ManufacturingStatus::InProgress)
        };
        let c = classifier();
        assert_eq!(c.classify(&item), c.classify(&item));
    }

    #[test]
    fn test_aggregate_looks_only_at_descendants() {
        let overdue_parent = Item {
            planned_end: Some(day("2024-01-01")),
            actual_start: Some(day("2023-12-01")),
            ..Item::new(1, "Assembly")
        };
        let forest = build_forest(vec![
            overdue_parent,
            Item {
                parent_item: Some(ItemId(1)),
                ..Item::new(2, "Clean child")
            },
            Item::new(3, "Other root"),
            Item {
                parent_item: Some(ItemId(3)),
                problem_notes: Some("missing drawing".into()),
                ..Item::new(4, "Mid")
            },
            Item {
                parent_item: Some(ItemId(4)),
                planned_end: Some(day("2024-03-01")),
                ..Item::new(5, "Late leaf")
            },
        ]);

        let signals = classifier().aggregate(&forest);
        assert_eq!(signals.get(&ItemId(1)), Some(&DescendantSignal::Clean));
        assert_eq!(signals.get(&ItemId(3)), Some(&DescendantSignal::OverdueDescendant));
        assert_eq!(
            signals.get(&ItemId(4)),
            Some(&DescendantSignal::OverdueDescendant)
        );
        assert!(!signals.contains_key(&ItemId(2)));
        assert!(!signals.contains_key(&ItemId(5)));
    }

    #[test]
    fn test_aggregate_risk_or_deviation() {
        let forest = build_forest(vec![
            Item::new(1, "Assembly"),
            Item {
                parent_item: Some(ItemId(1)),
                planned_start: Some(day("2024-03-01")),
                ..Item::new(2, "Not started yet")
            },
        ]);
        let signals = classifier().aggregate(&forest);
        assert_eq!(
            signals.get(&ItemId(1)),
            Some(&DescendantSignal::RiskOrDeviationDescendant)
        );
    }
}
