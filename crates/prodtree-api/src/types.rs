use serde::{Deserialize, Serialize};
use specta::Type;

/// What a cascading assignment sets on the node (and optionally its subtree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
pub enum AssignTarget {
    /// Responsible employee; `value` is a user id or empty to clear.
    Responsible,
    /// Contractor executor; `value` is the contractor id.
    Contractor,
    /// Back to the internal shop; `value` is ignored and the contractor cleared.
    InternalExecutor,
}

impl AssignTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignTarget::Responsible => "responsible",
            AssignTarget::Contractor => "contractor",
            AssignTarget::InternalExecutor => "internal_executor",
        }
    }
}
