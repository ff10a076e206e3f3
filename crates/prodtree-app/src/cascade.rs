//! Edit routing: validation, scope confirmation and the per-field in-flight
//! guard in front of the backend.
//!
//! A cascading field on a node with descendants is parked until the user
//! picks a [`CascadeScope`]; everything else goes straight to the backend.
//! While a mutation for `(item, field)` is running, a second one for the same
//! pair is refused. Mutations never patch local state; callers refetch.

use crate::field::{CascadeAction, assign_request, cascade_action};
use crate::validation::{ValidationError, ValidationWarning, check_edit};
use parking_lot::Mutex;
use prodtree_api::{
    self as api, ApiError, AssignTarget, CascadeAssignRequest, ItemBackend, RescheduleRequest,
    UpdateItemRequest,
};
use prodtree_core::{Item, ItemField, ItemId};
use prodtree_events::CascadeScope;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// What the caller knows about the node being edited.
#[derive(Debug, Clone, Copy)]
pub struct EditTarget<'a> {
    pub item: &'a Item,
    pub parent: Option<&'a Item>,
    /// Descendants the edit would reach with [`CascadeScope::WithDescendants`].
    pub descendant_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopePrompt {
    pub token: String,
    pub item_id: ItemId,
    pub field: ItemField,
    pub descendant_count: u32,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationReport {
    pub request_id: String,
    pub item_id: ItemId,
    pub field: ItemField,
    /// Items changed, the edited node included.
    pub updated_count: u32,
    pub message: String,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied(MutationReport),
    NeedsScope(ScopePrompt),
    Rejected(ValidationError),
    /// The same field of the same node is already being saved.
    Busy,
}

/// Backend failure, tagged with the request it belongs to once one was issued.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct MutationFailure {
    pub request_id: Option<String>,
    pub error: ApiError,
}

impl From<ApiError> for MutationFailure {
    fn from(error: ApiError) -> Self {
        Self {
            request_id: None,
            error,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEdit {
    item_id: ItemId,
    field: ItemField,
    value: Option<String>,
    /// Resolved against the item as loaded when the edit was checked.
    assignment: Option<(AssignTarget, Option<String>)>,
    warnings: Vec<ValidationWarning>,
}

/// Guard entry removed on drop, so a failed or panicking call never leaves
/// the field locked.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<(ItemId, ItemField)>>,
    key: (ItemId, ItemField),
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}

pub struct CascadeCoordinator {
    backend: Arc<dyn ItemBackend>,
    in_flight: Mutex<HashSet<(ItemId, ItemField)>>,
    pending: Mutex<HashMap<String, PendingEdit>>,
}

impl CascadeCoordinator {
    pub fn new(backend: Arc<dyn ItemBackend>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashSet::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_in_flight(&self, item_id: ItemId, field: ItemField) -> bool {
        self.in_flight.lock().contains(&(item_id, field))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Validates and either applies the edit, or parks it for a scope decision.
    ///
    /// Validation failures come back as [`EditOutcome::Rejected`] without any
    /// backend call; backend failures as `Err`.
    pub fn apply_edit(
        &self,
        target: EditTarget<'_>,
        field: ItemField,
        raw: Option<&str>,
    ) -> Result<EditOutcome, MutationFailure> {
        let item_id = target.item.id;
        let checked = match check_edit(target.item, target.parent, field, raw) {
            Ok(checked) => checked,
            Err(err) => {
                tracing::debug!("Edit of {} on item {} rejected: {}", field, item_id, err);
                return Ok(EditOutcome::Rejected(err));
            }
        };

        let action = cascade_action(field);
        let assignment = assign_request(field, target.item, checked.value.as_deref());
        if action == CascadeAction::Assign && assignment.is_none() {
            return Err(ApiError::internal(format!("{field} has no assignment target")).into());
        }

        if action != CascadeAction::None && target.descendant_count > 0 {
            let token = uuid::Uuid::new_v4().to_string();
            self.pending.lock().insert(
                token.clone(),
                PendingEdit {
                    item_id,
                    field,
                    value: checked.value,
                    assignment,
                    warnings: checked.warnings.clone(),
                },
            );
            return Ok(EditOutcome::NeedsScope(ScopePrompt {
                token,
                item_id,
                field,
                descendant_count: target.descendant_count,
                warnings: checked.warnings,
            }));
        }

        self.execute(
            PendingEdit {
                item_id,
                field,
                value: checked.value,
                assignment,
                warnings: checked.warnings,
            },
            CascadeScope::NodeOnly,
        )
    }

    /// Runs the edit parked under `token` with the chosen scope.
    pub fn confirm_scope(
        &self,
        token: &str,
        scope: CascadeScope,
    ) -> Result<EditOutcome, MutationFailure> {
        let edit = self
            .pending
            .lock()
            .remove(token)
            .ok_or_else(|| ApiError::not_found(format!("No pending edit for token {token}")))?;
        self.execute(edit, scope)
    }

    /// Node and field of the edit parked under `token`.
    pub fn pending_target(&self, token: &str) -> Option<(ItemId, ItemField)> {
        self.pending
            .lock()
            .get(token)
            .map(|edit| (edit.item_id, edit.field))
    }

    /// Drops a parked edit. Returns false for unknown tokens.
    pub fn cancel(&self, token: &str) -> bool {
        let removed = self.pending.lock().remove(token).is_some();
        if removed {
            tracing::debug!("Pending edit {} cancelled", token);
        }
        removed
    }

    fn acquire(&self, key: (ItemId, ItemField)) -> Option<InFlight<'_>> {
        let mut set = self.in_flight.lock();
        if !set.insert(key) {
            return None;
        }
        Some(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    fn execute(
        &self,
        edit: PendingEdit,
        scope: CascadeScope,
    ) -> Result<EditOutcome, MutationFailure> {
        let Some(_guard) = self.acquire((edit.item_id, edit.field)) else {
            tracing::warn!(
                "Edit of {} on item {} already in flight; refusing",
                edit.field,
                edit.item_id
            );
            return Ok(EditOutcome::Busy);
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        let api_item = api::ItemId::from(edit.item_id);
        let cascade = scope == CascadeScope::WithDescendants;
        tracing::info!(
            request_id = %request_id,
            "Saving {} on item {} (scope: {:?})",
            edit.field,
            edit.item_id,
            scope
        );

        let failed = |error: ApiError| MutationFailure {
            request_id: Some(request_id.clone()),
            error,
        };
        let (updated_count, message) = match (cascade_action(edit.field), edit.assignment) {
            (CascadeAction::Assign, Some((target, value))) => {
                let response = self
                    .backend
                    .assign_with_cascade(&CascadeAssignRequest {
                        item_id: api_item,
                        target,
                        value,
                        cascade,
                        request_id: Some(request_id.clone()),
                    })
                    .map_err(failed)?;
                (
                    response.updated_count,
                    format!("{} updated on {} item(s)", edit.field, response.updated_count),
                )
            }
            (CascadeAction::Assign, None) => {
                return Err(failed(ApiError::internal(format!(
                    "{} has no assignment target",
                    edit.field
                ))));
            }
            (CascadeAction::RecomputeDates, _) if cascade => {
                let response = self
                    .backend
                    .reschedule_with_descendants(&RescheduleRequest {
                        item_id: api_item,
                        planned_start: edit.value.clone(),
                        request_id: Some(request_id.clone()),
                    })
                    .map_err(failed)?;
                (response.updated_count, response.message)
            }
            (CascadeAction::RecomputeDates | CascadeAction::None, _) => {
                self.backend
                    .update_item(&UpdateItemRequest {
                        item_id: api_item,
                        field: edit.field.as_str().to_string(),
                        value: edit.value.clone(),
                        request_id: Some(request_id.clone()),
                    })
                    .map_err(failed)?;
                (1, format!("{} updated", edit.field))
            }
        };

        Ok(EditOutcome::Applied(MutationReport {
            request_id,
            item_id: edit.item_id,
            field: edit.field,
            updated_count,
            message,
            warnings: edit.warnings,
        }))
    }
}
