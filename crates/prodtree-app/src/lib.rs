//! Application layer of the production structure views.
//!
//! [`StructureController`] owns the loaded items and display preferences and
//! routes edits through the [`CascadeCoordinator`] to an
//! [`prodtree_api::ItemBackend`]. Views render [`prodtree_structure::DisplayRows`]
//! and listen for [`prodtree_api::AppEventPayload`]s.

pub mod backend;
pub mod cascade;
pub mod controller;
pub mod field;
pub mod preferences;
pub mod validation;

pub use backend::StorageBackend;
pub use cascade::{
    CascadeCoordinator, EditOutcome, EditTarget, MutationFailure, MutationReport, ScopePrompt,
};
pub use controller::{EditorSpec, ItemDetail, StructureController};
pub use field::{
    CascadeAction, FieldKind, ReferenceKind, applies_to, assign_request, cascade_action,
    field_kind,
};
pub use preferences::{
    DisplayPreferences, JsonFilePreferences, MemoryPreferences, PREFERENCES_KEY,
    PreferencesError, PreferencesStore, SqlitePreferences,
};
pub use validation::{CheckedEdit, ValidationError, ValidationWarning, check_edit};
