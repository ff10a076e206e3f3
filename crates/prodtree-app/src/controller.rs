use crate::cascade::{CascadeCoordinator, EditOutcome, EditTarget, MutationFailure};
use crate::field::{CascadeAction, FieldKind, cascade_action, field_kind};
use crate::preferences::{DisplayPreferences, PreferencesStore};
use chrono::NaiveDate;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use prodtree_api::{
    self as api, ApiError, AppEventPayload, HistoryEntryDto, ItemBackend, ItemHistoryRequest,
    ListItemsRequest,
};
use prodtree_core::{Item, ItemField, ItemId, ProjectId};
use prodtree_events::{CascadeScope, Event, EventListener, ViewMode, ZoomLevel};
use prodtree_structure::{
    Classification, DescendantSignal, DisplayRows, ExpansionState, RowBuildOptions,
    SeverityClassifier, TreeNode, build_display_rows, build_forest, find_node,
};
use serde::Serialize;
use std::sync::Arc;
use std::thread::JoinHandle;

/// What a view needs to open an editor for one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorSpec {
    pub item_id: ItemId,
    pub field: ItemField,
    pub kind: FieldKind,
    pub current: Option<String>,
    /// The commit will ask for a scope first.
    pub asks_scope: bool,
    pub descendant_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail {
    pub item: Item,
    pub classification: Classification,
    pub descendant_signal: DescendantSignal,
    pub history: Vec<HistoryEntryDto>,
}

struct ViewState {
    items: Vec<Item>,
    forest: Vec<TreeNode>,
    expansion: ExpansionState,
    preferences: DisplayPreferences,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Headless controller of the structure table and schedule views of one project.
///
/// Holds the loaded items, the derived forest and the display preferences.
/// Any shell (CLI, desktop) calls the `on_*` methods or feeds [`Event`]s and
/// subscribes to [`AppEventPayload`]s.
#[derive(Clone)]
pub struct StructureController {
    project: ProjectId,
    backend: Arc<dyn ItemBackend>,
    preferences_store: Arc<dyn PreferencesStore>,
    coordinator: Arc<CascadeCoordinator>,
    state: Arc<Mutex<ViewState>>,
    events_tx: Sender<AppEventPayload>,
    events_rx: Receiver<AppEventPayload>,
}

impl StructureController {
    /// Reads the stored preferences once; unreadable preferences fall back to defaults.
    pub fn new(
        project: ProjectId,
        backend: Arc<dyn ItemBackend>,
        preferences_store: Arc<dyn PreferencesStore>,
    ) -> Self {
        let preferences = match preferences_store.load() {
            Ok(Some(preferences)) => preferences,
            Ok(None) => DisplayPreferences::default(),
            Err(e) => {
                tracing::error!("Failed to load display preferences: {}", e);
                DisplayPreferences::default()
            }
        };
        let expansion = ExpansionState::from_ids(preferences.expanded.iter().copied());
        let (events_tx, events_rx) = unbounded();
        Self {
            project,
            coordinator: Arc::new(CascadeCoordinator::new(backend.clone())),
            backend,
            preferences_store,
            state: Arc::new(Mutex::new(ViewState {
                items: Vec::new(),
                forest: Vec::new(),
                expansion,
                preferences,
            })),
            events_tx,
            events_rx,
        }
    }

    pub fn events(&self) -> Receiver<AppEventPayload> {
        self.events_rx.clone()
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn coordinator(&self) -> &CascadeCoordinator {
        &self.coordinator
    }

    fn emit(&self, event: AppEventPayload) {
        let _ = self.events_tx.send(event);
    }

    fn save_preferences(&self, state: &mut ViewState) {
        state.preferences.expanded = state.expansion.ids();
        if let Err(e) = self.preferences_store.save(&state.preferences) {
            tracing::error!("Failed to save display preferences: {}", e);
        }
    }

    /// Applies `change` to the view state and persists the preferences.
    fn update_view<R>(&self, change: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut state = self.state.lock();
        let result = change(&mut state);
        self.save_preferences(&mut state);
        result
    }

    /// Refetches the project items and rebuilds the forest.
    pub fn refresh(&self) -> Result<usize, ApiError> {
        let items = self.backend.list_items(&ListItemsRequest {
            project_id: api::ProjectId::from(self.project),
        })?;
        let forest = build_forest(items.iter().cloned());

        let mut state = self.state.lock();
        let changed = state.expansion.reconcile(&forest);
        state.items = items;
        state.forest = forest;
        if changed {
            self.save_preferences(&mut state);
        }
        tracing::debug!("Loaded {} item(s) for project {}", state.items.len(), self.project);
        Ok(state.items.len())
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.lock().items.clone()
    }

    pub fn forest(&self) -> Vec<TreeNode> {
        self.state.lock().forest.clone()
    }

    pub fn preferences(&self) -> DisplayPreferences {
        self.state.lock().preferences.clone()
    }

    pub fn expanded_ids(&self) -> Vec<ItemId> {
        self.state.lock().expansion.ids()
    }

    pub fn build_display_rows(&self, today: NaiveDate) -> DisplayRows {
        let state = self.state.lock();
        build_display_rows(
            &state.forest,
            &state.expansion,
            RowBuildOptions {
                today,
                zoom: state.preferences.zoom,
            },
        )
    }

    pub fn on_toggle_expand(&self, id: ItemId) -> bool {
        self.update_view(|state| state.expansion.toggle(id))
    }

    pub fn expand_all(&self) {
        self.update_view(|state| state.expansion.expand_all(&state.forest));
    }

    pub fn collapse_all(&self) {
        self.update_view(|state| state.expansion.collapse_all());
    }

    pub fn expand_to_level(&self, level: u32) {
        self.update_view(|state| state.expansion.expand_to_level(&state.forest, level));
    }

    pub fn set_zoom(&self, zoom: ZoomLevel) {
        self.update_view(|state| state.preferences.zoom = zoom);
    }

    pub fn zoom_in(&self) -> ZoomLevel {
        self.update_view(|state| {
            state.preferences.zoom = state.preferences.zoom.zoom_in();
            state.preferences.zoom
        })
    }

    pub fn zoom_out(&self) -> ZoomLevel {
        self.update_view(|state| {
            state.preferences.zoom = state.preferences.zoom.zoom_out();
            state.preferences.zoom
        })
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.update_view(|state| state.preferences.view_mode = mode);
    }

    pub fn set_show_today(&self, show: bool) {
        self.update_view(|state| state.preferences.show_today = show);
    }

    fn lookup(&self, id: ItemId) -> Result<(Item, Option<Item>), ApiError> {
        let state = self.state.lock();
        let item = state
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("Item {id} is not loaded")))?;
        let parent = item
            .parent_item
            .and_then(|parent| state.items.iter().find(|candidate| candidate.id == parent))
            .cloned();
        Ok((item, parent))
    }

    pub fn on_request_edit(&self, id: ItemId, field: ItemField) -> Result<EditorSpec, ApiError> {
        let (item, _) = self.lookup(id)?;
        let asks_scope = cascade_action(field) != CascadeAction::None && item.children_count > 0;
        Ok(EditorSpec {
            item_id: id,
            field,
            kind: field_kind(field),
            current: item.field_value(field),
            asks_scope,
            descendant_count: item.children_count,
        })
    }

    /// Validates and submits an edit; blocks until the backend answers.
    ///
    /// On success the item list is refetched and dependent views are
    /// invalidated. A backend failure is reported as an event and the local
    /// state is left as it was.
    pub fn on_commit_edit(
        &self,
        id: ItemId,
        field: ItemField,
        value: Option<&str>,
    ) -> Result<EditOutcome, ApiError> {
        let (item, parent) = self.lookup(id)?;
        let result = self.coordinator.apply_edit(
            EditTarget {
                item: &item,
                parent: parent.as_ref(),
                descendant_count: item.children_count,
            },
            field,
            value,
        );
        self.report(id, field, result)
    }

    /// [`Self::on_commit_edit`] on a worker thread; the result arrives as events.
    pub fn spawn_commit_edit(
        &self,
        id: ItemId,
        field: ItemField,
        value: Option<String>,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        std::thread::spawn(move || {
            let _ = controller.on_commit_edit(id, field, value.as_deref());
        })
    }

    pub fn on_confirm_scope(&self, token: &str, scope: CascadeScope) -> Result<EditOutcome, ApiError> {
        let (id, field) = self
            .coordinator
            .pending_target(token)
            .ok_or_else(|| ApiError::not_found(format!("No pending edit for token {token}")))?;
        let result = self.coordinator.confirm_scope(token, scope);
        self.report(id, field, result)
    }

    pub fn spawn_confirm_scope(&self, token: String, scope: CascadeScope) -> JoinHandle<()> {
        let controller = self.clone();
        std::thread::spawn(move || {
            if let Err(e) = controller.on_confirm_scope(&token, scope) {
                controller.emit(AppEventPayload::StatusUpdate {
                    message: e.message,
                });
            }
        })
    }

    pub fn on_cancel_edit(&self, token: &str) -> bool {
        self.coordinator.cancel(token)
    }

    fn report(
        &self,
        id: ItemId,
        field: ItemField,
        result: Result<EditOutcome, MutationFailure>,
    ) -> Result<EditOutcome, ApiError> {
        let item_id = api::ItemId::from(id);
        match &result {
            Ok(EditOutcome::Applied(report)) => {
                for warning in &report.warnings {
                    self.emit(AppEventPayload::ValidationWarning {
                        item_id: item_id.clone(),
                        field: field.to_string(),
                        message: warning.message(),
                    });
                }
                self.emit(AppEventPayload::MutationSucceeded {
                    request_id: report.request_id.clone(),
                    item_id: item_id.clone(),
                    field: field.to_string(),
                    updated_count: report.updated_count,
                    message: report.message.clone(),
                });
                self.invalidate();
            }
            Ok(EditOutcome::NeedsScope(prompt)) => {
                self.emit(AppEventPayload::ScopeRequired {
                    token: prompt.token.clone(),
                    item_id,
                    field: field.to_string(),
                    descendant_count: prompt.descendant_count,
                });
            }
            Ok(EditOutcome::Rejected(err)) => {
                self.emit(AppEventPayload::ValidationFailed {
                    item_id,
                    field: field.to_string(),
                    message: err.to_string(),
                });
            }
            Ok(EditOutcome::Busy) => {
                self.emit(AppEventPayload::MutationFailed {
                    request_id: None,
                    item_id,
                    field: field.to_string(),
                    error: ApiError::conflict(format!(
                        "{field} of item {id} is still being saved"
                    )),
                });
            }
            Err(failure) => {
                tracing::error!(
                    request_id = ?failure.request_id,
                    "Saving {} on item {} failed: {}",
                    field,
                    id,
                    failure.error
                );
                self.emit(AppEventPayload::MutationFailed {
                    request_id: failure.request_id.clone(),
                    item_id,
                    field: field.to_string(),
                    error: failure.error.clone(),
                });
            }
        }
        result.map_err(|failure| failure.error)
    }

    fn invalidate(&self) {
        let project_id = api::ProjectId::from(self.project);
        if let Err(e) = self.refresh() {
            tracing::error!("Refetch after mutation failed: {}", e);
            self.emit(AppEventPayload::StatusUpdate {
                message: format!("Could not reload items: {}", e.message),
            });
        }
        self.emit(AppEventPayload::ItemsInvalidated {
            project_id: project_id.clone(),
        });
        self.emit(AppEventPayload::ProjectViewsInvalidated { project_id });
    }

    pub fn on_open_detail(&self, id: ItemId, today: NaiveDate) -> Result<ItemDetail, ApiError> {
        let (item, _) = self.lookup(id)?;
        let classifier = SeverityClassifier::new(today);
        let descendant_signal = {
            let state = self.state.lock();
            find_node(&state.forest, id)
                .map(|node| {
                    classifier
                        .aggregate(std::slice::from_ref(node))
                        .get(&id)
                        .copied()
                        .unwrap_or(DescendantSignal::Clean)
                })
                .unwrap_or(DescendantSignal::Clean)
        };
        let history = self.backend.item_history(&ItemHistoryRequest {
            item_id: api::ItemId::from(id),
        })?;
        Ok(ItemDetail {
            classification: classifier.classify(&item),
            item,
            descendant_signal,
            history,
        })
    }
}

impl EventListener for StructureController {
    fn handle_event(&mut self, event: &Event) {
        match event {
            Event::ToggleExpand { id } => {
                self.on_toggle_expand(*id);
            }
            Event::ExpandAll => self.expand_all(),
            Event::CollapseAll => self.collapse_all(),
            Event::ExpandToLevel(level) => self.expand_to_level(*level),
            Event::RequestEdit { id, field } => {
                if let Err(e) = self.on_request_edit(*id, *field) {
                    self.emit(AppEventPayload::StatusUpdate { message: e.message });
                }
            }
            Event::CommitEdit { id, field, value } => {
                let value = Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string);
                self.spawn_commit_edit(*id, *field, value);
            }
            Event::ConfirmScope { token, scope } => {
                self.spawn_confirm_scope(token.clone(), *scope);
            }
            Event::CancelEdit { token } => {
                self.on_cancel_edit(token);
            }
            Event::OpenDetail { id } => match self.on_open_detail(*id, today()) {
                Ok(detail) => self.emit(AppEventPayload::StatusUpdate {
                    message: format!(
                        "{}: {} ({} history entries)",
                        detail.item.name,
                        detail.classification.severity.as_str(),
                        detail.history.len()
                    ),
                }),
                Err(e) => self.emit(AppEventPayload::StatusUpdate { message: e.message }),
            },
            Event::SetZoom(zoom) => self.set_zoom(*zoom),
            Event::ZoomIn => {
                self.zoom_in();
            }
            Event::ZoomOut => {
                self.zoom_out();
            }
            Event::SetViewMode(mode) => self.set_view_mode(*mode),
            Event::RefreshItems { project } if *project == self.project => {
                if let Err(e) = self.refresh() {
                    self.emit(AppEventPayload::StatusUpdate { message: e.message });
                }
            }
            Event::RefreshItems { .. } => {}
            Event::ShowInfo { message }
            | Event::ShowWarning { message }
            | Event::ShowError { message } => self.emit(AppEventPayload::StatusUpdate {
                message: message.clone(),
            }),
        }
    }
}
