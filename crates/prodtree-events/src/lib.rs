use crossbeam_channel::{unbounded, Receiver, Sender};
use prodtree_core::{ItemField, ItemId, ProjectId};
use serde::{Deserialize, Serialize};

/// Time-axis zoom tier of the schedule view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    /// Month labels only.
    #[default]
    Months,
    /// Month labels plus markers on the 1st, 10th, 20th and last day.
    Weeks,
    /// Month labels plus one marker per day.
    Days,
}

impl ZoomLevel {
    pub fn zoom_in(self) -> Self {
        match self {
            ZoomLevel::Months => ZoomLevel::Weeks,
            ZoomLevel::Weeks | ZoomLevel::Days => ZoomLevel::Days,
        }
    }

    pub fn zoom_out(self) -> Self {
        match self {
            ZoomLevel::Days => ZoomLevel::Weeks,
            ZoomLevel::Weeks | ZoomLevel::Months => ZoomLevel::Months,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Gantt,
    Split,
}

/// Scope chosen by the user when an edit could cascade to descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeScope {
    NodeOnly,
    WithDescendants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Structure table
    ToggleExpand {
        id: ItemId,
    },
    ExpandAll,
    CollapseAll,
    /// Expand every node shallower than `level`.
    ExpandToLevel(u32),

    // Editing
    RequestEdit {
        id: ItemId,
        field: ItemField,
    },
    CommitEdit {
        id: ItemId,
        field: ItemField,
        value: String,
    },
    ConfirmScope {
        token: String,
        scope: CascadeScope,
    },
    /// Closing the confirmation without choosing a scope.
    CancelEdit {
        token: String,
    },
    OpenDetail {
        id: ItemId,
    },

    // Schedule view
    SetZoom(ZoomLevel),
    ZoomIn,
    ZoomOut,
    SetViewMode(ViewMode),

    // Data
    RefreshItems {
        project: ProjectId,
    },

    // Notifications
    ShowInfo {
        message: String,
    },
    ShowWarning {
        message: String,
    },
    ShowError {
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Event bus closed; dropping event");
        }
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for processing events in the UI loop.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
            handled += 1;
        }
        handled
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender.send(Event::ToggleExpand { id: ItemId(12) }).unwrap();

        match receiver.recv().unwrap() {
            Event::ToggleExpand { id } => assert_eq!(id, ItemId(12)),
            _ => panic!("Expected ToggleExpand event"),
        }
    }

    #[test]
    fn test_dispatch_drains_in_order() {
        struct Recorder(Vec<String>);
        impl EventListener for Recorder {
            fn handle_event(&mut self, event: &Event) {
                self.0.push(format!("{event:?}"));
            }
        }

        let bus = EventBus::new();
        bus.publish(Event::ExpandAll);
        bus.publish(Event::ExpandToLevel(2));
        bus.publish(Event::CollapseAll);

        let mut recorder = Recorder(Vec::new());
        assert_eq!(bus.dispatch_to(&mut recorder), 3);
        assert_eq!(recorder.0, vec!["ExpandAll", "ExpandToLevel(2)", "CollapseAll"]);
        assert_eq!(bus.dispatch_to(&mut recorder), 0);
    }

    #[test]
    fn test_preference_enums_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&ZoomLevel::Weeks).unwrap(), "\"weeks\"");
        assert_eq!(serde_json::to_string(&ViewMode::Split).unwrap(), "\"split\"");
        let scope: CascadeScope = serde_json::from_str("\"with_descendants\"").unwrap();
        assert_eq!(scope, CascadeScope::WithDescendants);
    }

    #[test]
    fn test_zoom_steps_saturate() {
        assert_eq!(ZoomLevel::Days.zoom_in(), ZoomLevel::Days);
        assert_eq!(ZoomLevel::Months.zoom_out(), ZoomLevel::Months);
        assert_eq!(ZoomLevel::Months.zoom_in().zoom_in(), ZoomLevel::Days);
    }
}
