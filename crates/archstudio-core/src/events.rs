//! Outbound contracts: structural change notifications for a persistence
//! collaborator, and the observational action hook.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::model::{Connection, ConnectionId, Element, ElementId, Group, GroupId};

/// Which entity collection a notification concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Element,
    Group,
    Connection,
}

/// A structural change, carrying the full record or the deleted id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ChangeEvent {
    ElementCreated(Element),
    ElementUpdated(Element),
    /// End of a drag gesture
    ElementMoved(Element),
    ElementDeleted(ElementId),
    GroupCreated(Group),
    GroupUpdated(Group),
    GroupMoved(Group),
    /// End of a resize gesture
    GroupResized(Group),
    GroupDeleted(GroupId),
    ConnectionCreated(Connection),
    ConnectionDeleted(ConnectionId),
}

impl ChangeEvent {
    pub fn entity(&self) -> EntityKind {
        match self {
            ChangeEvent::ElementCreated(_)
            | ChangeEvent::ElementUpdated(_)
            | ChangeEvent::ElementMoved(_)
            | ChangeEvent::ElementDeleted(_) => EntityKind::Element,
            ChangeEvent::GroupCreated(_)
            | ChangeEvent::GroupUpdated(_)
            | ChangeEvent::GroupMoved(_)
            | ChangeEvent::GroupResized(_)
            | ChangeEvent::GroupDeleted(_) => EntityKind::Group,
            ChangeEvent::ConnectionCreated(_) | ChangeEvent::ConnectionDeleted(_) => {
                EntityKind::Connection
            }
        }
    }

    /// Raw id of the affected entity
    pub fn id(&self) -> u64 {
        match self {
            ChangeEvent::ElementCreated(e)
            | ChangeEvent::ElementUpdated(e)
            | ChangeEvent::ElementMoved(e) => e.id.0,
            ChangeEvent::ElementDeleted(id) => id.0,
            ChangeEvent::GroupCreated(g)
            | ChangeEvent::GroupUpdated(g)
            | ChangeEvent::GroupMoved(g)
            | ChangeEvent::GroupResized(g) => g.id.0,
            ChangeEvent::GroupDeleted(id) => id.0,
            ChangeEvent::ConnectionCreated(c) => c.id.0,
            ChangeEvent::ConnectionDeleted(id) => id.0,
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            ChangeEvent::ElementDeleted(_)
                | ChangeEvent::GroupDeleted(_)
                | ChangeEvent::ConnectionDeleted(_)
        )
    }
}

/// Tags passed to the action hook after a mutation completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ElementAdded,
    ElementUpdated,
    ElementDeleted,
    ElementConnected,
    ElementMoved,
    GroupAdded,
    GroupUpdated,
    GroupMoved,
    GroupResized,
    GroupDeleted,
    ConnectionDeleted,
    LevelChanged,
    ZoomChanged,
}

impl ActionKind {
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::ElementAdded => "element-added",
            ActionKind::ElementUpdated => "element-updated",
            ActionKind::ElementDeleted => "element-deleted",
            ActionKind::ElementConnected => "element-connected",
            ActionKind::ElementMoved => "element-moved",
            ActionKind::GroupAdded => "group-added",
            ActionKind::GroupUpdated => "group-updated",
            ActionKind::GroupMoved => "group-moved",
            ActionKind::GroupResized => "group-resized",
            ActionKind::GroupDeleted => "group-deleted",
            ActionKind::ConnectionDeleted => "connection-deleted",
            ActionKind::LevelChanged => "level-changed",
            ActionKind::ZoomChanged => "zoom-changed",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Receives structural changes. Implementations must not block; the editor
/// never waits on the outcome.
pub trait ChangeSink: Send {
    fn publish(&mut self, event: ChangeEvent);
}

impl ChangeSink for mpsc::Sender<ChangeEvent> {
    fn publish(&mut self, event: ChangeEvent) {
        if let Err(err) = self.send(event) {
            tracing::warn!(entity = ?err.0.entity(), id = err.0.id(), "change sink disconnected, dropping event");
        }
    }
}

impl ChangeSink for Vec<ChangeEvent> {
    fn publish(&mut self, event: ChangeEvent) {
        self.push(event);
    }
}

/// Observes completed actions. Purely informational.
pub trait ActionHook {
    fn notify(&mut self, action: ActionKind);
}

impl<F: FnMut(ActionKind)> ActionHook for F {
    fn notify(&mut self, action: ActionKind) {
        self(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tags_match_serde_names() {
        for action in [
            ActionKind::ElementAdded,
            ActionKind::ElementConnected,
            ActionKind::LevelChanged,
            ActionKind::GroupResized,
        ] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.tag());
        }
    }

    #[test]
    fn disconnected_channel_does_not_panic() {
        let (mut tx, rx) = mpsc::channel();
        drop(rx);
        tx.publish(ChangeEvent::ElementDeleted(ElementId(1)));
    }

    #[test]
    fn event_reports_entity_and_id() {
        let event = ChangeEvent::GroupDeleted(GroupId(9));
        assert_eq!(event.entity(), EntityKind::Group);
        assert_eq!(event.id(), 9);
        assert!(event.is_deletion());
    }

    #[test]
    fn closures_are_action_hooks() {
        let mut seen = Vec::new();
        {
            let mut hook = |a: ActionKind| seen.push(a);
            hook.notify(ActionKind::ZoomChanged);
        }
        assert_eq!(seen, vec![ActionKind::ZoomChanged]);
    }
}
