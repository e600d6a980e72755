//! Persistence adapter: mirrors change notifications into a snapshot file.
//!
//! The editor publishes into an mpsc channel and never waits. A background
//! thread applies each event to its own copy of the diagram and rewrites the
//! file. Write failures are logged and reported back, never retried.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use archstudio_core::{
    ChangeEvent, Connection, ConnectionId, DiagramSnapshot, Element, ElementId, Group, GroupId,
};

use crate::file_io::save_snapshot;

/// Events from the persistence thread to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum PersistEvent {
    Saved { path: PathBuf },
    Error(String),
}

/// Collaborator-side copy of the diagram, rebuilt from notifications only
#[derive(Debug, Clone, Default)]
pub struct SnapshotMirror {
    elements: BTreeMap<ElementId, Element>,
    groups: BTreeMap<GroupId, Group>,
    connections: BTreeMap<ConnectionId, Connection>,
}

impl SnapshotMirror {
    pub fn new(snapshot: DiagramSnapshot) -> Self {
        Self {
            elements: snapshot.elements.into_iter().map(|e| (e.id, e)).collect(),
            groups: snapshot.groups.into_iter().map(|g| (g.id, g)).collect(),
            connections: snapshot.connections.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn apply(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::ElementCreated(e)
            | ChangeEvent::ElementUpdated(e)
            | ChangeEvent::ElementMoved(e) => {
                self.elements.insert(e.id, e);
            }
            ChangeEvent::ElementDeleted(id) => {
                self.elements.remove(&id);
            }
            ChangeEvent::GroupCreated(g)
            | ChangeEvent::GroupUpdated(g)
            | ChangeEvent::GroupMoved(g)
            | ChangeEvent::GroupResized(g) => {
                self.groups.insert(g.id, g);
            }
            ChangeEvent::GroupDeleted(id) => {
                self.groups.remove(&id);
            }
            ChangeEvent::ConnectionCreated(c) => {
                self.connections.insert(c.id, c);
            }
            ChangeEvent::ConnectionDeleted(id) => {
                self.connections.remove(&id);
            }
        }
    }

    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot {
            elements: self.elements.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }
}

/// Handle held by the UI thread
pub struct PersistHandle {
    event_rx: mpsc::Receiver<PersistEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PersistHandle {
    /// Non-blocking check for persistence results
    pub fn poll_event(&self) -> Option<PersistEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the thread to drain its queue. Only returns once every
    /// sender for the change channel has been dropped.
    pub fn join(mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if thread.join().is_err() {
            tracing::error!("persistence thread panicked");
        }
    }
}

/// Start the persistence thread. Returns the sender to hand to the editor.
pub fn start_persistence(
    path: PathBuf,
    initial: DiagramSnapshot,
) -> Result<(mpsc::Sender<ChangeEvent>, PersistHandle)> {
    let (change_tx, change_rx) = mpsc::channel::<ChangeEvent>();
    let (event_tx, event_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("archstudio-persist".into())
        .spawn(move || run_persistence(path, initial, change_rx, event_tx))
        .context("Failed to spawn persistence thread")?;

    Ok((
        change_tx,
        PersistHandle {
            event_rx,
            thread: Some(thread),
        },
    ))
}

fn run_persistence(
    path: PathBuf,
    initial: DiagramSnapshot,
    changes: mpsc::Receiver<ChangeEvent>,
    events: mpsc::Sender<PersistEvent>,
) {
    let mut mirror = SnapshotMirror::new(initial);
    tracing::debug!(path = %path.display(), "persistence thread started");

    while let Ok(first) = changes.recv() {
        mirror.apply(first);
        // Coalesce whatever else is already queued into one write
        for event in changes.try_iter() {
            mirror.apply(event);
        }

        let outcome = match save_snapshot(&path, &mirror.snapshot()) {
            Ok(()) => PersistEvent::Saved { path: path.clone() },
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist diagram");
                PersistEvent::Error(e.to_string())
            }
        };
        let _ = events.send(outcome);
    }

    tracing::debug!("persistence thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_io::load_snapshot;
    use archstudio_core::{ConnectionDetails, ConnectionKind, Diagram, ElementKind};
    use archstudio_geometry::Point;
    use archstudio_session::{Editor, EditorConfig};

    #[test]
    fn mirror_tracks_editor_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.json");
        let (tx, handle) = start_persistence(path.clone(), DiagramSnapshot::default()).unwrap();

        let mut editor = Editor::new(Diagram::new(), EditorConfig::default()).with_change_sink(tx);
        let a = editor.add_element(ElementKind::WebApp, "Web", Point::new(100.0, 100.0));
        let b = editor.add_element(ElementKind::Database, "DB", Point::new(400.0, 100.0));
        editor
            .complete_connection(
                archstudio_session::ConnectionRequest { from: a.id, to: b.id },
                ConnectionDetails::new("SQL", ConnectionKind::Data),
            )
            .unwrap();
        editor.delete_element(b.id).unwrap();
        let expected = editor.diagram().snapshot();
        drop(editor);
        handle.join();

        let saved = load_snapshot(&path).unwrap();
        assert_eq!(saved, expected);
        assert!(saved.connections.is_empty());
    }

    #[test]
    fn write_failure_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file
        let path = dir.path().to_path_buf();
        let (tx, handle) = start_persistence(path, DiagramSnapshot::default()).unwrap();

        let mut editor = Editor::new(Diagram::new(), EditorConfig::default()).with_change_sink(tx);
        editor.add_element(ElementKind::Queue, "Jobs", Point::ORIGIN);
        assert_eq!(editor.diagram().element_count(), 1);
        drop(editor);

        let event_rx = &handle.event_rx;
        let first = event_rx.recv().unwrap();
        assert!(matches!(first, PersistEvent::Error(_)));
        handle.join();
    }

    #[test]
    fn mirror_handles_group_deletion() {
        let mut diagram = Diagram::new();
        let group = diagram.add_group("G", "#fff", None, Point::ORIGIN, archstudio_geometry::Size::MIN_GROUP);
        let mut mirror = SnapshotMirror::new(diagram.snapshot());
        mirror.apply(ChangeEvent::GroupDeleted(group.id));
        assert!(mirror.snapshot().groups.is_empty());
    }
}
