//! The in-memory diagram graph.
//!
//! Every mutation goes through [`Diagram`] so the referential invariants hold:
//! connection endpoints always resolve, and `group_id` never dangles.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use archstudio_geometry::{clamp_non_negative, Point, Rect, Size};

use crate::error::{DiagramError, Result};
use crate::model::{
    Connection, ConnectionDetails, ConnectionId, DiagramSnapshot, Element, ElementId, ElementKind,
    ElementPatch, Group, GroupId, GroupPatch, Layer,
};

/// Hands out integer ids that are unique for the lifetime of a diagram.
///
/// The timestamp flavor returns the current time in milliseconds, bumped past
/// the last id it issued so two creations in the same millisecond still differ.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    last: u64,
    clock: bool,
}

impl IdGenerator {
    pub fn timestamp() -> Self {
        Self {
            last: 0,
            clock: true,
        }
    }

    /// Counter starting at 1, for deterministic ids
    pub fn sequential() -> Self {
        Self {
            last: 0,
            clock: false,
        }
    }

    pub fn next_id(&mut self) -> u64 {
        let candidate = if self.clock { now_millis() } else { 0 };
        self.last = candidate.max(self.last + 1);
        self.last
    }

    /// Make sure future ids never collide with one loaded from elsewhere
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::timestamp()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What a successful element deletion took with it
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedElement {
    pub element: Element,
    /// Connections removed because they referenced the element
    pub connections: Vec<Connection>,
}

/// What a successful group deletion changed
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedGroup {
    pub group: Group,
    /// Former members, with `group_id` already cleared
    pub unlinked: Vec<Element>,
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    elements: BTreeMap<ElementId, Element>,
    groups: BTreeMap<GroupId, Group>,
    connections: BTreeMap<ConnectionId, Connection>,
    ids: IdGenerator,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_generator(ids: IdGenerator) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// Build a diagram from plain data, repairing anything that would break
    /// the invariants instead of rejecting the whole input. When an id repeats,
    /// the first entry is kept.
    pub fn from_snapshot(snapshot: DiagramSnapshot) -> Self {
        Self::from_snapshot_with(snapshot, IdGenerator::timestamp())
    }

    pub fn from_snapshot_with(snapshot: DiagramSnapshot, ids: IdGenerator) -> Self {
        let mut diagram = Self::with_id_generator(ids);

        for mut group in snapshot.groups {
            diagram.ids.observe(group.id.0);
            if diagram.groups.contains_key(&group.id) {
                tracing::warn!(group = %group.id, "skipped group with duplicate id");
                continue;
            }
            let pos = clamp_non_negative(group.position());
            let size = group.size().at_least(Size::MIN_GROUP);
            if pos != group.position() || size != group.size() {
                tracing::warn!(group = %group.id, "clamped group geometry on load");
            }
            group.set_rect(Rect::from_parts(pos, size));
            diagram.groups.insert(group.id, group);
        }

        for mut element in snapshot.elements {
            diagram.ids.observe(element.id.0);
            if diagram.elements.contains_key(&element.id) {
                tracing::warn!(element = %element.id, "skipped element with duplicate id");
                continue;
            }
            if let Some(gid) = element
                .group_id
                .filter(|gid| !diagram.groups.contains_key(gid))
            {
                tracing::warn!(element = %element.id, group = %gid, "cleared dangling group reference");
                element.group_id = None;
            }
            let pos = clamp_non_negative(element.position());
            element.x = pos.x;
            element.y = pos.y;
            diagram.elements.insert(element.id, element);
        }

        for connection in snapshot.connections {
            diagram.ids.observe(connection.id.0);
            if diagram.connections.contains_key(&connection.id) {
                tracing::warn!(connection = %connection.id, "skipped connection with duplicate id");
                continue;
            }
            if !diagram.elements.contains_key(&connection.from)
                || !diagram.elements.contains_key(&connection.to)
            {
                tracing::warn!(connection = %connection.id, "dropped connection with dangling endpoint");
                continue;
            }
            diagram.connections.insert(connection.id, connection);
        }

        diagram
    }

    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot {
            elements: self.elements.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }

    // ---- queries ----

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.values()
    }

    pub fn groups(&self) -> impl DoubleEndedIterator<Item = &Group> {
        self.groups.values()
    }

    pub fn connections(&self) -> impl DoubleEndedIterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.groups.is_empty() && self.connections.is_empty()
    }

    /// Connections that start or end at `id`
    pub fn connections_of(&self, id: ElementId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.touches(id))
    }

    /// Elements whose `group_id` is `id`
    pub fn members_of(&self, id: GroupId) -> impl Iterator<Item = &Element> {
        self.elements
            .values()
            .filter(move |e| e.group_id == Some(id))
    }

    // ---- elements ----

    pub fn add_element(&mut self, kind: ElementKind, name: impl Into<String>, position: Point) -> Element {
        let id = ElementId(self.ids.next_id());
        let pos = clamp_non_negative(position);
        let element = Element {
            id,
            kind,
            name: name.into(),
            x: pos.x,
            y: pos.y,
            description: None,
            tech_stack: None,
            team: None,
            repository: None,
            port: None,
            cpu: None,
            memory: None,
            layer: Some(Layer::default()),
            group_id: None,
        };
        tracing::debug!(element = %id, kind = ?kind, "added element");
        self.elements.insert(id, element.clone());
        element
    }

    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> Result<Element> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(DiagramError::ElementNotFound(id))?;
        patch.apply(element);
        tracing::debug!(element = %id, "updated element");
        Ok(element.clone())
    }

    /// Reposition an element; negative coordinates are clamped to zero
    pub fn move_element(&mut self, id: ElementId, position: Point) -> Result<Element> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(DiagramError::ElementNotFound(id))?;
        let pos = clamp_non_negative(position);
        element.x = pos.x;
        element.y = pos.y;
        Ok(element.clone())
    }

    /// Remove an element and every connection touching it
    pub fn delete_element(&mut self, id: ElementId) -> Result<RemovedElement> {
        let element = self
            .elements
            .remove(&id)
            .ok_or(DiagramError::ElementNotFound(id))?;
        let doomed: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.touches(id))
            .map(|c| c.id)
            .collect();
        let connections: Vec<Connection> = doomed
            .into_iter()
            .filter_map(|cid| self.connections.remove(&cid))
            .collect();
        tracing::debug!(element = %id, cascaded = connections.len(), "deleted element");
        Ok(RemovedElement {
            element,
            connections,
        })
    }

    /// Set or clear an element's group. An unknown group is rejected and the
    /// element keeps its current membership.
    pub fn assign_element_to_group(
        &mut self,
        element_id: ElementId,
        group_id: Option<GroupId>,
    ) -> Result<Element> {
        if let Some(gid) = group_id.filter(|gid| !self.groups.contains_key(gid)) {
            tracing::warn!(element = %element_id, group = %gid, "rejected assignment to unknown group");
            return Err(DiagramError::GroupNotFound(gid));
        }
        let element = self
            .elements
            .get_mut(&element_id)
            .ok_or(DiagramError::ElementNotFound(element_id))?;
        element.group_id = group_id;
        Ok(element.clone())
    }

    // ---- groups ----

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        layer: Option<Layer>,
        position: Point,
        size: Size,
    ) -> Group {
        let id = GroupId(self.ids.next_id());
        let pos = clamp_non_negative(position);
        let size = size.at_least(Size::MIN_GROUP);
        let group = Group {
            id,
            name: name.into(),
            color: color.into(),
            description: None,
            x: pos.x,
            y: pos.y,
            width: size.width,
            height: size.height,
            layer,
        };
        tracing::debug!(group = %id, "added group");
        self.groups.insert(id, group.clone());
        group
    }

    pub fn update_group(&mut self, id: GroupId, patch: GroupPatch) -> Result<Group> {
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(DiagramError::GroupNotFound(id))?;
        patch.apply(group);
        tracing::debug!(group = %id, "updated group");
        Ok(group.clone())
    }

    /// Reposition a group. Members stay where they are.
    pub fn move_group(&mut self, id: GroupId, position: Point) -> Result<Group> {
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(DiagramError::GroupNotFound(id))?;
        let pos = clamp_non_negative(position);
        group.x = pos.x;
        group.y = pos.y;
        Ok(group.clone())
    }

    /// Replace a group's rectangle, clamping position and size floors
    pub fn set_group_bounds(&mut self, id: GroupId, bounds: Rect) -> Result<Group> {
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(DiagramError::GroupNotFound(id))?;
        let pos = clamp_non_negative(bounds.origin());
        let size = bounds.size().at_least(Size::MIN_GROUP);
        group.set_rect(Rect::from_parts(pos, size));
        Ok(group.clone())
    }

    /// Remove a group and clear `group_id` on its members
    pub fn delete_group(&mut self, id: GroupId) -> Result<RemovedGroup> {
        let group = self
            .groups
            .remove(&id)
            .ok_or(DiagramError::GroupNotFound(id))?;
        let mut unlinked = Vec::new();
        for element in self.elements.values_mut() {
            if element.group_id == Some(id) {
                element.group_id = None;
                unlinked.push(element.clone());
            }
        }
        tracing::debug!(group = %id, unlinked = unlinked.len(), "deleted group");
        Ok(RemovedGroup { group, unlinked })
    }

    // ---- connections ----

    /// Add a directed connection. Both endpoints must exist; self-loops and
    /// parallel connections are allowed.
    pub fn add_connection(
        &mut self,
        from: ElementId,
        to: ElementId,
        details: ConnectionDetails,
    ) -> Result<Connection> {
        for endpoint in [from, to] {
            if !self.elements.contains_key(&endpoint) {
                tracing::warn!(from = %from, to = %to, "rejected connection with dangling endpoint");
                return Err(DiagramError::DanglingEndpoint(endpoint));
            }
        }
        let id = ConnectionId(self.ids.next_id());
        let connection = Connection {
            id,
            from,
            to,
            protocol: details.protocol,
            kind: details.kind,
            description: details.description,
        };
        tracing::debug!(connection = %id, from = %from, to = %to, "added connection");
        self.connections.insert(id, connection.clone());
        Ok(connection)
    }

    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<Connection> {
        let connection = self
            .connections
            .remove(&id)
            .ok_or(DiagramError::ConnectionNotFound(id))?;
        tracing::debug!(connection = %id, "deleted connection");
        Ok(connection)
    }
}
