//! The editing session: interaction state machine plus mutation facade.
//!
//! Every change made through [`Editor`] is published to the change sink first
//! and then reported to the action hook. Neither collaborator can influence the
//! outcome of a mutation.

use archstudio_core::route::connection_at;
use archstudio_core::{
    ActionHook, ActionKind, C4Level, ChangeEvent, ChangeSink, Connection, ConnectionDetails,
    ConnectionId, Diagram, Element, ElementId, ElementKind, ElementPatch, Group, GroupId,
    GroupPatch, Layer, RemovedElement, RemovedGroup, Result,
};
use archstudio_geometry::{
    clamp_non_negative, clamp_to_extent, resize_rect, snap_to_grid, Point, Size, Viewport,
};

use crate::config::EditorConfig;
use crate::hit::{hit_test, HitTarget};
use crate::interaction::{ConnectionRequest, Interaction, PointerResponse, Selection};

pub struct Editor {
    diagram: Diagram,
    config: EditorConfig,
    interaction: Interaction,
    selection: Selection,
    viewport: Viewport,
    level: C4Level,
    hovered_connection: Option<ConnectionId>,
    pending_request: Option<ConnectionRequest>,
    show_connections: bool,
    show_groups: bool,
    changes: Option<Box<dyn ChangeSink>>,
    actions: Option<Box<dyn ActionHook>>,
}

impl Editor {
    pub fn new(diagram: Diagram, config: EditorConfig) -> Self {
        let config = config.normalized();
        let mut viewport = Viewport::default();
        viewport.zoom = config.clamp_zoom(config.initial_zoom);
        Self {
            diagram,
            config,
            interaction: Interaction::Idle,
            selection: Selection::default(),
            viewport,
            level: C4Level::default(),
            hovered_connection: None,
            pending_request: None,
            show_connections: true,
            show_groups: true,
            changes: None,
            actions: None,
        }
    }

    pub fn with_change_sink(mut self, sink: impl ChangeSink + 'static) -> Self {
        self.changes = Some(Box::new(sink));
        self
    }

    pub fn with_action_hook(mut self, hook: impl ActionHook + 'static) -> Self {
        self.actions = Some(Box::new(hook));
        self
    }

    // ---- accessors ----

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom(&self) -> u16 {
        self.viewport.zoom
    }

    pub fn level(&self) -> C4Level {
        self.level
    }

    pub fn hovered_connection(&self) -> Option<ConnectionId> {
        self.hovered_connection
    }

    pub fn pending_request(&self) -> Option<ConnectionRequest> {
        self.pending_request
    }

    pub fn show_connections(&self) -> bool {
        self.show_connections
    }

    pub fn show_groups(&self) -> bool {
        self.show_groups
    }

    pub fn snap_to_grid(&self) -> bool {
        self.config.snap_to_grid
    }

    // ---- notification plumbing ----

    fn publish(&mut self, event: ChangeEvent) {
        if let Some(sink) = self.changes.as_mut() {
            sink.publish(event);
        }
    }

    fn notify(&mut self, action: ActionKind) {
        tracing::debug!(action = %action, "action");
        if let Some(hook) = self.actions.as_mut() {
            hook.notify(action);
        }
    }

    // ---- pointer input ----

    /// Resolve the topmost target under a canvas-space point
    pub fn hit_test(&self, p: Point) -> HitTarget {
        hit_test(&self.diagram, p, self.config.handle_radius, self.show_groups)
    }

    /// Pointer pressed at a client-space point
    pub fn pointer_down(&mut self, client: Point) -> PointerResponse {
        let p = self.viewport.client_to_canvas(client);
        let target = self.hit_test(p);
        self.pointer_down_on(target, p)
    }

    /// Pointer pressed on an already resolved target at canvas point `p`
    pub fn pointer_down_on(&mut self, target: HitTarget, p: Point) -> PointerResponse {
        if let Interaction::DrawingConnection { pending_from } = self.interaction {
            return self.connection_click(pending_from, target);
        }
        if self.interaction.is_gesture() {
            tracing::debug!(state = self.interaction.name(), "pointer down ignored during gesture");
            return PointerResponse::Ignored;
        }

        match target {
            HitTarget::Element(id) => {
                let Some(element) = self.diagram.element(id) else {
                    return PointerResponse::Ignored;
                };
                self.interaction = Interaction::DraggingElement {
                    id,
                    offset: p - element.position(),
                    moved: false,
                };
                PointerResponse::DragStarted(id)
            }
            HitTarget::GroupHandle(id, corner) => {
                if self.diagram.group(id).is_none() {
                    return PointerResponse::Ignored;
                }
                self.selection.group = Some(id);
                self.interaction = Interaction::ResizingGroup {
                    id,
                    corner,
                    resized: false,
                };
                PointerResponse::ResizeStarted(id, corner)
            }
            HitTarget::Group(id) => {
                let Some(group) = self.diagram.group(id) else {
                    return PointerResponse::Ignored;
                };
                let offset = p - group.position();
                self.selection.group = Some(id);
                self.interaction = Interaction::DraggingGroup {
                    id,
                    offset,
                    moved: false,
                };
                PointerResponse::GroupDragStarted(id)
            }
            HitTarget::Canvas => {
                self.selection.clear();
                PointerResponse::SelectionCleared
            }
        }
    }

    fn connection_click(&mut self, pending_from: Option<ElementId>, target: HitTarget) -> PointerResponse {
        let HitTarget::Element(id) = target else {
            return PointerResponse::Ignored;
        };
        match pending_from {
            None => {
                self.interaction = Interaction::DrawingConnection {
                    pending_from: Some(id),
                };
                PointerResponse::ConnectionSourceChosen(id)
            }
            Some(from) if from != id => {
                let request = ConnectionRequest { from, to: id };
                self.pending_request = Some(request);
                self.interaction = Interaction::Idle;
                tracing::debug!(from = %from, to = %id, "connection requested");
                PointerResponse::ConnectionRequested(request)
            }
            Some(_) => PointerResponse::Ignored,
        }
    }

    /// Pointer moved to a client-space point
    pub fn pointer_move(&mut self, client: Point) -> PointerResponse {
        let p = self.viewport.client_to_canvas(client);
        self.pointer_move_canvas(p)
    }

    pub fn pointer_move_canvas(&mut self, p: Point) -> PointerResponse {
        match self.interaction {
            Interaction::DraggingElement { id, offset, moved } => {
                let Some(before) = self.diagram.element(id).map(Element::position) else {
                    self.interaction = Interaction::Idle;
                    return PointerResponse::Ignored;
                };
                let target = self.place_element(p - offset);
                if let Ok(element) = self.diagram.move_element(id, target) {
                    self.interaction = Interaction::DraggingElement {
                        id,
                        offset,
                        moved: moved || element.position() != before,
                    };
                }
                PointerResponse::Moved
            }
            Interaction::DraggingGroup { id, offset, moved } => {
                let Some(before) = self.diagram.group(id).map(Group::position) else {
                    self.interaction = Interaction::Idle;
                    return PointerResponse::Ignored;
                };
                let mut target = clamp_non_negative(p - offset);
                if self.config.snap_to_grid {
                    target = snap_to_grid(target, self.config.grid_size);
                }
                if let Ok(group) = self.diagram.move_group(id, target) {
                    self.interaction = Interaction::DraggingGroup {
                        id,
                        offset,
                        moved: moved || group.position() != before,
                    };
                }
                PointerResponse::Moved
            }
            Interaction::ResizingGroup {
                id,
                corner,
                resized,
            } => {
                let Some(before) = self.diagram.group(id).map(Group::rect) else {
                    self.interaction = Interaction::Idle;
                    return PointerResponse::Ignored;
                };
                let bounds = resize_rect(before, corner, p, Size::MIN_GROUP);
                if let Ok(group) = self.diagram.set_group_bounds(id, bounds) {
                    self.interaction = Interaction::ResizingGroup {
                        id,
                        corner,
                        resized: resized || group.rect() != before,
                    };
                }
                PointerResponse::Moved
            }
            Interaction::Idle | Interaction::DrawingConnection { .. } => self.update_hover(p),
        }
    }

    fn place_element(&self, candidate: Point) -> Point {
        let extent = self.config.canvas_extent;
        let mut target = clamp_to_extent(candidate, Size::CARD, extent);
        if self.config.snap_to_grid {
            target = clamp_to_extent(snap_to_grid(target, self.config.grid_size), Size::CARD, extent);
        }
        target
    }

    fn update_hover(&mut self, p: Point) -> PointerResponse {
        let hovered = if self.show_connections {
            connection_at(&self.diagram, p, self.config.hover_tolerance)
        } else {
            None
        };
        if hovered == self.hovered_connection {
            return PointerResponse::Ignored;
        }
        self.hovered_connection = hovered;
        PointerResponse::HoverChanged(hovered)
    }

    /// Pointer released anywhere. Ends the active gesture and reports the
    /// final geometry once.
    pub fn pointer_up(&mut self) -> PointerResponse {
        let finished = std::mem::replace(&mut self.interaction, Interaction::Idle);
        match finished {
            Interaction::DraggingElement { id, moved, .. } => {
                if !moved {
                    self.selection.element = Some(id);
                    return PointerResponse::ElementSelected(id);
                }
                if let Some(element) = self.diagram.element(id).cloned() {
                    tracing::debug!(element = %id, x = element.x, y = element.y, "element drag finished");
                    self.publish(ChangeEvent::ElementMoved(element));
                    self.notify(ActionKind::ElementMoved);
                }
                PointerResponse::GestureFinished
            }
            Interaction::DraggingGroup { id, moved, .. } => {
                if let Some(group) = self.diagram.group(id).filter(|_| moved).cloned() {
                    self.publish(ChangeEvent::GroupMoved(group));
                    self.notify(ActionKind::GroupMoved);
                }
                PointerResponse::GestureFinished
            }
            Interaction::ResizingGroup { id, resized, .. } => {
                if let Some(group) = self.diagram.group(id).filter(|_| resized).cloned() {
                    tracing::debug!(group = %id, width = group.width, height = group.height, "group resize finished");
                    self.publish(ChangeEvent::GroupResized(group));
                    self.notify(ActionKind::GroupResized);
                }
                PointerResponse::GestureFinished
            }
            other => {
                self.interaction = other;
                PointerResponse::Ignored
            }
        }
    }

    // ---- connection mode ----

    /// Enter or leave connection mode, dropping any pending source. Ignored
    /// while a gesture is active. Returns whether connection mode is now on.
    pub fn toggle_connection_mode(&mut self) -> bool {
        if self.interaction.is_gesture() {
            return false;
        }
        self.interaction = if self.interaction.is_drawing() {
            Interaction::Idle
        } else {
            Interaction::DrawingConnection { pending_from: None }
        };
        self.interaction.is_drawing()
    }

    /// Create the connection for a request once its details are known
    pub fn complete_connection(
        &mut self,
        request: ConnectionRequest,
        details: ConnectionDetails,
    ) -> Result<Connection> {
        if self.pending_request == Some(request) {
            self.pending_request = None;
        }
        let connection = self.diagram.add_connection(request.from, request.to, details)?;
        self.publish(ChangeEvent::ConnectionCreated(connection.clone()));
        self.notify(ActionKind::ElementConnected);
        Ok(connection)
    }

    pub fn cancel_connection_request(&mut self) -> Option<ConnectionRequest> {
        self.pending_request.take()
    }

    // ---- element mutations ----

    pub fn add_element(&mut self, kind: ElementKind, name: impl Into<String>, position: Point) -> Element {
        let element = self.diagram.add_element(kind, name, position);
        self.publish(ChangeEvent::ElementCreated(element.clone()));
        self.notify(ActionKind::ElementAdded);
        element
    }

    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> Result<Element> {
        let element = self.diagram.update_element(id, patch)?;
        self.publish(ChangeEvent::ElementUpdated(element.clone()));
        self.notify(ActionKind::ElementUpdated);
        Ok(element)
    }

    pub fn assign_element_to_group(&mut self, id: ElementId, group: Option<GroupId>) -> Result<Element> {
        let element = self.diagram.assign_element_to_group(id, group)?;
        self.publish(ChangeEvent::ElementUpdated(element.clone()));
        self.notify(ActionKind::ElementUpdated);
        Ok(element)
    }

    pub fn delete_element(&mut self, id: ElementId) -> Result<RemovedElement> {
        let removed = self.diagram.delete_element(id)?;
        for connection in &removed.connections {
            self.publish(ChangeEvent::ConnectionDeleted(connection.id));
            if self.hovered_connection == Some(connection.id) {
                self.hovered_connection = None;
            }
        }
        self.publish(ChangeEvent::ElementDeleted(id));

        if self.selection.element == Some(id) {
            self.selection.element = None;
        }
        match self.interaction {
            Interaction::DraggingElement { id: dragged, .. } if dragged == id => {
                self.interaction = Interaction::Idle;
            }
            Interaction::DrawingConnection {
                pending_from: Some(source),
            } if source == id => {
                self.interaction = Interaction::DrawingConnection { pending_from: None };
            }
            _ => {}
        }
        if self
            .pending_request
            .is_some_and(|r| r.from == id || r.to == id)
        {
            self.pending_request = None;
        }

        self.notify(ActionKind::ElementDeleted);
        Ok(removed)
    }

    // ---- group mutations ----

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        layer: Option<Layer>,
        position: Point,
        size: Size,
    ) -> Group {
        let group = self.diagram.add_group(name, color, layer, position, size);
        self.publish(ChangeEvent::GroupCreated(group.clone()));
        self.notify(ActionKind::GroupAdded);
        group
    }

    pub fn update_group(&mut self, id: GroupId, patch: GroupPatch) -> Result<Group> {
        let group = self.diagram.update_group(id, patch)?;
        self.publish(ChangeEvent::GroupUpdated(group.clone()));
        self.notify(ActionKind::GroupUpdated);
        Ok(group)
    }

    pub fn delete_group(&mut self, id: GroupId) -> Result<RemovedGroup> {
        let removed = self.diagram.delete_group(id)?;
        for element in &removed.unlinked {
            self.publish(ChangeEvent::ElementUpdated(element.clone()));
        }
        self.publish(ChangeEvent::GroupDeleted(id));

        if self.selection.group == Some(id) {
            self.selection.group = None;
        }
        match self.interaction {
            Interaction::DraggingGroup { id: active, .. }
            | Interaction::ResizingGroup { id: active, .. }
                if active == id =>
            {
                self.interaction = Interaction::Idle;
            }
            _ => {}
        }

        self.notify(ActionKind::GroupDeleted);
        Ok(removed)
    }

    // ---- connection mutations ----

    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<Connection> {
        let connection = self.diagram.delete_connection(id)?;
        if self.hovered_connection == Some(id) {
            self.hovered_connection = None;
        }
        self.publish(ChangeEvent::ConnectionDeleted(id));
        self.notify(ActionKind::ConnectionDeleted);
        Ok(connection)
    }

    /// Delete the selected element, or failing that the selected group.
    /// Returns false if nothing was selected.
    pub fn delete_selected(&mut self) -> Result<bool> {
        if let Some(id) = self.selection.element {
            self.delete_element(id)?;
            return Ok(true);
        }
        if let Some(id) = self.selection.group {
            self.delete_group(id)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Select an element directly, e.g. from a list rather than the canvas
    pub fn select_element(&mut self, id: Option<ElementId>) {
        self.selection.element = id.filter(|id| self.diagram.element(*id).is_some());
    }

    // ---- view state ----

    pub fn zoom_in(&mut self) -> u16 {
        self.set_zoom(self.viewport.zoom.saturating_add(self.config.zoom_step))
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.set_zoom(self.viewport.zoom.saturating_sub(self.config.zoom_step))
    }

    pub fn reset_zoom(&mut self) -> u16 {
        self.set_zoom(archstudio_geometry::DEFAULT_ZOOM)
    }

    /// Set the zoom percentage, clamped to the configured bounds
    pub fn set_zoom(&mut self, zoom: u16) -> u16 {
        if self
            .viewport
            .set_zoom(zoom, self.config.min_zoom, self.config.max_zoom)
        {
            self.notify(ActionKind::ZoomChanged);
        }
        self.viewport.zoom
    }

    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.viewport.origin = origin;
    }

    pub fn set_level(&mut self, level: C4Level) {
        if self.level != level {
            self.level = level;
            self.notify(ActionKind::LevelChanged);
        }
    }

    pub fn set_snap_to_grid(&mut self, enabled: bool) {
        self.config.snap_to_grid = enabled;
    }

    pub fn toggle_connections_visible(&mut self) -> bool {
        self.show_connections = !self.show_connections;
        if !self.show_connections {
            self.hovered_connection = None;
        }
        self.show_connections
    }

    pub fn toggle_groups_visible(&mut self) -> bool {
        self.show_groups = !self.show_groups;
        self.show_groups
    }
}
