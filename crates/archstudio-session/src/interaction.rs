use archstudio_core::{ConnectionId, ElementId, GroupId};
use archstudio_geometry::{Point, ResizeCorner};

/// The single active manipulation mode.
///
/// Offsets are in canvas space: pointer position minus the dragged item's
/// top-left corner at gesture start.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    DraggingElement {
        id: ElementId,
        offset: Point,
        moved: bool,
    },
    DraggingGroup {
        id: GroupId,
        offset: Point,
        moved: bool,
    },
    ResizingGroup {
        id: GroupId,
        corner: ResizeCorner,
        resized: bool,
    },
    DrawingConnection {
        pending_from: Option<ElementId>,
    },
}

impl Interaction {
    /// True while a pointer gesture owns the canvas
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Interaction::DraggingElement { .. }
                | Interaction::DraggingGroup { .. }
                | Interaction::ResizingGroup { .. }
        )
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, Interaction::DrawingConnection { .. })
    }

    pub fn pending_source(&self) -> Option<ElementId> {
        match self {
            Interaction::DrawingConnection { pending_from } => *pending_from,
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::DraggingElement { .. } => "dragging element",
            Interaction::DraggingGroup { .. } => "dragging group",
            Interaction::ResizingGroup { .. } => "resizing group",
            Interaction::DrawingConnection { .. } => "drawing connection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub element: Option<ElementId>,
    pub group: Option<GroupId>,
}

impl Selection {
    pub fn clear(&mut self) {
        self.element = None;
        self.group = None;
    }

    pub fn is_empty(&self) -> bool {
        self.element.is_none() && self.group.is_none()
    }
}

/// Two endpoints chosen in connection mode, waiting for protocol and type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub from: ElementId,
    pub to: ElementId,
}

/// What a pointer event did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerResponse {
    Ignored,
    DragStarted(ElementId),
    GroupDragStarted(GroupId),
    ResizeStarted(GroupId, ResizeCorner),
    Moved,
    HoverChanged(Option<ConnectionId>),
    SelectionCleared,
    ElementSelected(ElementId),
    ConnectionSourceChosen(ElementId),
    ConnectionRequested(ConnectionRequest),
    GestureFinished,
}
