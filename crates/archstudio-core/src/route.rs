//! Derived line geometry for connections.
//!
//! Routes are recomputed from current element positions on every call and are
//! never stored.

use archstudio_geometry::{angle_degrees, distance_to_segment, midpoint, Point, Rect};

use crate::diagram::Diagram;
use crate::model::{Connection, ConnectionId, ConnectionKind};

pub const SYNC_COLOR: &str = "#3b82f6";
pub const ASYNC_COLOR: &str = "#f59e0b";
pub const DATA_COLOR: &str = "#10b981";
pub const ASYNC_DASH: &str = "5,5";

pub const TOOLTIP_WIDTH: f64 = 120.0;
pub const TOOLTIP_HEIGHT: f64 = 40.0;
const ARROW_LENGTH: f64 = 10.0;
const ARROW_HALF_WIDTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStyle {
    pub color: &'static str,
    /// Dash pattern; empty for solid lines
    pub dash: &'static str,
}

impl ConnectionStyle {
    pub fn for_kind(kind: ConnectionKind) -> Self {
        match kind {
            ConnectionKind::Sync => Self {
                color: SYNC_COLOR,
                dash: "",
            },
            ConnectionKind::Async => Self {
                color: ASYNC_COLOR,
                dash: ASYNC_DASH,
            },
            ConnectionKind::Data => Self {
                color: DATA_COLOR,
                dash: "",
            },
        }
    }

    pub fn is_dashed(&self) -> bool {
        !self.dash.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRoute {
    pub id: ConnectionId,
    pub from: Point,
    pub to: Point,
    /// Direction of travel in degrees, for rotating the arrowhead
    pub angle: f64,
    pub style: ConnectionStyle,
}

impl ConnectionRoute {
    pub fn midpoint(&self) -> Point {
        midpoint(self.from, self.to)
    }

    pub fn length(&self) -> f64 {
        self.from.distance_to(self.to)
    }

    /// Arrowhead triangle before rotation: tip at `to`, base 10 units back
    pub fn arrowhead_unrotated(&self) -> [Point; 3] {
        [
            self.to,
            self.to.translated(-ARROW_LENGTH, -ARROW_HALF_WIDTH),
            self.to.translated(-ARROW_LENGTH, ARROW_HALF_WIDTH),
        ]
    }

    /// Arrowhead triangle rotated by `angle` around the tip
    pub fn arrowhead(&self) -> [Point; 3] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        self.arrowhead_unrotated().map(|p| {
            let d = p - self.to;
            Point::new(
                self.to.x + d.x * cos - d.y * sin,
                self.to.y + d.x * sin + d.y * cos,
            )
        })
    }

    /// Whether `p` lies within `tolerance` of the line
    pub fn hit(&self, p: Point, tolerance: f64) -> bool {
        distance_to_segment(p, self.from, self.to) <= tolerance
    }

    /// Box for the hover tooltip, centered on the midpoint
    pub fn tooltip_rect(&self) -> Rect {
        let mid = self.midpoint();
        Rect::new(
            mid.x - TOOLTIP_WIDTH / 2.0,
            mid.y - TOOLTIP_HEIGHT / 2.0,
            TOOLTIP_WIDTH,
            TOOLTIP_HEIGHT,
        )
    }
}

/// Route a single connection. `None` only if an endpoint is missing, which the
/// diagram's cascade rules rule out.
pub fn route_connection(diagram: &Diagram, connection: &Connection) -> Option<ConnectionRoute> {
    let from = diagram.element(connection.from)?.anchor();
    let to = diagram.element(connection.to)?.anchor();
    let angle = if connection.is_self_loop() {
        0.0
    } else {
        angle_degrees(from, to)
    };
    Some(ConnectionRoute {
        id: connection.id,
        from,
        to,
        angle,
        style: ConnectionStyle::for_kind(connection.kind),
    })
}

pub fn route_connections(diagram: &Diagram) -> Vec<ConnectionRoute> {
    diagram
        .connections()
        .filter_map(|c| route_connection(diagram, c))
        .collect()
}

/// First connection whose line passes within `tolerance` of `p`
pub fn connection_at(diagram: &Diagram, p: Point, tolerance: f64) -> Option<ConnectionId> {
    route_connections(diagram)
        .into_iter()
        .find(|route| route.hit(p, tolerance))
        .map(|route| route.id)
}
