//! Entity types for the diagram: elements, groups and connections.
//!
//! All three kinds are siblings; membership of an element in a group is a weak
//! back-reference (`group_id`), never ownership.

use archstudio_geometry::{anchor_point, card_rect, Point, Rect, Size};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id!(
    /// Element identifier
    ElementId
);
entity_id!(
    /// Group identifier
    GroupId
);
entity_id!(
    /// Connection identifier
    ConnectionId
);

/// Palette category an element kind belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Actors,
    Containers,
    Infrastructure,
}

/// The fixed set of element types offered by the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    User,
    #[serde(alias = "external")]
    ExternalSystem,
    #[serde(alias = "webapp")]
    WebApp,
    #[serde(alias = "mobile")]
    MobileApp,
    Microservice,
    #[serde(alias = "serverless")]
    ServerlessFunction,
    Database,
    Cache,
    Queue,
    ApiGateway,
    #[serde(alias = "docker")]
    Container,
    #[serde(alias = "kubernetes")]
    OrchestratedPod,
    #[serde(alias = "loadbalancer")]
    LoadBalancer,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        ElementKind::User,
        ElementKind::ExternalSystem,
        ElementKind::WebApp,
        ElementKind::MobileApp,
        ElementKind::Microservice,
        ElementKind::ServerlessFunction,
        ElementKind::Database,
        ElementKind::Cache,
        ElementKind::Queue,
        ElementKind::ApiGateway,
        ElementKind::Container,
        ElementKind::OrchestratedPod,
        ElementKind::LoadBalancer,
    ];

    /// Display name for palettes and status bars
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::User => "User",
            ElementKind::ExternalSystem => "External System",
            ElementKind::WebApp => "Web Application",
            ElementKind::MobileApp => "Mobile App",
            ElementKind::Microservice => "Microservice",
            ElementKind::ServerlessFunction => "Serverless Function",
            ElementKind::Database => "Database",
            ElementKind::Cache => "Cache",
            ElementKind::Queue => "Queue",
            ElementKind::ApiGateway => "API Gateway",
            ElementKind::Container => "Container",
            ElementKind::OrchestratedPod => "Orchestrated Pod",
            ElementKind::LoadBalancer => "Load Balancer",
        }
    }

    pub fn category(self) -> Category {
        match self {
            ElementKind::User | ElementKind::ExternalSystem => Category::Actors,
            ElementKind::Container | ElementKind::OrchestratedPod | ElementKind::LoadBalancer => {
                Category::Infrastructure
            }
            _ => Category::Containers,
        }
    }

    /// Cycle to the next kind in palette order
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Architectural layer an element or group sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Presentation,
    #[default]
    Business,
    Data,
    Infrastructure,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Presentation => "Presentation",
            Layer::Business => "Business",
            Layer::Data => "Data",
            Layer::Infrastructure => "Infrastructure",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Layer::Presentation => Layer::Business,
            Layer::Business => Layer::Data,
            Layer::Data => Layer::Infrastructure,
            Layer::Infrastructure => Layer::Presentation,
        }
    }
}

/// Connection semantics; controls color and dash pattern when rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    #[default]
    Sync,
    Async,
    Data,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 3] = [
        ConnectionKind::Sync,
        ConnectionKind::Async,
        ConnectionKind::Data,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConnectionKind::Sync => "sync",
            ConnectionKind::Async => "async",
            ConnectionKind::Data => "data",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ConnectionKind::Sync => ConnectionKind::Async,
            ConnectionKind::Async => ConnectionKind::Data,
            ConnectionKind::Data => ConnectionKind::Sync,
        }
    }
}

/// C4 zoom level the diagram is being viewed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum C4Level {
    Context,
    #[default]
    Container,
    Component,
    Code,
}

impl C4Level {
    pub const ALL: [C4Level; 4] = [
        C4Level::Context,
        C4Level::Container,
        C4Level::Component,
        C4Level::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            C4Level::Context => "Context",
            C4Level::Container => "Container",
            C4Level::Component => "Component",
            C4Level::Code => "Code",
        }
    }
}

/// A placed node on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub name: String,
    /// Top-left corner in canvas space
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl Element {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Rectangle covered by the rendered card
    pub fn rect(&self) -> Rect {
        card_rect(self.position())
    }

    /// Where connection lines meet this element
    pub fn anchor(&self) -> Point {
        anchor_point(self.position())
    }
}

/// A labeled rectangular region used to cluster elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
}

impl Group {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub(crate) fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

/// A directed, typed edge between two elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from: ElementId,
    pub to: ElementId,
    pub protocol: String,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Connection {
    /// Whether either endpoint is `id`
    pub fn touches(&self, id: ElementId) -> bool {
        self.from == id || self.to == id
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Attributes of a connection supplied by the detail-capture step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub protocol: String,
    pub kind: ConnectionKind,
    pub description: Option<String>,
}

impl ConnectionDetails {
    pub fn new(protocol: impl Into<String>, kind: ConnectionKind) -> Self {
        Self {
            protocol: protocol.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update for an element; `None` leaves a field untouched.
///
/// Group membership is not part of the patch, it goes through
/// [`Diagram::assign_element_to_group`](crate::Diagram::assign_element_to_group)
/// so the reference is validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub kind: Option<ElementKind>,
    pub name: Option<String>,
    pub position: Option<Point>,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    pub team: Option<String>,
    pub repository: Option<String>,
    pub port: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub layer: Option<Layer>,
}

impl ElementPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tech_stack(mut self, tech_stack: impl Into<String>) -> Self {
        self.tech_stack = Some(tech_stack.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub(crate) fn apply(self, element: &mut Element) {
        if let Some(kind) = self.kind {
            element.kind = kind;
        }
        if let Some(name) = self.name {
            element.name = name;
        }
        if let Some(pos) = self.position {
            let pos = archstudio_geometry::clamp_non_negative(pos);
            element.x = pos.x;
            element.y = pos.y;
        }
        let fields = [
            (self.description, &mut element.description),
            (self.tech_stack, &mut element.tech_stack),
            (self.team, &mut element.team),
            (self.repository, &mut element.repository),
            (self.port, &mut element.port),
            (self.cpu, &mut element.cpu),
            (self.memory, &mut element.memory),
        ];
        for (value, slot) in fields {
            if value.is_some() {
                *slot = value;
            }
        }
        if self.layer.is_some() {
            element.layer = self.layer;
        }
    }
}

/// Partial update for a group; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub layer: Option<Layer>,
}

impl GroupPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub(crate) fn apply(self, group: &mut Group) {
        if let Some(name) = self.name {
            group.name = name;
        }
        if let Some(color) = self.color {
            group.color = color;
        }
        if self.description.is_some() {
            group.description = self.description;
        }
        if let Some(pos) = self.position {
            let pos = archstudio_geometry::clamp_non_negative(pos);
            group.x = pos.x;
            group.y = pos.y;
        }
        if let Some(size) = self.size {
            let size = size.at_least(Size::MIN_GROUP);
            group.width = size.width;
            group.height = size.height;
        }
        if self.layer.is_some() {
            group.layer = self.layer;
        }
    }
}

/// Plain-data view of a whole diagram: initial input, file format and dump source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramSnapshot {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}
