//! Diagram graph model for archstudio.
//!
//! Holds the three sibling collections (elements, groups, connections), keeps
//! them referentially consistent, derives connection geometry, and defines the
//! contracts used to tell collaborators about changes.

mod diagram;
mod error;
mod events;
mod model;
pub mod route;

pub use diagram::{Diagram, IdGenerator, RemovedElement, RemovedGroup};
pub use error::{DiagramError, Result};
pub use events::{ActionHook, ActionKind, ChangeEvent, ChangeSink, EntityKind};
pub use model::{
    C4Level, Category, Connection, ConnectionDetails, ConnectionId, ConnectionKind,
    DiagramSnapshot, Element, ElementId, ElementKind, ElementPatch, Group, GroupId, GroupPatch,
    Layer,
};
pub use route::{route_connection, route_connections, ConnectionRoute, ConnectionStyle};
