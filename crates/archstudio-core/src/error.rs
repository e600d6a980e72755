use crate::model::{ConnectionId, ElementId, GroupId};

/// Errors raised by diagram mutations that reference unknown entities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("element {0} not found")]
    ElementNotFound(ElementId),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// A connection endpoint does not name an existing element
    #[error("connection endpoint {0} does not exist")]
    DanglingEndpoint(ElementId),
}

pub type Result<T> = std::result::Result<T, DiagramError>;
