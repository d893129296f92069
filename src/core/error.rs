//! Identifiers and error types.
//!
//! Uses thiserror for structured errors with context. A rejected graph
//! mutation carries enough information to tell the user which node, slot,
//! or kind was at fault, and never leaves the graph partially modified.

use crate::core::types::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a node ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Unique identifier for a link in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for rasterflow.
#[derive(Error, Debug)]
pub enum RasterflowError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors related to graph structure and mutation.
///
/// A failed mutation leaves the graph exactly as it was: no partial link is
/// ever created and no slot is rebound.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Link {0} not found")]
    LinkNotFound(LinkId),

    #[error("Slot '{slot}' not found on node {node_id}")]
    SlotNotFound { node_id: NodeId, slot: String },

    #[error("Cannot connect {found} output to {expected} slot")]
    TypeMismatch {
        found: ValueKind,
        expected: ValueKind,
    },

    #[error("Slot '{slot}' on node {node_id} is already connected")]
    SlotAlreadyConnected { node_id: NodeId, slot: String },

    #[error("Connecting {from} to {to} would create a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("Node {0} is not a value node")]
    NotAValueNode(NodeId),

    #[error("Node {0} is not an image source")]
    NotAnImageSource(NodeId),

    #[error("Node {0} is not ready")]
    NotReady(NodeId),
}

/// Errors while saving or loading a persisted graph.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Saved link references missing node '{0}'")]
    MissingNode(String),

    #[error("Saved link references missing slot '{slot}' on node '{node}'")]
    MissingSlot { node: String, slot: String },

    #[error("Malformed identifier '{0}' in saved graph")]
    MalformedId(String),

    #[error("Rejected saved link: {0}")]
    Graph(#[from] GraphError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        let id = NodeId::new();
        assert_eq!(format!("{}", id).len(), 8);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = GraphError::TypeMismatch {
            found: ValueKind::Integer,
            expected: ValueKind::Real,
        };
        assert_eq!(err.to_string(), "Cannot connect Int output to Float slot");
    }

    #[test]
    fn test_cycle_message_names_both_endpoints() {
        let (from, to) = (NodeId::new(), NodeId::new());
        let err = GraphError::CycleDetected { from, to };
        let message = err.to_string();
        assert!(message.contains(&from.to_string()));
        assert!(message.contains(&to.to_string()));
    }
}
