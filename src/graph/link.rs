//! Typed directed edges between nodes.

use crate::core::{LinkId, NodeId};
use serde::{Deserialize, Serialize};

/// A display offset attached to a link endpoint.
///
/// Anchor offsets carry no evaluation semantics; the engine only
/// round-trips them through persistence for the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnchorOffset {
    pub x: f64,
    pub y: f64,
}

/// A directed edge from a node's single output to a named input slot
/// on another node.
///
/// The source end has no slot name: every node has exactly one output.
/// Type compatibility is checked once, when the link is installed into
/// the graph, so an existing link is always well typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub target_slot: String,
    /// Identifier of the source's output anchor. Evaluation never reads
    /// it (a node has one output), but persisted graphs round-trip it.
    pub source_anchor: String,
    pub input_anchor_size: AnchorOffset,
    pub output_anchor_size: AnchorOffset,
}

impl Link {
    /// Build a link with a fresh id and zero anchor offsets.
    pub fn new(source: NodeId, target: NodeId, target_slot: impl Into<String>) -> Self {
        Self {
            id: LinkId::new(),
            source,
            target,
            target_slot: target_slot.into(),
            source_anchor: "output".to_string(),
            input_anchor_size: AnchorOffset::default(),
            output_anchor_size: AnchorOffset::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_links_get_distinct_ids() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let first = Link::new(a, b, "image");
        let second = Link::new(a, b, "image");
        assert_ne!(first.id, second.id);
        assert_eq!(first.target_slot, "image");
        assert_eq!(first.input_anchor_size, AnchorOffset::default());
    }
}
