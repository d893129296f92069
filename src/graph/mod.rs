//! Graph structure, links, evaluation, and persistence.

pub mod link;
pub mod node;
pub mod serialization;
pub mod structure;

pub use link::{AnchorOffset, Link};
pub use node::{Node, NodeKind, Position, Slot};
pub use structure::PipelineGraph;
