//! rasterflow: a typed dataflow graph for composing image pipelines.
//!
//! Pipelines are directed acyclic graphs of value nodes (integers,
//! floats, text, source images) and operator nodes (color transforms,
//! blur, geometry, text overlay) ending in a sink. Links are type
//! checked when created; evaluation pulls lazily through the graph and
//! mutation pushes readiness updates forward.
//!
//! ```
//! use rasterflow::core::Value;
//! use rasterflow::graph::{NodeKind, PipelineGraph, Position};
//!
//! let mut graph = PipelineGraph::new();
//! let number = graph.add_node(NodeKind::Integer, Position::default());
//! graph.set_raw_value(number, "7")?;
//! assert_eq!(graph.evaluate(number)?, Value::Integer(7));
//! # Ok::<(), rasterflow::core::GraphError>(())
//! ```

pub mod core;
pub mod graph;
pub mod ops;

pub use crate::core::{
    GraphError, GraphResult, ImageValue, LinkId, NodeId, PersistError, RasterflowError,
    Value, ValueKind,
};
pub use crate::graph::{NodeKind, PipelineGraph, Position};
