//! Core types and error handling.

pub mod error;
pub mod types;

pub use error::{
    GraphError, GraphResult, LinkId, NodeId, PersistError, PersistResult, RasterflowError,
};
pub use types::{ImageValue, Value, ValueKind};
