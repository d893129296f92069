//! Saving and loading pipeline graphs as JSON.
//!
//! The persisted shape mirrors what the canvas needs to rebuild the
//! scene: node ids, kinds, positions and raw data, plus links with
//! their slot names and display anchor offsets. Node kind is stored in
//! a `type` field which is `null` for the sink. Loading always builds
//! a fresh graph; on any failure nothing is applied to the caller's
//! live graph.

use crate::core::{LinkId, NodeId, PersistError, PersistResult};
use crate::graph::link::{AnchorOffset, Link};
use crate::graph::node::{NodeKind, Position};
use crate::graph::structure::PipelineGraph;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// File extension for persisted graphs.
pub const GRAPH_EXTENSION: &str = "rfg";

/// Persisted form version, bumped on breaking layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// A node as it appears in the persisted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Raw text for value nodes, the file path for image sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// `None` encodes the sink.
    #[serde(rename = "type")]
    pub kind: Option<NodeKind>,
}

/// A link as it appears in the persisted file.
///
/// `input_node`/`input_anchor` name the consuming node and its slot;
/// `output_node` is the producer. The anchor sizes are display offsets
/// that must round-trip even though evaluation ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLink {
    pub id: String,
    pub input_node: String,
    pub output_node: String,
    pub input_anchor: String,
    pub output_anchor: String,
    pub input_anchor_size: AnchorOffset,
    pub output_anchor_size: AnchorOffset,
}

/// The whole persisted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGraph {
    pub version: u32,
    pub nodes: Vec<SavedNode>,
    pub links: Vec<SavedLink>,
}

/// Capture a graph into its persisted form.
pub fn to_saved(graph: &PipelineGraph) -> SavedGraph {
    let nodes = graph
        .nodes()
        .map(|node| SavedNode {
            id: node.id().0.to_string(),
            name: node.kind().display_name().to_string(),
            x: Some(node.position().x),
            y: Some(node.position().y),
            data: node.raw().map(str::to_string),
            kind: match node.kind() {
                NodeKind::Sink => None,
                kind => Some(kind),
            },
        })
        .collect();

    let links = graph
        .links()
        .iter()
        .map(|link| SavedLink {
            id: link.id.0.to_string(),
            input_node: link.target.0.to_string(),
            output_node: link.source.0.to_string(),
            input_anchor: link.target_slot.clone(),
            output_anchor: link.source_anchor.clone(),
            input_anchor_size: link.input_anchor_size,
            output_anchor_size: link.output_anchor_size,
        })
        .collect();

    SavedGraph {
        version: FORMAT_VERSION,
        nodes,
        links,
    }
}

/// Rebuild a live graph from its persisted form.
///
/// Nodes are recreated with their saved ids and data; setting the data
/// re-runs the same refresh path as a user edit, so an image source
/// re-decodes its file (an undecodable path leaves the node not-ready
/// but does not abort the load). Links are then reinstalled with their
/// saved ids and offsets, which re-runs validation and the forward
/// kick. A missing node or slot aborts with a [`PersistError`].
pub fn from_saved(saved: &SavedGraph) -> PersistResult<PipelineGraph> {
    let mut graph = PipelineGraph::new();

    for node in &saved.nodes {
        let id = NodeId::from_uuid(parse_uuid(&node.id)?);
        let kind = node.kind.unwrap_or(NodeKind::Sink);
        let position = Position::new(node.x.unwrap_or(0.0), node.y.unwrap_or(0.0));
        graph.insert_with_id(id, kind, position)?;
        if let Some(data) = &node.data {
            if kind.is_value_kind() {
                graph.set_raw_value(id, data.clone())?;
            } else if kind == NodeKind::ImageSource {
                graph.set_source_path(id, data)?;
            }
        }
    }

    for link in &saved.links {
        let source = NodeId::from_uuid(parse_uuid(&link.output_node)?);
        let target = NodeId::from_uuid(parse_uuid(&link.input_node)?);
        graph
            .node(source)
            .map_err(|_| PersistError::MissingNode(link.output_node.clone()))?;
        let consumer = graph
            .node(target)
            .map_err(|_| PersistError::MissingNode(link.input_node.clone()))?;
        if consumer.slot(&link.input_anchor).is_none() {
            return Err(PersistError::MissingSlot {
                node: link.input_node.clone(),
                slot: link.input_anchor.clone(),
            });
        }
        graph.install_link(Link {
            id: LinkId(parse_uuid(&link.id)?),
            source,
            target,
            target_slot: link.input_anchor.clone(),
            source_anchor: link.output_anchor.clone(),
            input_anchor_size: link.input_anchor_size,
            output_anchor_size: link.output_anchor_size,
        })?;
    }

    Ok(graph)
}

/// Serialize a graph to pretty-printed JSON.
pub fn to_json(graph: &PipelineGraph) -> PersistResult<String> {
    Ok(serde_json::to_string_pretty(&to_saved(graph))?)
}

/// Deserialize a graph from JSON.
pub fn from_json(json: &str) -> PersistResult<PipelineGraph> {
    let saved: SavedGraph = serde_json::from_str(json)?;
    from_saved(&saved)
}

/// Write a graph to disk.
pub fn save_to_path(graph: &PipelineGraph, path: impl AsRef<Path>) -> PersistResult<()> {
    let path = path.as_ref();
    fs::write(path, to_json(graph)?)?;
    info!(
        "saved graph ({} nodes, {} links) to {}",
        graph.node_count(),
        graph.link_count(),
        path.display()
    );
    Ok(())
}

/// Read a graph from disk.
pub fn load_from_path(path: impl AsRef<Path>) -> PersistResult<PipelineGraph> {
    let path = path.as_ref();
    let graph = from_json(&fs::read_to_string(path)?)?;
    info!(
        "loaded graph ({} nodes, {} links) from {}",
        graph.node_count(),
        graph.link_count(),
        path.display()
    );
    Ok(graph)
}

fn parse_uuid(text: &str) -> PersistResult<Uuid> {
    Uuid::parse_str(text).map_err(|_| PersistError::MalformedId(text.to_string()))
}
