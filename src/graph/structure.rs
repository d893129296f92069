//! The pipeline graph: nodes, links, evaluation, and propagation.
//!
//! Evaluation is pull-based: [`PipelineGraph::evaluate`] recursively
//! resolves each input slot from its upstream node and short-circuits
//! to [`Value::Absent`] at the first unresolvable input. Mutation is
//! push-based: every edit ends in a [`PipelineGraph::kick`] that
//! refreshes cached readiness flags downstream.

use crate::core::{
    GraphError, GraphResult, ImageValue, LinkId, NodeId, RasterflowError, Value,
};
use crate::graph::link::Link;
use crate::graph::node::{Node, NodeKind, Position};
use crate::ops;
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::VecDeque;
use std::path::Path;

/// A directed, acyclic dataflow graph over typed nodes.
///
/// Nodes are held in insertion order; links live in a flat list and are
/// mirrored into the target node's slot for O(slots) lookup during
/// evaluation. Every mutating method either succeeds completely or
/// leaves the graph untouched.
#[derive(Debug, Default, Clone)]
pub struct PipelineGraph {
    nodes: IndexMap<NodeId, Node>,
    links: Vec<Link>,
    /// Order in which nodes were evaluated, recorded so tests can
    /// assert on short-circuiting.
    #[cfg(test)]
    evaluated: std::cell::RefCell<Vec<NodeId>>,
}

impl PipelineGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- structure ----------------------------------------------------

    /// Add a node of the given kind and refresh its readiness.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let node = Node::new(kind, position);
        let id = node.id();
        self.nodes.insert(id, node);
        // A zero-slot node can be ready immediately (e.g. a Text node).
        if let Err(err) = self.refresh(id) {
            debug!("refresh after add_node failed: {err}");
        }
        debug!("added {} node {id}", kind.display_name());
        id
    }

    /// Insert a node with a preassigned id, as during load.
    pub(crate) fn insert_with_id(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        position: Position,
    ) -> GraphResult<()> {
        self.nodes.insert(id, Node::with_id(id, kind, position));
        self.refresh(id)
    }

    /// Remove a node and every link touching it, on either side.
    ///
    /// Consumers that lose an input are refreshed (and may become
    /// not-ready); no cascade runs beyond them.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let touching: Vec<LinkId> = self
            .links
            .iter()
            .filter(|l| l.source == id || l.target == id)
            .map(|l| l.id)
            .collect();
        for link_id in touching {
            self.disconnect(link_id)?;
        }
        self.nodes.shift_remove(&id);
        debug!("removed node {id}");
        Ok(())
    }

    /// Connect `source`'s output to the named slot on `target`.
    ///
    /// Validation order: both nodes exist, the slot exists, the kinds
    /// match exactly, the slot is free, and the new edge closes no
    /// cycle. A failure at any step leaves the graph unchanged; on
    /// success the target is kicked.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        slot: &str,
    ) -> GraphResult<LinkId> {
        let link = Link::new(source, target, slot);
        let id = link.id;
        self.install_link(link)?;
        Ok(id)
    }

    /// Validate and bind a fully built link, then kick the target.
    ///
    /// Used by [`connect`](Self::connect) and by load, which preserves
    /// saved link ids and anchor offsets.
    pub(crate) fn install_link(&mut self, link: Link) -> GraphResult<()> {
        let source = self
            .nodes
            .get(&link.source)
            .ok_or(GraphError::NodeNotFound(link.source))?;
        let target = self
            .nodes
            .get(&link.target)
            .ok_or(GraphError::NodeNotFound(link.target))?;
        let slot = target
            .slot(&link.target_slot)
            .ok_or_else(|| GraphError::SlotNotFound {
                node_id: link.target,
                slot: link.target_slot.clone(),
            })?;
        let source_kind = source.kind().output_kind();
        if source_kind != slot.expected {
            return Err(GraphError::TypeMismatch {
                found: source_kind,
                expected: slot.expected,
            });
        }
        if slot.link.is_some() {
            return Err(GraphError::SlotAlreadyConnected {
                node_id: link.target,
                slot: link.target_slot.clone(),
            });
        }
        if link.source == link.target || self.is_reachable(link.target, link.source) {
            return Err(GraphError::CycleDetected {
                from: link.source,
                to: link.target,
            });
        }

        let (target_id, slot_name, link_id) =
            (link.target, link.target_slot.clone(), link.id);
        self.links.push(link);
        if let Some(slot) = self
            .nodes
            .get_mut(&target_id)
            .and_then(|n| n.slot_mut(&slot_name))
        {
            slot.link = Some(link_id);
        }
        debug!("linked {} -> {target_id}:{slot_name}", link_id);
        self.kick(target_id)
    }

    /// Remove a link, unbinding the target slot.
    ///
    /// Only the formerly connected target is refreshed; downstream
    /// nodes keep their cached state until the next pull or kick.
    pub fn disconnect(&mut self, link_id: LinkId) -> GraphResult<()> {
        let index = self
            .links
            .iter()
            .position(|l| l.id == link_id)
            .ok_or(GraphError::LinkNotFound(link_id))?;
        let link = self.links.remove(index);
        if let Some(slot) = self
            .nodes
            .get_mut(&link.target)
            .and_then(|n| n.slot_mut(&link.target_slot))
        {
            slot.link = None;
        }
        // The target may have been removed already when called from
        // remove_node on the target itself.
        if self.nodes.contains_key(&link.target) {
            self.refresh(link.target)?;
        }
        debug!("unlinked {link_id}");
        Ok(())
    }

    /// True if `to` can be reached from `from` along links.
    fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut queue = VecDeque::from([from]);
        let mut seen = vec![from];
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            for link in self.links.iter().filter(|l| l.source == current) {
                if !seen.contains(&link.target) {
                    seen.push(link.target);
                    queue.push_back(link.target);
                }
            }
        }
        false
    }

    // ---- node state ---------------------------------------------------

    /// Set a value node's raw text and kick its consumers.
    ///
    /// The text is not validated here: an unparsable literal simply
    /// evaluates to `Absent`, which the kick surfaces as not-ready.
    pub fn set_raw_value(&mut self, id: NodeId, text: impl Into<String>) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        if !node.kind().is_value_kind() {
            return Err(GraphError::NotAValueNode(id));
        }
        node.set_raw(text);
        self.kick(id)
    }

    /// Point an image source at a file and try to decode it.
    ///
    /// A failed decode is not an error: the path is kept, a warning is
    /// logged, and the node is left not-ready until a decodable path
    /// arrives.
    pub fn set_source_path(
        &mut self,
        id: NodeId,
        path: impl AsRef<Path>,
    ) -> GraphResult<()> {
        let path = path.as_ref();
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        if node.kind() != NodeKind::ImageSource {
            return Err(GraphError::NotAnImageSource(id));
        }
        node.set_raw(path.to_string_lossy());
        match ImageValue::open(path) {
            Ok(image) => node.set_image(Some(image)),
            Err(err) => {
                warn!("could not decode {}: {err}", path.display());
                node.set_image(None);
            }
        }
        self.kick(id)
    }

    // ---- evaluation ---------------------------------------------------

    /// Evaluate a node by recursively pulling its inputs.
    ///
    /// Slots resolve in declared order and the first `Absent` input
    /// short-circuits the whole evaluation to `Absent`; later slots are
    /// never pulled. Operator parameter checks (kernel bounds, positive
    /// dimensions) also yield `Absent` rather than an error.
    pub fn evaluate(&self, id: NodeId) -> GraphResult<Value> {
        let node = self.node(id)?;
        #[cfg(test)]
        self.evaluated.borrow_mut().push(id);
        match node.kind() {
            NodeKind::Integer => Ok(parse_value(node.raw(), |s| {
                s.parse::<i64>().ok().map(Value::Integer)
            })),
            NodeKind::Real => Ok(parse_value(node.raw(), |s| {
                s.parse::<f64>().ok().map(Value::Real)
            })),
            NodeKind::Text => Ok(Value::Text(node.raw().unwrap_or_default().to_string())),
            NodeKind::ImageSource => Ok(node
                .image()
                .cloned()
                .map(Value::Image)
                .unwrap_or(Value::Absent)),

            NodeKind::Sepia => self.unary_image(node, ops::color::sepia),
            NodeKind::Grey => self.unary_image(node, ops::color::grayscale),
            NodeKind::Invert => self.unary_image(node, ops::color::invert),

            NodeKind::Bright => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(beta) = self.pull_real(node, "beta")? else {
                    return Ok(Value::Absent);
                };
                Ok(image_value(ops::color::brighten(image.buffer(), beta)))
            }

            NodeKind::Gaussian => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(k) = self.pull_integer(node, "kernel")? else {
                    return Ok(Value::Absent);
                };
                // 2k + 1 can overflow for parseable-but-huge literals.
                let Some(kernel_size) = k.checked_mul(2).and_then(|v| v.checked_add(1))
                else {
                    return Ok(Value::Absent);
                };
                if !ops::blur::kernel_size_in_range(kernel_size) {
                    return Ok(Value::Absent);
                }
                Ok(image_value(ops::blur::gaussian(
                    image.buffer(),
                    kernel_size as u32,
                )))
            }

            NodeKind::ScalePixel => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(width) = self.pull_integer(node, "width")? else {
                    return Ok(Value::Absent);
                };
                let Some(height) = self.pull_integer(node, "height")? else {
                    return Ok(Value::Absent);
                };
                let (Some(width), Some(height)) =
                    (output_dimension(width), output_dimension(height))
                else {
                    return Ok(Value::Absent);
                };
                Ok(image_value(ops::geometry::resize(
                    image.buffer(),
                    width,
                    height,
                )))
            }

            NodeKind::ScalePercent => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(px) = self.pull_real(node, "width")? else {
                    return Ok(Value::Absent);
                };
                let Some(py) = self.pull_real(node, "height")? else {
                    return Ok(Value::Absent);
                };
                let width = ops::geometry::percent_of(image.width(), px);
                let height = ops::geometry::percent_of(image.height(), py);
                let (Some(width), Some(height)) =
                    (output_dimension(width), output_dimension(height))
                else {
                    return Ok(Value::Absent);
                };
                Ok(image_value(ops::geometry::resize(
                    image.buffer(),
                    width,
                    height,
                )))
            }

            NodeKind::MovePixel => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(dx) = self.pull_integer(node, "dx")? else {
                    return Ok(Value::Absent);
                };
                let Some(dy) = self.pull_integer(node, "dy")? else {
                    return Ok(Value::Absent);
                };
                Ok(image_value(ops::geometry::translate(image.buffer(), dx, dy)))
            }

            NodeKind::MovePercent => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(px) = self.pull_real(node, "dx")? else {
                    return Ok(Value::Absent);
                };
                let Some(py) = self.pull_real(node, "dy")? else {
                    return Ok(Value::Absent);
                };
                let dx = ops::geometry::percent_of(image.width(), px);
                let dy = ops::geometry::percent_of(image.height(), py);
                Ok(image_value(ops::geometry::translate(image.buffer(), dx, dy)))
            }

            NodeKind::Rotate => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(angle) = self.pull_real(node, "angle")? else {
                    return Ok(Value::Absent);
                };
                Ok(image_value(ops::geometry::rotate(image.buffer(), angle)))
            }

            NodeKind::AddTextPixel => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(x) = self.pull_integer(node, "x")? else {
                    return Ok(Value::Absent);
                };
                let Some(y) = self.pull_integer(node, "y")? else {
                    return Ok(Value::Absent);
                };
                let Some(text) = self.pull_text(node, "text")? else {
                    return Ok(Value::Absent);
                };
                let Some(scale) = self.pull_real(node, "scale")? else {
                    return Ok(Value::Absent);
                };
                let thickness = scale.round().max(0.0) as u32;
                Ok(image_value(ops::text::stamp(
                    image.buffer(),
                    &text,
                    x,
                    y,
                    scale,
                    thickness,
                )))
            }

            NodeKind::AddTextPercent => {
                let Some(image) = self.pull_image(node, "image")? else {
                    return Ok(Value::Absent);
                };
                let Some(px) = self.pull_real(node, "x")? else {
                    return Ok(Value::Absent);
                };
                let Some(py) = self.pull_real(node, "y")? else {
                    return Ok(Value::Absent);
                };
                let Some(text) = self.pull_text(node, "text")? else {
                    return Ok(Value::Absent);
                };
                let Some(scale) = self.pull_real(node, "scale")? else {
                    return Ok(Value::Absent);
                };
                let x = ops::geometry::percent_of(image.width(), px);
                let y = ops::geometry::percent_of(image.height(), py);
                Ok(image_value(ops::text::stamp(
                    image.buffer(),
                    &text,
                    x,
                    y,
                    scale,
                    2,
                )))
            }

            NodeKind::Sink => self.pull(node, "image"),
        }
    }

    /// Recompute a node's cached readiness from a fresh pull.
    pub(crate) fn refresh(&mut self, id: NodeId) -> GraphResult<()> {
        let ready = !self.evaluate(id)?.is_absent();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_ready(ready);
        }
        Ok(())
    }

    /// Push a state change forward: refresh `id`, then walk its
    /// outgoing links, refreshing every transitive consumer. The walk
    /// is unconditional — an invalidated value node must turn every
    /// downstream readiness flag off, not only its direct consumer's.
    /// The graph is acyclic, so the recursion terminates.
    pub fn kick(&mut self, id: NodeId) -> GraphResult<()> {
        self.refresh(id)?;
        self.cascade(id)
    }

    fn cascade(&mut self, id: NodeId) -> GraphResult<()> {
        let targets: Vec<NodeId> = self
            .links
            .iter()
            .filter(|l| l.source == id)
            .map(|l| l.target)
            .collect();
        for target in targets {
            self.refresh(target)?;
            self.cascade(target)?;
        }
        Ok(())
    }

    /// Whether the node's last refresh resolved every input.
    pub fn is_ready(&self, id: NodeId) -> GraphResult<bool> {
        Ok(self.node(id)?.is_ready())
    }

    /// Evaluate a node and encode the resulting image to a file.
    ///
    /// Fails with [`GraphError::NotReady`] when the node evaluates to
    /// `Absent`; nothing is written in that case.
    pub fn export_image(
        &self,
        id: NodeId,
        path: impl AsRef<Path>,
    ) -> Result<(), RasterflowError> {
        match self.evaluate(id)? {
            Value::Image(image) => {
                image.save(&path)?;
                Ok(())
            }
            _ => Err(GraphError::NotReady(id).into()),
        }
    }

    // ---- slot resolution ----------------------------------------------

    /// Resolve one input slot: `Absent` when unlinked, otherwise the
    /// upstream node's evaluation result.
    fn pull(&self, node: &Node, slot_name: &str) -> GraphResult<Value> {
        let slot = node.slot(slot_name).ok_or_else(|| GraphError::SlotNotFound {
            node_id: node.id(),
            slot: slot_name.to_string(),
        })?;
        match slot.link {
            None => Ok(Value::Absent),
            Some(link_id) => {
                let link = self
                    .links
                    .iter()
                    .find(|l| l.id == link_id)
                    .ok_or(GraphError::LinkNotFound(link_id))?;
                self.evaluate(link.source)
            }
        }
    }

    fn pull_image(&self, node: &Node, slot: &str) -> GraphResult<Option<ImageValue>> {
        Ok(self.pull(node, slot)?.as_image().cloned())
    }

    fn pull_integer(&self, node: &Node, slot: &str) -> GraphResult<Option<i64>> {
        Ok(self.pull(node, slot)?.as_integer())
    }

    fn pull_real(&self, node: &Node, slot: &str) -> GraphResult<Option<f64>> {
        Ok(self.pull(node, slot)?.as_real())
    }

    fn pull_text(&self, node: &Node, slot: &str) -> GraphResult<Option<String>> {
        Ok(self.pull(node, slot)?.as_text().map(str::to_string))
    }

    fn unary_image<F>(&self, node: &Node, op: F) -> GraphResult<Value>
    where
        F: Fn(&image::RgbImage) -> image::RgbImage,
    {
        match self.pull_image(node, "image")? {
            Some(image) => Ok(image_value(op(image.buffer()))),
            None => Ok(Value::Absent),
        }
    }

    // ---- accessors ----------------------------------------------------

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Iterate all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All links in creation order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Look up a link by id.
    pub fn link(&self, id: LinkId) -> GraphResult<&Link> {
        self.links
            .iter()
            .find(|l| l.id == id)
            .ok_or(GraphError::LinkNotFound(id))
    }

    /// The node ids of every sink in the graph, in insertion order.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.kind() == NodeKind::Sink)
            .map(|n| n.id())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

fn parse_value(raw: Option<&str>, parse: impl Fn(&str) -> Option<Value>) -> Value {
    raw.and_then(|s| parse(s.trim())).unwrap_or(Value::Absent)
}

/// A resize dimension must be positive and fit the pixel coordinate range.
fn output_dimension(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|&v| v > 0)
}

fn image_value(image: image::RgbImage) -> Value {
    Value::Image(image.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueKind;
    use image::{Rgb, RgbImage};

    fn at_origin() -> Position {
        Position::default()
    }

    fn graph_with_source(pixel: [u8; 3]) -> (PipelineGraph, NodeId) {
        let mut graph = PipelineGraph::new();
        let source = graph.add_node(NodeKind::ImageSource, at_origin());
        let image = ImageValue::new(RgbImage::from_pixel(4, 4, Rgb(pixel)));
        // Bypass the file system for tests.
        if let Some(node) = graph.nodes.get_mut(&source) {
            node.set_image(Some(image));
        }
        graph.kick(source).unwrap();
        (graph, source)
    }

    #[test]
    fn test_value_nodes_parse_raw_text() {
        let mut graph = PipelineGraph::new();
        let int = graph.add_node(NodeKind::Integer, at_origin());
        let real = graph.add_node(NodeKind::Real, at_origin());
        let text = graph.add_node(NodeKind::Text, at_origin());

        assert_eq!(graph.evaluate(int).unwrap(), Value::Absent);
        graph.set_raw_value(int, "42").unwrap();
        assert_eq!(graph.evaluate(int).unwrap(), Value::Integer(42));
        graph.set_raw_value(int, "abc").unwrap();
        assert_eq!(graph.evaluate(int).unwrap(), Value::Absent);

        graph.set_raw_value(real, " 2.5 ").unwrap();
        assert_eq!(graph.evaluate(real).unwrap(), Value::Real(2.5));

        // Text is verbatim, even before any edit.
        assert_eq!(graph.evaluate(text).unwrap(), Value::Text(String::new()));
        assert!(graph.is_ready(text).unwrap());
    }

    #[test]
    fn test_integer_is_not_accepted_where_real_expected() {
        let mut graph = PipelineGraph::new();
        let int = graph.add_node(NodeKind::Integer, at_origin());
        let bright = graph.add_node(NodeKind::Bright, at_origin());

        let err = graph.connect(int, bright, "beta").unwrap_err();
        assert_eq!(
            err,
            GraphError::TypeMismatch {
                found: ValueKind::Integer,
                expected: ValueKind::Real,
            }
        );
        assert_eq!(graph.link_count(), 0);
        assert!(graph.node(bright).unwrap().slot("beta").unwrap().link.is_none());
    }

    #[test]
    fn test_rejected_connect_leaves_graph_unchanged() {
        let mut graph = PipelineGraph::new();
        let (source, sepia) = (
            graph.add_node(NodeKind::ImageSource, at_origin()),
            graph.add_node(NodeKind::Sepia, at_origin()),
        );
        graph.connect(source, sepia, "image").unwrap();

        // Occupied slot.
        let other = graph.add_node(NodeKind::ImageSource, at_origin());
        let err = graph.connect(other, sepia, "image").unwrap_err();
        assert!(matches!(err, GraphError::SlotAlreadyConnected { .. }));
        assert_eq!(graph.link_count(), 1);

        // Unknown slot.
        let err = graph.connect(other, sepia, "brightness").unwrap_err();
        assert!(matches!(err, GraphError::SlotNotFound { .. }));
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_connect_rejects_cycles() {
        let mut graph = PipelineGraph::new();
        let a = graph.add_node(NodeKind::Sepia, at_origin());
        let b = graph.add_node(NodeKind::Invert, at_origin());
        let c = graph.add_node(NodeKind::Grey, at_origin());
        graph.connect(a, b, "image").unwrap();
        graph.connect(b, c, "image").unwrap();

        let err = graph.connect(c, a, "image").unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
        let err = graph.connect(a, a, "image").unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
        assert_eq!(graph.link_count(), 2);
    }

    #[test]
    fn test_unlinked_slot_short_circuits_to_absent() {
        let (mut graph, source) = graph_with_source([100, 100, 100]);
        let bright = graph.add_node(NodeKind::Bright, at_origin());
        graph.connect(source, bright, "image").unwrap();

        // "beta" is still unlinked.
        assert_eq!(graph.evaluate(bright).unwrap(), Value::Absent);
        assert!(!graph.is_ready(bright).unwrap());
    }

    #[test]
    fn test_brightness_clamps_at_255() {
        let (mut graph, source) = graph_with_source([250, 250, 250]);
        let beta = graph.add_node(NodeKind::Real, at_origin());
        graph.set_raw_value(beta, "20").unwrap();
        let bright = graph.add_node(NodeKind::Bright, at_origin());
        graph.connect(source, bright, "image").unwrap();
        graph.connect(beta, bright, "beta").unwrap();

        let value = graph.evaluate(bright).unwrap();
        let image = value.as_image().unwrap();
        assert_eq!(image.buffer().get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_gaussian_kernel_bounds() {
        let (mut graph, source) = graph_with_source([100, 100, 100]);
        let k = graph.add_node(NodeKind::Integer, at_origin());
        let blur = graph.add_node(NodeKind::Gaussian, at_origin());
        graph.connect(source, blur, "image").unwrap();
        graph.connect(k, blur, "kernel").unwrap();

        // k = 0 -> kernel 1, a valid no-op blur.
        graph.set_raw_value(k, "0").unwrap();
        assert!(graph.evaluate(blur).unwrap().as_image().is_some());

        // k = -1 -> kernel -1, rejected.
        graph.set_raw_value(k, "-1").unwrap();
        assert_eq!(graph.evaluate(blur).unwrap(), Value::Absent);

        // k = 50 -> kernel 101, over the bound.
        graph.set_raw_value(k, "50").unwrap();
        assert_eq!(graph.evaluate(blur).unwrap(), Value::Absent);

        // A huge literal parses but must not overflow the kernel arithmetic.
        graph.set_raw_value(k, i64::MAX.to_string()).unwrap();
        assert_eq!(graph.evaluate(blur).unwrap(), Value::Absent);
        graph.set_raw_value(k, i64::MIN.to_string()).unwrap();
        assert_eq!(graph.evaluate(blur).unwrap(), Value::Absent);
    }

    #[test]
    fn test_scale_pixel_rejects_dimensions_beyond_pixel_range() {
        let (mut graph, source) = graph_with_source([10, 20, 30]);
        let width = graph.add_node(NodeKind::Integer, at_origin());
        let height = graph.add_node(NodeKind::Integer, at_origin());
        let scale = graph.add_node(NodeKind::ScalePixel, at_origin());
        graph.connect(source, scale, "image").unwrap();
        graph.connect(width, scale, "width").unwrap();
        graph.connect(height, scale, "height").unwrap();

        // u32::MAX + 3: positive, but truncation would make it 2.
        graph.set_raw_value(width, "4294967298").unwrap();
        graph.set_raw_value(height, "3").unwrap();
        assert_eq!(graph.evaluate(scale).unwrap(), Value::Absent);

        graph.set_raw_value(width, "2").unwrap();
        let value = graph.evaluate(scale).unwrap();
        let image = value.as_image().unwrap();
        assert_eq!((image.width(), image.height()), (2, 3));
    }

    #[test]
    fn test_scale_percent_rejects_zero_dimension() {
        let (mut graph, source) = graph_with_source([10, 20, 30]);
        let px = graph.add_node(NodeKind::Real, at_origin());
        let py = graph.add_node(NodeKind::Real, at_origin());
        let scale = graph.add_node(NodeKind::ScalePercent, at_origin());
        graph.connect(source, scale, "image").unwrap();
        graph.connect(px, scale, "width").unwrap();
        graph.connect(py, scale, "height").unwrap();

        graph.set_raw_value(px, "0").unwrap();
        graph.set_raw_value(py, "200").unwrap();
        assert_eq!(graph.evaluate(scale).unwrap(), Value::Absent);

        graph.set_raw_value(px, "50").unwrap();
        let value = graph.evaluate(scale).unwrap();
        let image = value.as_image().unwrap();
        assert_eq!((image.width(), image.height()), (2, 8));
    }

    #[test]
    fn test_kick_cascade_flips_two_hop_sink() {
        let (mut graph, source) = graph_with_source([50, 60, 70]);
        let beta = graph.add_node(NodeKind::Real, at_origin());
        let bright = graph.add_node(NodeKind::Bright, at_origin());
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        graph.connect(source, bright, "image").unwrap();
        graph.connect(beta, bright, "beta").unwrap();
        graph.connect(bright, sink, "image").unwrap();

        graph.set_raw_value(beta, "abc").unwrap();
        assert!(!graph.is_ready(sink).unwrap());

        // The push cascade alone must flip the sink to ready.
        graph.set_raw_value(beta, "5").unwrap();
        assert!(graph.is_ready(sink).unwrap());

        // And back again.
        graph.set_raw_value(beta, "xyz").unwrap();
        assert!(!graph.is_ready(sink).unwrap());
    }

    #[test]
    fn test_invalidation_cascades_past_direct_consumers() {
        let (mut graph, source) = graph_with_source([50, 60, 70]);
        let beta = graph.add_node(NodeKind::Real, at_origin());
        let bright = graph.add_node(NodeKind::Bright, at_origin());
        let invert = graph.add_node(NodeKind::Invert, at_origin());
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        graph.connect(source, bright, "image").unwrap();
        graph.connect(beta, bright, "beta").unwrap();
        graph.connect(bright, invert, "image").unwrap();
        graph.connect(invert, sink, "image").unwrap();

        graph.set_raw_value(beta, "10").unwrap();
        assert!(graph.is_ready(invert).unwrap());
        assert!(graph.is_ready(sink).unwrap());

        // Invalidating the literal must turn off every downstream flag,
        // not just the direct consumer's.
        graph.set_raw_value(beta, "oops").unwrap();
        assert!(!graph.is_ready(bright).unwrap());
        assert!(!graph.is_ready(invert).unwrap());
        assert!(!graph.is_ready(sink).unwrap());
        assert!(graph.is_ready(source).unwrap());
    }

    #[test]
    fn test_short_circuit_skips_slots_after_a_missing_input() {
        let mut graph = PipelineGraph::new();
        let beta = graph.add_node(NodeKind::Real, at_origin());
        graph.set_raw_value(beta, "1.5").unwrap();
        let bright = graph.add_node(NodeKind::Bright, at_origin());
        graph.connect(beta, bright, "beta").unwrap();

        // "image" is declared before "beta" and is unlinked, so the
        // evaluation must stop before ever pulling the beta node.
        graph.evaluated.borrow_mut().clear();
        assert_eq!(graph.evaluate(bright).unwrap(), Value::Absent);
        let evaluated = graph.evaluated.borrow();
        assert!(evaluated.contains(&bright));
        assert!(!evaluated.contains(&beta));
    }

    #[test]
    fn test_disconnect_leaves_source_untouched() {
        let (mut graph, source) = graph_with_source([1, 2, 3]);
        let sepia = graph.add_node(NodeKind::Sepia, at_origin());
        let link = graph.connect(source, sepia, "image").unwrap();
        assert!(graph.is_ready(sepia).unwrap());

        graph.disconnect(link).unwrap();
        assert!(!graph.is_ready(sepia).unwrap());
        assert!(graph.is_ready(source).unwrap());
        assert!(graph.evaluate(source).unwrap().as_image().is_some());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_remove_node_detaches_all_links() {
        let (mut graph, source) = graph_with_source([1, 2, 3]);
        let sepia = graph.add_node(NodeKind::Sepia, at_origin());
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        graph.connect(source, sepia, "image").unwrap();
        graph.connect(sepia, sink, "image").unwrap();

        graph.remove_node(sepia).unwrap();
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.node(sink).unwrap().slot("image").unwrap().link.is_none());
        assert!(matches!(
            graph.evaluate(sepia),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_sink_is_identity_passthrough() {
        let (mut graph, source) = graph_with_source([5, 6, 7]);
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        graph.connect(source, sink, "image").unwrap();

        let upstream = graph.evaluate(source).unwrap();
        let downstream = graph.evaluate(sink).unwrap();
        assert_eq!(upstream, downstream);
    }

    #[test]
    fn test_export_absent_sink_fails_not_ready() {
        let mut graph = PipelineGraph::new();
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let err = graph.export_image(sink, &path).unwrap_err();
        assert!(matches!(
            err,
            RasterflowError::Graph(GraphError::NotReady(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_writes_decodable_png() {
        let (mut graph, source) = graph_with_source([200, 150, 100]);
        let sink = graph.add_node(NodeKind::Sink, at_origin());
        graph.connect(source, sink, "image").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        graph.export_image(sink, &path).unwrap();

        let reloaded = ImageValue::open(&path).unwrap();
        assert_eq!(reloaded.buffer().get_pixel(0, 0).0, [200, 150, 100]);
    }

    #[test]
    fn test_set_source_path_survives_bad_file() {
        let mut graph = PipelineGraph::new();
        let source = graph.add_node(NodeKind::ImageSource, at_origin());
        graph.set_source_path(source, "/no/such/file.png").unwrap();
        assert!(!graph.is_ready(source).unwrap());
        assert_eq!(graph.evaluate(source).unwrap(), Value::Absent);
    }

    #[test]
    fn test_set_raw_value_rejects_operator_nodes() {
        let mut graph = PipelineGraph::new();
        let sepia = graph.add_node(NodeKind::Sepia, at_origin());
        assert!(matches!(
            graph.set_raw_value(sepia, "1"),
            Err(GraphError::NotAValueNode(_))
        ));
        assert!(matches!(
            graph.set_source_path(sepia, "a.png"),
            Err(GraphError::NotAnImageSource(_))
        ));
    }
}
