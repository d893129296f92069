//! Node kinds and per-node state.
//!
//! Every node kind is a variant of one closed enum, so the set of kinds
//! is exhaustively checkable: each kind declares its slot table and
//! output kind in one place, and the evaluation dispatch in
//! [`crate::graph::PipelineGraph`] matches over all of them.

use crate::core::{ImageValue, LinkId, NodeId, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a node: value sources, image operators, and the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Integer literal parsed from raw text.
    Integer,
    /// Floating point literal parsed from raw text.
    Real,
    /// Text literal, taken verbatim.
    Text,
    /// Image decoded from a file path.
    ImageSource,
    /// Fixed sepia channel-mixing matrix.
    Sepia,
    /// Luma conversion replicated into all channels.
    Grey,
    /// Bitwise channel complement.
    Invert,
    /// Per-channel brightness offset.
    Bright,
    /// Gaussian blur with kernel size `2k + 1`.
    Gaussian,
    /// Resize to exact pixel dimensions.
    ScalePixel,
    /// Resize to percentages of the source dimensions.
    ScalePercent,
    /// Translate by a pixel offset.
    MovePixel,
    /// Translate by percentages of the source dimensions.
    MovePercent,
    /// Rotate about the image center.
    Rotate,
    /// Stamp text at a pixel position.
    AddTextPixel,
    /// Stamp text at a percentage position.
    AddTextPercent,
    /// Terminal passthrough used for display and export.
    Sink,
}

impl NodeKind {
    /// All node kinds, in presentation order.
    pub const ALL: [NodeKind; 17] = [
        NodeKind::Integer,
        NodeKind::Real,
        NodeKind::Text,
        NodeKind::ImageSource,
        NodeKind::Sepia,
        NodeKind::Grey,
        NodeKind::Invert,
        NodeKind::Bright,
        NodeKind::Gaussian,
        NodeKind::ScalePixel,
        NodeKind::ScalePercent,
        NodeKind::MovePixel,
        NodeKind::MovePercent,
        NodeKind::Rotate,
        NodeKind::AddTextPixel,
        NodeKind::AddTextPercent,
        NodeKind::Sink,
    ];

    /// The input slot table for this kind, in evaluation order.
    ///
    /// The order is significant: evaluation resolves slots in this
    /// order and short-circuits at the first `Absent`.
    pub fn slots(&self) -> &'static [(&'static str, ValueKind)] {
        use ValueKind::{Image, Integer, Real, Text};
        match self {
            NodeKind::Integer
            | NodeKind::Real
            | NodeKind::Text
            | NodeKind::ImageSource => &[],
            NodeKind::Sepia | NodeKind::Grey | NodeKind::Invert | NodeKind::Sink => {
                &[("image", Image)]
            }
            NodeKind::Bright => &[("image", Image), ("beta", Real)],
            NodeKind::Gaussian => &[("image", Image), ("kernel", Integer)],
            NodeKind::ScalePixel => {
                &[("image", Image), ("width", Integer), ("height", Integer)]
            }
            NodeKind::ScalePercent => &[("image", Image), ("width", Real), ("height", Real)],
            NodeKind::MovePixel => &[("image", Image), ("dx", Integer), ("dy", Integer)],
            NodeKind::MovePercent => &[("image", Image), ("dx", Real), ("dy", Real)],
            NodeKind::Rotate => &[("image", Image), ("angle", Real)],
            NodeKind::AddTextPixel => &[
                ("image", Image),
                ("x", Integer),
                ("y", Integer),
                ("text", Text),
                ("scale", Real),
            ],
            NodeKind::AddTextPercent => &[
                ("image", Image),
                ("x", Real),
                ("y", Real),
                ("text", Text),
                ("scale", Real),
            ],
        }
    }

    /// The kind of value this node produces.
    ///
    /// The sink's output is its input passed through unchanged, so it
    /// advertises `Image` like every other image-producing kind.
    pub fn output_kind(&self) -> ValueKind {
        match self {
            NodeKind::Integer => ValueKind::Integer,
            NodeKind::Real => ValueKind::Real,
            NodeKind::Text => ValueKind::Text,
            _ => ValueKind::Image,
        }
    }

    /// Whether this kind stores user-entered raw text (Integer, Real, Text).
    pub fn is_value_kind(&self) -> bool {
        matches!(self, NodeKind::Integer | NodeKind::Real | NodeKind::Text)
    }

    /// Human-readable name, as shown in node headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Integer => "Int",
            NodeKind::Real => "Float",
            NodeKind::Text => "String",
            NodeKind::ImageSource => "Image",
            NodeKind::Sepia => "Sepia",
            NodeKind::Grey => "Grey",
            NodeKind::Invert => "Invert",
            NodeKind::Bright => "Bright",
            NodeKind::Gaussian => "Gaussian",
            NodeKind::ScalePixel => "Scale (px)",
            NodeKind::ScalePercent => "Scale (%)",
            NodeKind::MovePixel => "Move (px)",
            NodeKind::MovePercent => "Move (%)",
            NodeKind::Rotate => "Rotate",
            NodeKind::AddTextPixel => "Add text (px)",
            NodeKind::AddTextPercent => "Add text (%)",
            NodeKind::Sink => "Output",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Canvas position of a node. Opaque to evaluation; round-trips
/// through persistence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One typed input slot on a node.
///
/// The expected kind is fixed at construction; `link` holds the id of
/// the single incoming link, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: &'static str,
    pub expected: ValueKind,
    pub link: Option<LinkId>,
}

/// A node in the pipeline graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    position: Position,
    /// Raw text for value kinds; the file path for an image source.
    raw: Option<String>,
    /// Decoded pixel buffer for an image source.
    image: Option<ImageValue>,
    slots: Vec<Slot>,
    /// Cached readiness, maintained by graph refresh and kick.
    ready: bool,
}

impl Node {
    /// Construct a node of the given kind with all slots unconnected.
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self::with_id(NodeId::new(), kind, position)
    }

    /// Construct a node with a preassigned id, as during load.
    pub fn with_id(id: NodeId, kind: NodeKind, position: Position) -> Self {
        let slots = kind
            .slots()
            .iter()
            .map(|&(name, expected)| Slot {
                name,
                expected,
                link: None,
            })
            .collect();
        Self {
            id,
            kind,
            position,
            raw: None,
            image: None,
            slots,
            ready: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// The user-entered raw text (or image path), if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub(crate) fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = Some(raw.into());
    }

    /// The decoded source image, if this is an image source that
    /// decoded successfully.
    pub fn image(&self) -> Option<&ImageValue> {
        self.image.as_ref()
    }

    pub(crate) fn set_image(&mut self, image: Option<ImageValue>) {
        self.image = image;
    }

    /// All input slots, in evaluation order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up an input slot by name.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.name == name)
    }

    /// Cached readiness: true when every input resolved to a value on
    /// the last refresh.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}
