//! Core value types that flow through the pipeline graph.
//!
//! The type system uses an enum-based approach: the set of types a link can
//! carry is closed, so a tagged union gives exhaustive matching and cheap
//! runtime type checks at link-creation time.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A value produced by a node's evaluation.
///
/// `Absent` is not an error: it is the first-class "cannot compute yet"
/// signal that short-circuits evaluation when an input slot is unlinked,
/// upstream parsing failed, or an operator rejected its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Real(f64),
    /// UTF-8 text, possibly empty.
    Text(String),
    /// A decoded pixel buffer.
    Image(ImageValue),
    /// Not computable yet; propagates silently through evaluate chains.
    Absent,
}

/// The declared type of a slot or of a node's output.
///
/// Kinds must match exactly for a link to be created; there is no implicit
/// widening (`Integer` is not accepted where `Real` is expected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Real,
    Text,
    Image,
}

impl Value {
    /// The kind of this value, or `None` for `Absent`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Real(_) => Some(ValueKind::Real),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Image(_) => Some(ValueKind::Image),
            Value::Absent => None,
        }
    }

    /// Check whether this value is the `Absent` signal.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Try to view this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to view this value as a real number.
    pub fn as_real(&self) -> Option<f64> {
        if let Value::Real(r) = self {
            Some(*r)
        } else {
            None
        }
    }

    /// Try to view this value as text.
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to view this value as an image.
    pub fn as_image(&self) -> Option<&ImageValue> {
        if let Value::Image(img) = self {
            Some(img)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{:.4}", r),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Image(img) => write!(f, "Image({}x{})", img.width(), img.height()),
            Value::Absent => write!(f, "Absent"),
        }
    }
}

impl ValueKind {
    /// Human-readable name, as shown on slot labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            ValueKind::Integer => "Int",
            ValueKind::Real => "Float",
            ValueKind::Text => "String",
            ValueKind::Image => "Image",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A decoded image shared across the graph.
///
/// The buffer is held behind an `Arc` so a node's output can fan out to many
/// consumers without copying pixels; operators always allocate a fresh
/// buffer for their result and never mutate their input.
#[derive(Debug, Clone)]
pub struct ImageValue {
    data: Arc<RgbImage>,
}

impl PartialEq for ImageValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || *self.data == *other.data
    }
}

impl ImageValue {
    /// Wrap an owned buffer.
    pub fn new(image: RgbImage) -> Self {
        Self {
            data: Arc::new(image),
        }
    }

    /// Decode an image file into an RGB buffer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let image = image::open(path)?;
        Ok(Self::new(image.to_rgb8()))
    }

    /// Encode the buffer to a file; the format is chosen from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.data.save(path)
    }

    /// Borrow the underlying buffer.
    pub fn buffer(&self) -> &RgbImage {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.data.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Channel count of the buffer (always 3 for RGB).
    pub fn channels(&self) -> u32 {
        3
    }
}

impl From<RgbImage> for ImageValue {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}
