//! Poster elements - the text blocks and image slots of a layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{clamp, Rect};
use crate::{CoreError, CoreResult};

/// Smallest accepted canvas dimension in pixels.
pub const MIN_CANVAS_SIZE: u32 = 320;
/// Canvas used when no template type is selected.
pub const DEFAULT_CANVAS: Canvas = Canvas {
    width: 1080,
    height: 1350,
};
/// Minimum width of a text block.
pub const MIN_TEXT_WIDTH: f32 = 80.0;
/// Minimum width and height of an image slot.
pub const MIN_IMAGE_SIZE: f32 = 10.0;
/// Smallest font size the property panel accepts.
pub const MIN_FONT_SIZE: f32 = 8.0;
/// Largest font size the property panel accepts.
pub const MAX_FONT_SIZE: f32 = 200.0;

/// The fixed-size pixel rectangle a template defines.
///
/// Deserialization goes through [`Canvas::new`], so stored sizes below
/// [`MIN_CANVAS_SIZE`] are raised like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CanvasSize")]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Unchecked wire form of [`Canvas`].
#[derive(Deserialize)]
struct CanvasSize {
    width: u32,
    height: u32,
}

impl From<CanvasSize> for Canvas {
    fn from(size: CanvasSize) -> Self {
        Self::new(size.width, size.height)
    }
}

impl Canvas {
    /// Create a canvas, raising either dimension to [`MIN_CANVAS_SIZE`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_CANVAS_SIZE),
            height: height.max(MIN_CANVAS_SIZE),
        }
    }

    /// Width as a float, for geometry math.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn w(&self) -> f32 {
        self.width as f32
    }

    /// Height as a float, for geometry math.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn h(&self) -> f32 {
        self.height as f32
    }
}

impl Default for Canvas {
    fn default() -> Self {
        DEFAULT_CANVAS
    }
}

/// Identifies one element of the poster.
///
/// Variant order is the fixed slot order, which is also the paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKey {
    /// Poster headline.
    Title,
    /// Body copy.
    Content,
    /// Event date line.
    Date,
    /// Issue number line.
    Issue,
    /// Main image, bound to asset slot 0.
    Cover,
    /// Thumbnail, asset slot 1.
    Img2,
    /// Thumbnail, asset slot 2.
    Img3,
    /// Thumbnail, asset slot 3.
    Img4,
    /// Thumbnail, asset slot 4.
    Img5,
    /// Overflow thumbnail, asset slot 5.
    Img6,
}

impl ElementKey {
    /// Every key in slot order.
    pub const ALL: [Self; 10] = [
        Self::Title,
        Self::Content,
        Self::Date,
        Self::Issue,
        Self::Cover,
        Self::Img2,
        Self::Img3,
        Self::Img4,
        Self::Img5,
        Self::Img6,
    ];

    /// Image keys in asset slot order.
    pub const IMAGE_SLOTS: [Self; 6] = [
        Self::Cover,
        Self::Img2,
        Self::Img3,
        Self::Img4,
        Self::Img5,
        Self::Img6,
    ];

    /// The kind of element this key holds.
    #[must_use]
    pub const fn kind(self) -> ElementKind {
        match self {
            Self::Title | Self::Content | Self::Date | Self::Issue => ElementKind::Text,
            _ => ElementKind::Image,
        }
    }

    /// Asset slot index for image keys.
    #[must_use]
    pub fn slot_index(self) -> Option<usize> {
        Self::IMAGE_SLOTS.iter().position(|k| *k == self)
    }

    /// The serialized name of this key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Date => "date",
            Self::Issue => "issue",
            Self::Cover => "cover",
            Self::Img2 => "img2",
            Self::Img3 => "img3",
            Self::Img4 => "img4",
            Self::Img5 => "img5",
            Self::Img6 => "img6",
        }
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKey {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownElement(s.to_string()))
    }
}

/// Whether an element is a text block or an image slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Text block; height grows with content.
    Text,
    /// Image slot with free width and height.
    Image,
}

impl ElementKind {
    /// Minimum width for this kind.
    #[must_use]
    pub const fn min_width(self) -> f32 {
        match self {
            Self::Text => MIN_TEXT_WIDTH,
            Self::Image => MIN_IMAGE_SIZE,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Flush left.
    #[default]
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

impl Align {
    /// The serialized name of this alignment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Parse an alignment; unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "centre" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Parse a CSS font weight, accepting `bold`/`normal` keywords.
///
/// Numeric weights are clamped to `[100, 900]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_font_weight(s: &str) -> Option<u16> {
    match s.trim().to_ascii_lowercase().as_str() {
        "bold" => Some(700),
        "normal" => Some(400),
        other => other
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| clamp(v, 100.0, 900.0).round() as u16),
    }
}

/// A text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Top edge in canvas pixels.
    pub y: f32,
    /// Block width; text wraps inside it.
    pub w: f32,
    /// Font size in canvas pixels.
    pub font_size: f32,
    /// CSS numeric font weight.
    pub font_weight: u16,
    /// Fill colour as a CSS colour string.
    pub color: String,
    /// CSS font family list.
    pub font_family: String,
    /// Horizontal alignment inside the block.
    pub align: Align,
}

/// An image slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Top edge in canvas pixels.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

/// One positionable, resizable unit of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    /// Text block.
    Text(TextElement),
    /// Image slot.
    Image(ImageElement),
}

impl Element {
    /// The element's kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Image(_) => ElementKind::Image,
        }
    }

    /// Position and size. Text blocks report a height of zero.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Text(t) => Rect::new(t.x, t.y, t.w, 0.0),
            Self::Image(i) => Rect::new(i.x, i.y, i.w, i.h),
        }
    }

    /// Overwrite position and size. Text blocks ignore `h`.
    pub fn set_bounds(&mut self, r: Rect) {
        match self {
            Self::Text(t) => {
                t.x = r.x;
                t.y = r.y;
                t.w = r.w;
            }
            Self::Image(i) => {
                i.x = r.x;
                i.y = r.y;
                i.w = r.w;
                i.h = r.h;
            }
        }
    }

    /// Text fields, if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Self::Text(t) => Some(t),
            Self::Image(_) => None,
        }
    }

    /// Mutable text fields, if this is a text block.
    pub fn as_text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            Self::Text(t) => Some(t),
            Self::Image(_) => None,
        }
    }

    /// Clamp geometry and style into their valid ranges for `canvas`.
    ///
    /// Sizes are clamped first so the position range is known: `w` in
    /// `[min, W]`, then `x` in `[0, W - w]`. Text height is intrinsic, so text
    /// only keeps `y` in `[0, H]`.
    pub fn normalize(&mut self, canvas: Canvas) {
        let (cw, ch) = (canvas.w(), canvas.h());
        let min_w = self.kind().min_width();
        match self {
            Self::Text(t) => {
                t.w = clamp(t.w, min_w, cw);
                t.x = clamp(t.x, 0.0, (cw - t.w).max(0.0));
                t.y = clamp(t.y, 0.0, ch);
                t.font_size = clamp(t.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE);
                t.font_weight = t.font_weight.clamp(100, 900);
            }
            Self::Image(i) => {
                i.w = clamp(i.w, MIN_IMAGE_SIZE, cw);
                i.h = clamp(i.h, MIN_IMAGE_SIZE, ch);
                i.x = clamp(i.x, 0.0, (cw - i.w).max(0.0));
                i.y = clamp(i.y, 0.0, (ch - i.h).max(0.0));
            }
        }
    }

    /// Builder-style [`Element::normalize`].
    #[must_use]
    pub fn normalized(mut self, canvas: Canvas) -> Self {
        self.normalize(canvas);
        self
    }
}
