//! The element map and the proportional default layout generator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::{
    Align, Canvas, Element, ElementKey, ImageElement, TextElement, MIN_IMAGE_SIZE,
};
use crate::geometry::clamp;

/// Every element of a poster, keyed and ordered by slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    elements: BTreeMap<ElementKey, Element>,
}

impl Layout {
    /// An empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an element by key.
    #[must_use]
    pub fn get(&self, key: ElementKey) -> Option<&Element> {
        self.elements.get(&key)
    }

    /// Get a mutable reference to an element by key.
    pub fn get_mut(&mut self, key: ElementKey) -> Option<&mut Element> {
        self.elements.get_mut(&key)
    }

    /// Insert or replace an element.
    ///
    /// Returns `false` (and leaves the layout untouched) when the element's
    /// kind does not match the key's kind.
    pub fn insert(&mut self, key: ElementKey, element: Element) -> bool {
        if element.kind() != key.kind() {
            tracing::warn!("Rejected {:?} element for key {key}", element.kind());
            return false;
        }
        self.elements.insert(key, element);
        true
    }

    /// Iterate elements in paint order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (ElementKey, &Element)> {
        self.elements.iter().map(|(k, e)| (*k, e))
    }

    /// Number of elements present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Clamp every element into `canvas`.
    pub fn normalize(&mut self, canvas: Canvas) {
        for element in self.elements.values_mut() {
            element.normalize(canvas);
        }
    }
}

fn text_block(x: f32, y: f32, w: f32, font_size: f32, font_weight: u16, color: &str) -> Element {
    Element::Text(TextElement {
        x,
        y,
        w,
        font_size,
        font_weight,
        color: color.to_string(),
        font_family: "sans-serif".to_string(),
        align: Align::Left,
    })
}

fn image_slot(x: f32, y: f32, w: f32, h: f32) -> Element {
    Element::Image(ImageElement { x, y, w, h })
}

/// Compute the default geometry of every element for a canvas.
///
/// Each position and size is a fixed proportion of the canvas, so any
/// template size gets a visually consistent starting point. The result is
/// already normalized.
#[must_use]
pub fn default_layout(canvas: Canvas) -> Layout {
    let (w, h) = (canvas.w(), canvas.h());

    let pad = (w * 0.074).round();
    let content_w = w - 2.0 * pad;
    let half_w = (content_w / 2.0).floor();

    let meta_font = clamp((h * 0.018).round(), 12.0, 40.0);
    let title_font = clamp((h * 0.047).round(), 18.0, 96.0);
    let body_font = clamp((h * 0.025).round(), 12.0, 60.0);

    let mut layout = Layout::new();

    let meta_y = (h * 0.03).round();
    layout.insert(
        ElementKey::Date,
        text_block(pad, meta_y, half_w, meta_font, 400, "#555555"),
    );
    let mut issue = text_block(pad + half_w, meta_y, half_w, meta_font, 400, "#555555");
    if let Some(t) = issue.as_text_mut() {
        t.align = Align::Right;
    }
    layout.insert(ElementKey::Issue, issue);

    layout.insert(
        ElementKey::Title,
        text_block(pad, (h * 0.07).round(), content_w, title_font, 700, "#111111"),
    );
    layout.insert(
        ElementKey::Cover,
        image_slot(pad, (h * 0.16).round(), content_w, (h * 0.30).round()),
    );
    layout.insert(
        ElementKey::Content,
        text_block(pad, (h * 0.48).round(), content_w, body_font, 400, "#111111"),
    );

    // Thumbnail grid: two columns beneath the cover.
    let gap = (w.min(h) * 0.015).round();
    let top = (h * 0.60).round();
    let col_w = ((content_w - gap) / 2.0).floor();
    let row_h = (h * 0.11).round();
    let pitch = row_h + gap;
    let grid = [
        (ElementKey::Img2, 0.0, 0.0),
        (ElementKey::Img3, 1.0, 0.0),
        (ElementKey::Img4, 0.0, 1.0),
        (ElementKey::Img5, 1.0, 1.0),
    ];
    for (key, col, row) in grid {
        layout.insert(
            key,
            image_slot(pad + col * (col_w + gap), top + row * pitch, col_w, row_h),
        );
    }

    // Overflow slot stacks below the second row and is shortened to fit.
    let overflow_y = clamp(top + 2.0 * pitch, 0.0, h - MIN_IMAGE_SIZE);
    let overflow_h = clamp(row_h, MIN_IMAGE_SIZE, h - overflow_y);
    layout.insert(
        ElementKey::Img6,
        image_slot(pad, overflow_y, col_w, overflow_h),
    );

    layout.normalize(canvas);
    layout
}
