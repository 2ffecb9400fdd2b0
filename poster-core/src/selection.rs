//! Selected element and the property panel bound to it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{parse_font_weight, Align, Canvas, Element, ElementKey, ElementKind};
use crate::layout::Layout;
use crate::{CoreError, CoreResult};

/// One editable field of the property panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyField {
    /// Left edge.
    X,
    /// Top edge.
    Y,
    /// Width.
    W,
    /// Height (images only).
    H,
    /// Font size (text only).
    FontSize,
    /// Font weight (text only).
    FontWeight,
    /// Fill colour (text only).
    Color,
    /// Font family (text only).
    FontFamily,
    /// Alignment (text only).
    Align,
}

impl PropertyField {
    /// Every field in panel order.
    pub const ALL: [Self; 9] = [
        Self::X,
        Self::Y,
        Self::W,
        Self::H,
        Self::FontSize,
        Self::FontWeight,
        Self::Color,
        Self::FontFamily,
        Self::Align,
    ];

    /// Whether the panel shows this field for an element kind.
    #[must_use]
    pub const fn visible_for(self, kind: ElementKind) -> bool {
        match self {
            Self::X | Self::Y | Self::W => true,
            Self::H => matches!(kind, ElementKind::Image),
            _ => matches!(kind, ElementKind::Text),
        }
    }

    /// The serialized name of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::W => "w",
            Self::H => "h",
            Self::FontSize => "fontSize",
            Self::FontWeight => "fontWeight",
            Self::Color => "color",
            Self::FontFamily => "fontFamily",
            Self::Align => "align",
        }
    }
}

impl fmt::Display for PropertyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyField {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CoreError::UnknownProperty(s.to_string()))
    }
}

/// Fields the panel shows for an element kind, in panel order.
#[must_use]
pub fn visible_fields(kind: ElementKind) -> Vec<PropertyField> {
    PropertyField::ALL
        .into_iter()
        .filter(|f| f.visible_for(kind))
        .collect()
}

/// A typed edit to one element field.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEdit {
    /// Set the left edge.
    X(f32),
    /// Set the top edge.
    Y(f32),
    /// Set the width.
    W(f32),
    /// Set the height.
    H(f32),
    /// Set the font size.
    FontSize(f32),
    /// Set the font weight.
    FontWeight(u16),
    /// Set the fill colour.
    Color(String),
    /// Set the font family.
    FontFamily(String),
    /// Set the alignment.
    Align(Align),
}

impl PropertyEdit {
    /// Parse raw panel input for `field`.
    ///
    /// Returns `None` for input the field cannot take (non-numeric text in a
    /// numeric field, an empty colour, an unknown alignment).
    #[must_use]
    pub fn parse(field: PropertyField, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let number = || raw.parse::<f32>().ok().filter(|v| v.is_finite());
        let text = || (!raw.is_empty()).then(|| raw.to_string());
        match field {
            PropertyField::X => number().map(Self::X),
            PropertyField::Y => number().map(Self::Y),
            PropertyField::W => number().map(Self::W),
            PropertyField::H => number().map(Self::H),
            PropertyField::FontSize => number().map(Self::FontSize),
            PropertyField::FontWeight => parse_font_weight(raw).map(Self::FontWeight),
            PropertyField::Color => text().map(Self::Color),
            PropertyField::FontFamily => text().map(Self::FontFamily),
            PropertyField::Align => Align::parse(raw).map(Self::Align),
        }
    }

    /// The field this edit targets.
    #[must_use]
    pub const fn field(&self) -> PropertyField {
        match self {
            Self::X(_) => PropertyField::X,
            Self::Y(_) => PropertyField::Y,
            Self::W(_) => PropertyField::W,
            Self::H(_) => PropertyField::H,
            Self::FontSize(_) => PropertyField::FontSize,
            Self::FontWeight(_) => PropertyField::FontWeight,
            Self::Color(_) => PropertyField::Color,
            Self::FontFamily(_) => PropertyField::FontFamily,
            Self::Align(_) => PropertyField::Align,
        }
    }
}

/// Apply an edit to an element and re-normalize it.
///
/// Returns `false` without touching the element when the field is hidden for
/// its kind.
pub fn apply_edit(element: &mut Element, edit: &PropertyEdit, canvas: Canvas) -> bool {
    if !edit.field().visible_for(element.kind()) {
        return false;
    }
    let mut r = element.bounds();
    match edit {
        PropertyEdit::X(v) => r.x = *v,
        PropertyEdit::Y(v) => r.y = *v,
        PropertyEdit::W(v) => r.w = *v,
        PropertyEdit::H(v) => r.h = *v,
        PropertyEdit::FontSize(_)
        | PropertyEdit::FontWeight(_)
        | PropertyEdit::Color(_)
        | PropertyEdit::FontFamily(_)
        | PropertyEdit::Align(_) => {}
    }
    element.set_bounds(r);
    if let Some(t) = element.as_text_mut() {
        match edit {
            PropertyEdit::FontSize(v) => t.font_size = *v,
            PropertyEdit::FontWeight(v) => t.font_weight = *v,
            PropertyEdit::Color(v) => t.color.clone_from(v),
            PropertyEdit::FontFamily(v) => t.font_family.clone_from(v),
            PropertyEdit::Align(v) => t.align = *v,
            _ => {}
        }
    }
    element.normalize(canvas);
    true
}

fn display_number(v: f32) -> String {
    // adding zero turns -0 into 0
    format!("{}", v.round() + 0.0)
}

/// String values shown in the property panel.
///
/// `None` means the field is hidden for the selected element's kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyForm {
    /// Left edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Top edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<String>,
    /// Height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<String>,
    /// Font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    /// Font weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    /// Fill colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Alignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

impl PropertyForm {
    /// Populate the form from an element.
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        let b = element.bounds();
        let mut form = Self {
            x: Some(display_number(b.x)),
            y: Some(display_number(b.y)),
            w: Some(display_number(b.w)),
            ..Self::default()
        };
        match element {
            Element::Text(t) => {
                form.font_size = Some(display_number(t.font_size));
                form.font_weight = Some(t.font_weight.to_string());
                form.color = Some(t.color.clone());
                form.font_family = Some(t.font_family.clone());
                form.align = Some(t.align.as_str().to_string());
            }
            Element::Image(i) => form.h = Some(display_number(i.h)),
        }
        form
    }

    /// Value shown for a field, if visible.
    #[must_use]
    pub fn get(&self, field: PropertyField) -> Option<&str> {
        let value = match field {
            PropertyField::X => &self.x,
            PropertyField::Y => &self.y,
            PropertyField::W => &self.w,
            PropertyField::H => &self.h,
            PropertyField::FontSize => &self.font_size,
            PropertyField::FontWeight => &self.font_weight,
            PropertyField::Color => &self.color,
            PropertyField::FontFamily => &self.font_family,
            PropertyField::Align => &self.align,
        };
        value.as_deref()
    }
}

/// The currently selected element and its panel contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    key: ElementKey,
    form: PropertyForm,
}

impl SelectionState {
    /// Selection of `key`, with the form populated from `layout`.
    #[must_use]
    pub fn new(key: ElementKey, layout: &Layout) -> Self {
        let mut state = Self {
            key,
            form: PropertyForm::default(),
        };
        state.refresh(layout);
        state
    }

    /// Selected key.
    #[must_use]
    pub const fn key(&self) -> ElementKey {
        self.key
    }

    /// Current form values.
    #[must_use]
    pub fn form(&self) -> &PropertyForm {
        &self.form
    }

    /// Change the selection and repopulate the form.
    pub fn select(&mut self, key: ElementKey, layout: &Layout) {
        self.key = key;
        self.refresh(layout);
    }

    /// Repopulate the form from the selected element.
    pub fn refresh(&mut self, layout: &Layout) {
        self.form = layout
            .get(self.key)
            .map(PropertyForm::from_element)
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layout;

    #[test]
    fn visibility_by_kind() {
        let text = visible_fields(ElementKind::Text);
        assert!(!text.contains(&PropertyField::H));
        assert!(text.contains(&PropertyField::FontSize));
        assert_eq!(
            visible_fields(ElementKind::Image),
            vec![
                PropertyField::X,
                PropertyField::Y,
                PropertyField::W,
                PropertyField::H
            ]
        );
    }

    #[test]
    fn form_hides_fields_by_kind() {
        let layout = default_layout(Canvas::default());
        let text = SelectionState::new(ElementKey::Title, &layout);
        assert!(text.form().h.is_none());
        assert_eq!(text.form().get(PropertyField::FontWeight), Some("700"));
        let image = SelectionState::new(ElementKey::Cover, &layout);
        assert!(image.form().color.is_none());
        assert!(image.form().h.is_some());
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        assert_eq!(PropertyEdit::parse(PropertyField::X, "abc"), None);
        assert_eq!(PropertyEdit::parse(PropertyField::X, "NaN"), None);
        assert_eq!(
            PropertyEdit::parse(PropertyField::W, " 120 "),
            Some(PropertyEdit::W(120.0))
        );
    }

    #[test]
    fn edit_is_clamped() {
        let canvas = Canvas::default();
        let mut layout = default_layout(canvas);
        let title = layout.get_mut(ElementKey::Title).expect("title");
        assert!(apply_edit(title, &PropertyEdit::FontSize(999.0), canvas));
        assert!(apply_edit(title, &PropertyEdit::X(-20.0), canvas));
        let t = title.as_text().expect("text");
        assert!((t.font_size - 200.0).abs() < f32::EPSILON);
        assert!(t.x.abs() < f32::EPSILON);
    }

    #[test]
    fn hidden_field_is_ignored() {
        let canvas = Canvas::default();
        let mut layout = default_layout(canvas);
        let before = layout.get(ElementKey::Cover).cloned();
        let cover = layout.get_mut(ElementKey::Cover).expect("cover");
        assert!(!apply_edit(cover, &PropertyEdit::Color("#fff".into()), canvas));
        assert_eq!(layout.get(ElementKey::Cover).cloned(), before);
    }

    #[test]
    fn refresh_follows_model() {
        let canvas = Canvas::default();
        let mut layout = default_layout(canvas);
        let mut sel = SelectionState::new(ElementKey::Cover, &layout);
        if let Some(el) = layout.get_mut(ElementKey::Cover) {
            apply_edit(el, &PropertyEdit::X(12.4), canvas);
        }
        sel.refresh(&layout);
        assert_eq!(sel.form().x.as_deref(), Some("12"));
    }

    #[test]
    fn field_names_round_trip() {
        for field in PropertyField::ALL {
            assert_eq!(field.as_str().parse::<PropertyField>().ok(), Some(field));
        }
    }
}
