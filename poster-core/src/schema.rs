//! The persisted layout document and its lenient, partial read form.
//!
//! Documents are always written complete ([`LayoutDocument`]) but read as a
//! [`LayoutPatch`]: documents saved against an older canvas size or schema
//! may lack keys or fields, carry unknown keys, or hold numbers as strings.
//! Anything unusable is treated as absent and filled from defaults by the
//! merge reconciler.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::assets::{AssetSelection, MediaId};
use crate::element::{parse_font_weight, Align, Canvas, Element, ElementKey};
use crate::layout::{default_layout, Layout};
use crate::{CoreError, CoreResult};

/// Current layout document schema version.
pub const LAYOUT_VERSION: u32 = 1;

/// Free-text poster fields stored with the layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PosterFields {
    /// Date printed on the poster.
    pub poster_date: String,
    /// Issue number printed on the poster.
    pub issue_no: String,
}

/// The complete persisted description of one poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Schema version.
    pub version: u32,
    /// Free-text fields.
    pub fields: PosterFields,
    /// Element geometry and style.
    pub elements: Layout,
    /// Selected media in slot order.
    pub assets: AssetSelection,
    /// Canvas the geometry is expressed in.
    pub canvas: Canvas,
}

impl LayoutDocument {
    /// A fresh document with default geometry for `canvas`.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            version: LAYOUT_VERSION,
            fields: PosterFields::default(),
            elements: default_layout(canvas),
            assets: AssetSelection::new(),
            canvas,
        }
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Serialize the document to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> CoreResult<Value> {
        serde_json::to_value(self).map_err(CoreError::Serialization)
    }
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

/// Per-field overrides for one element. Absent fields keep their default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// Left edge.
    #[serde(deserialize_with = "lenient_f32")]
    pub x: Option<f32>,
    /// Top edge.
    #[serde(deserialize_with = "lenient_f32")]
    pub y: Option<f32>,
    /// Width.
    #[serde(deserialize_with = "lenient_f32")]
    pub w: Option<f32>,
    /// Height (image slots only).
    #[serde(deserialize_with = "lenient_f32")]
    pub h: Option<f32>,
    /// Font size (text only).
    #[serde(deserialize_with = "lenient_f32")]
    pub font_size: Option<f32>,
    /// Font weight (text only).
    #[serde(deserialize_with = "lenient_weight")]
    pub font_weight: Option<u16>,
    /// Fill colour (text only).
    #[serde(deserialize_with = "lenient_string")]
    pub color: Option<String>,
    /// Font family (text only).
    #[serde(deserialize_with = "lenient_string")]
    pub font_family: Option<String>,
    /// Alignment (text only).
    #[serde(deserialize_with = "lenient_align")]
    pub align: Option<Align>,
}

impl From<&Element> for ElementPatch {
    fn from(element: &Element) -> Self {
        match element {
            Element::Text(t) => Self {
                x: Some(t.x),
                y: Some(t.y),
                w: Some(t.w),
                h: None,
                font_size: Some(t.font_size),
                font_weight: Some(t.font_weight),
                color: Some(t.color.clone()),
                font_family: Some(t.font_family.clone()),
                align: Some(t.align),
            },
            Element::Image(i) => Self {
                x: Some(i.x),
                y: Some(i.y),
                w: Some(i.w),
                h: Some(i.h),
                ..Self::default()
            },
        }
    }
}

/// Per-field overrides for the poster fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldsPatch {
    /// Poster date override.
    #[serde(deserialize_with = "lenient_string")]
    pub poster_date: Option<String>,
    /// Issue number override.
    #[serde(deserialize_with = "lenient_string")]
    pub issue_no: Option<String>,
}

/// A persisted layout document read leniently.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutPatch {
    /// Stored schema version, if readable.
    #[serde(deserialize_with = "lenient_u32")]
    pub version: Option<u32>,
    /// Stored poster fields.
    #[serde(deserialize_with = "lenient_fields")]
    pub fields: Option<FieldsPatch>,
    /// Stored element overrides; unknown keys are dropped.
    #[serde(deserialize_with = "lenient_elements")]
    pub elements: BTreeMap<ElementKey, ElementPatch>,
    /// Stored media selection, if present.
    #[serde(deserialize_with = "lenient_assets")]
    pub assets: Option<AssetSelection>,
    /// Canvas the document was saved against.
    #[serde(deserialize_with = "lenient_canvas")]
    pub canvas: Option<Canvas>,
}

impl LayoutPatch {
    /// Read a patch from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        serde_json::from_value(value).map_err(CoreError::Serialization)
    }

    /// Read a patch from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a JSON object.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Serialization)
    }

    /// Whether the patch overrides nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_none() && self.elements.is_empty() && self.assets.is_none()
    }
}

impl From<&LayoutDocument> for LayoutPatch {
    fn from(doc: &LayoutDocument) -> Self {
        Self {
            version: Some(doc.version),
            fields: Some(FieldsPatch {
                poster_date: Some(doc.fields.poster_date.clone()),
                issue_no: Some(doc.fields.issue_no.clone()),
            }),
            elements: doc
                .elements
                .iter()
                .map(|(key, el)| (key, ElementPatch::from(el)))
                .collect(),
            assets: Some(doc.assets.clone()),
            canvas: Some(doc.canvas),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_of(value: &Value) -> Option<f32> {
    let n = match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn lenient_f32<'de, D>(d: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(number_of))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_u32<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value
        .as_ref()
        .and_then(number_of)
        .filter(|v| *v >= 0.0)
        .map(|v| v as u32))
}

fn lenient_weight<'de, D>(d: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => parse_font_weight(&n.to_string()),
        Some(Value::String(s)) => parse_font_weight(&s),
        _ => None,
    })
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_align<'de, D>(d: D) -> Result<Option<Align>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(Align::parse))
}

fn lenient_fields<'de, D>(d: D) -> Result<Option<FieldsPatch>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_elements<'de, D>(d: D) -> Result<BTreeMap<ElementKey, ElementPatch>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    let Some(Value::Object(map)) = value else {
        return Ok(BTreeMap::new());
    };
    let mut elements = BTreeMap::new();
    for (name, raw) in map {
        let Ok(key) = name.parse::<ElementKey>() else {
            tracing::debug!("Ignoring unknown layout key {name}");
            continue;
        };
        match serde_json::from_value::<ElementPatch>(raw) {
            Ok(patch) => {
                elements.insert(key, patch);
            }
            Err(e) => tracing::debug!("Ignoring unreadable layout entry {key}: {e}"),
        }
    }
    Ok(elements)
}

fn lenient_assets<'de, D>(d: D) -> Result<Option<AssetSelection>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    let Some(ids) = value
        .as_ref()
        .and_then(|v| v.get("selectedMediaIds"))
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };
    let ids = ids.iter().filter_map(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<MediaId>().ok(),
        _ => None,
    });
    Ok(Some(AssetSelection::from_ids(ids)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_canvas<'de, D>(d: D) -> Result<Option<Canvas>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    let Some(value) = value else {
        return Ok(None);
    };
    let width = value.get("width").and_then(number_of);
    let height = value.get("height").and_then(number_of);
    Ok(match (width, height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(Canvas::new(w as u32, h as u32)),
        _ => None,
    })
}
