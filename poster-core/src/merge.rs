//! Merge reconciler: persisted overrides over generated defaults.
//!
//! The merge is per field, not per key: a stored `title` that only carries a
//! `color` still inherits every other field from the defaults. This is what
//! keeps documents saved against an older canvas or schema loadable without
//! explicit migration.

use std::collections::BTreeMap;

use crate::element::{Canvas, Element, ElementKey};
use crate::layout::Layout;
use crate::schema::{
    ElementPatch, FieldsPatch, LayoutDocument, LayoutPatch, PosterFields, LAYOUT_VERSION,
};

/// Apply one element's overrides to its default.
///
/// Fields that do not exist for the element's kind are ignored.
#[must_use]
pub fn merge_element(default: &Element, patch: &ElementPatch) -> Element {
    let mut merged = default.clone();
    match &mut merged {
        Element::Text(t) => {
            t.x = patch.x.unwrap_or(t.x);
            t.y = patch.y.unwrap_or(t.y);
            t.w = patch.w.unwrap_or(t.w);
            t.font_size = patch.font_size.unwrap_or(t.font_size);
            t.font_weight = patch.font_weight.unwrap_or(t.font_weight);
            if let Some(color) = &patch.color {
                t.color.clone_from(color);
            }
            if let Some(family) = &patch.font_family {
                t.font_family.clone_from(family);
            }
            t.align = patch.align.unwrap_or(t.align);
        }
        Element::Image(i) => {
            i.x = patch.x.unwrap_or(i.x);
            i.y = patch.y.unwrap_or(i.y);
            i.w = patch.w.unwrap_or(i.w);
            i.h = patch.h.unwrap_or(i.h);
        }
    }
    merged
}

/// Merge persisted element overrides over a default layout.
///
/// Every key of `defaults` is present in the result; keys only present in
/// `persisted` are dropped. The result is normalized against `canvas`.
#[must_use]
pub fn merge_layout(
    defaults: &Layout,
    persisted: Option<&BTreeMap<ElementKey, ElementPatch>>,
    canvas: Canvas,
) -> Layout {
    let mut merged = Layout::new();
    for (key, default) in defaults.iter() {
        let element = match persisted.and_then(|p| p.get(&key)) {
            Some(patch) => merge_element(default, patch),
            None => default.clone(),
        };
        merged.insert(key, element.normalized(canvas));
    }
    merged
}

fn merge_fields(defaults: &PosterFields, patch: Option<&FieldsPatch>) -> PosterFields {
    let Some(patch) = patch else {
        return defaults.clone();
    };
    PosterFields {
        poster_date: patch
            .poster_date
            .clone()
            .unwrap_or_else(|| defaults.poster_date.clone()),
        issue_no: patch
            .issue_no
            .clone()
            .unwrap_or_else(|| defaults.issue_no.clone()),
    }
}

/// Merge a persisted document over a default document.
///
/// The stored canvas is ignored in favour of `defaults.canvas` (the active
/// template); assets are taken wholesale when present.
#[must_use]
pub fn merge_document(defaults: &LayoutDocument, persisted: Option<&LayoutPatch>) -> LayoutDocument {
    let Some(patch) = persisted else {
        return defaults.clone();
    };
    if let Some(version) = patch.version {
        if version != LAYOUT_VERSION {
            tracing::debug!("Merging layout saved as version {version} into {LAYOUT_VERSION}");
        }
    }
    if let Some(saved) = patch.canvas {
        if saved != defaults.canvas {
            tracing::debug!(
                "Layout saved for {}x{} loaded on {}x{}",
                saved.width,
                saved.height,
                defaults.canvas.width,
                defaults.canvas.height
            );
        }
    }
    LayoutDocument {
        version: LAYOUT_VERSION,
        fields: merge_fields(&defaults.fields, patch.fields.as_ref()),
        elements: merge_layout(&defaults.elements, Some(&patch.elements), defaults.canvas),
        assets: patch
            .assets
            .clone()
            .unwrap_or_else(|| defaults.assets.clone()),
        canvas: defaults.canvas,
    }
}

/// Build the document for `canvas` from defaults plus an optional stored patch.
#[must_use]
pub fn reconcile(canvas: Canvas, persisted: Option<&LayoutPatch>) -> LayoutDocument {
    merge_document(&LayoutDocument::new(canvas), persisted)
}
