//! WebAssembly bindings for poster-core.
//!
//! This module exposes the editor session to the browser edit surface.

use wasm_bindgen::prelude::*;

use crate::geometry::Point;
use crate::schema::LayoutPatch;
use crate::{Canvas, EditorSession, ElementKey, Handle};

/// Initialize the poster WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    session: EditorSession,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor for a template canvas.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            session: EditorSession::new(Canvas::new(width, height)),
        }
    }

    /// Fit the preview into its container.
    #[wasm_bindgen(js_name = setContainerSize)]
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.session.set_container_size(width, height);
    }

    /// Current preview scale.
    #[wasm_bindgen(js_name = getScale)]
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.session.viewport().scale
    }

    /// Select an element by key.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown key or mid-interaction.
    pub fn select(&mut self, key: &str) -> Result<(), String> {
        let key: ElementKey = key.parse().map_err(|e: crate::CoreError| e.to_string())?;
        self.session.select(key).map_err(|e| e.to_string())
    }

    /// Pointer-down at a screen position. Returns the hit as JSON, or
    /// `"null"` when nothing was hit.
    ///
    /// # Errors
    ///
    /// Returns an error string while an interaction is active.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<String, String> {
        let hit = self
            .session
            .pointer_down(Point::new(x, y))
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&hit).map_err(|e| e.to_string())
    }

    /// Pointer-down on a named handle of an element.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown names, hidden handles or
    /// mid-interaction.
    #[wasm_bindgen(js_name = pointerDownOnHandle)]
    pub fn pointer_down_on_handle(
        &mut self,
        key: &str,
        handle: &str,
        x: f32,
        y: f32,
    ) -> Result<(), String> {
        let key: ElementKey = key.parse().map_err(|e: crate::CoreError| e.to_string())?;
        let handle: Handle = handle
            .parse()
            .map_err(|e: crate::CoreError| e.to_string())?;
        self.session
            .pointer_down_on_handle(key, handle, Point::new(x, y))
            .map_err(|e| e.to_string())
    }

    /// Pointer moved. Returns whether the layout changed.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.session.pointer_move(Point::new(x, y)).is_some()
    }

    /// Pointer released.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.session.pointer_up();
    }

    /// Apply raw panel input. Returns whether the element changed.
    ///
    /// # Errors
    ///
    /// Returns an error string for an unknown field name.
    #[wasm_bindgen(js_name = setProperty)]
    pub fn set_property(&mut self, field: &str, value: &str) -> Result<bool, String> {
        self.session
            .set_property(field, value)
            .map_err(|e| e.to_string())
    }

    /// Bind a media item to the next free slot; returns the slot.
    ///
    /// # Errors
    ///
    /// Returns an error string when every slot is taken.
    #[wasm_bindgen(js_name = selectMedia)]
    pub fn select_media(&mut self, id: i64) -> Result<usize, String> {
        self.session.select_media(id).map_err(|e| e.to_string())
    }

    /// Unbind a media item. Returns whether it was bound.
    #[wasm_bindgen(js_name = removeMedia)]
    pub fn remove_media(&mut self, id: i64) -> bool {
        self.session.remove_media(id).is_some()
    }

    /// The layout document as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if serialization fails.
    #[wasm_bindgen(js_name = documentJson)]
    pub fn document_json(&self) -> Result<String, String> {
        self.session.document().to_json().map_err(|e| e.to_string())
    }

    /// Merge a stored document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error string if the input is not JSON.
    #[wasm_bindgen(js_name = loadDocumentJson)]
    pub fn load_document_json(&mut self, json: &str) -> Result<(), String> {
        let patch = LayoutPatch::from_json(json).map_err(|e| e.to_string())?;
        self.session.load_persisted(Some(&patch));
        Ok(())
    }

    /// Property panel values as JSON.
    #[wasm_bindgen(js_name = formJson)]
    #[must_use]
    pub fn form_json(&self) -> String {
        serde_json::to_string(self.session.form()).unwrap_or_default()
    }

    /// Edit surface boxes as JSON.
    #[wasm_bindgen(js_name = editBoxesJson)]
    #[must_use]
    pub fn edit_boxes_json(&self) -> String {
        serde_json::to_string(&self.session.edit_boxes()).unwrap_or_default()
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self::new(canvas.width, canvas.height)
    }
}
