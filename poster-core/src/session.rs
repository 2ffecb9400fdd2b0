//! Editor session: the single owner of the live layout document.
//!
//! The session ties the layout model, selection, interaction machine and
//! viewport together. Every mutation of the document goes through it, so the
//! property form is always refreshed after the model changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assets::MediaId;
use crate::content::PostContent;
use crate::element::{Canvas, ElementKey, ElementKind};
use crate::geometry::{Point, Rect, Viewport};
use crate::interaction::{Handle, InteractionMachine};
use crate::layout::{default_layout, Layout};
use crate::merge::reconcile;
use crate::schema::{LayoutDocument, LayoutPatch, PosterFields};
use crate::selection::{apply_edit, PropertyEdit, PropertyField, PropertyForm, SelectionState};
use crate::text;
use crate::{CoreError, CoreResult};

/// Side of a handle's square hit target in screen pixels.
pub const HANDLE_SIZE: f32 = 12.0;

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Hit {
    /// An element body; the element is selected and being moved.
    Body {
        /// Element hit.
        key: ElementKey,
    },
    /// A resize handle of the selected element.
    Handle {
        /// Element being resized.
        key: ElementKey,
        /// Handle hit.
        handle: Handle,
    },
}

/// Screen-space hit target of one resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleBox {
    /// Which handle.
    pub handle: Handle,
    /// Square around the handle anchor.
    pub rect: Rect,
}

/// Screen-space box the edit surface draws for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditBox {
    /// Element key.
    pub key: ElementKey,
    /// Element kind.
    pub kind: ElementKind,
    /// Bounds in screen pixels.
    pub rect: Rect,
    /// Whether this is the selected element.
    pub selected: bool,
    /// Handle targets; empty unless selected.
    pub handles: Vec<HandleBox>,
}

/// Live editing state for one poster.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: LayoutDocument,
    selection: SelectionState,
    interaction: InteractionMachine,
    viewport: Viewport,
    container: Option<(f32, f32)>,
    content: PostContent,
}

impl EditorSession {
    /// A session showing the default layout for `canvas`.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_document(LayoutDocument::new(canvas))
    }

    /// A session for `canvas` with a stored document merged over the defaults.
    #[must_use]
    pub fn from_persisted(canvas: Canvas, persisted: Option<&LayoutPatch>) -> Self {
        Self::with_document(reconcile(canvas, persisted))
    }

    fn with_document(document: LayoutDocument) -> Self {
        let selection = SelectionState::new(ElementKey::Title, &document.elements);
        Self {
            document,
            selection,
            interaction: InteractionMachine::new(),
            viewport: Viewport::default(),
            container: None,
            content: PostContent::default(),
        }
    }

    /// Active canvas.
    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.document.canvas
    }

    /// The document as it would be saved.
    #[must_use]
    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    /// Element geometry and style.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.document.elements
    }

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Post text shown in the text blocks.
    #[must_use]
    pub fn content(&self) -> &PostContent {
        &self.content
    }

    /// Selected element key.
    #[must_use]
    pub fn selected(&self) -> ElementKey {
        self.selection.key()
    }

    /// Property panel values for the selected element.
    #[must_use]
    pub fn form(&self) -> &PropertyForm {
        self.selection.form()
    }

    /// Whether a move or resize is in progress.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.interaction.is_capturing()
    }

    /// Replace the document with `persisted` merged over the defaults for the
    /// current canvas.
    pub fn load_persisted(&mut self, persisted: Option<&LayoutPatch>) {
        self.interaction.cancel();
        self.document = reconcile(self.canvas(), persisted);
        self.selection.refresh(&self.document.elements);
        debug!(
            "Loaded layout ({} elements, {} assets)",
            self.document.elements.len(),
            self.document.assets.len()
        );
    }

    /// Regenerate element geometry from defaults. Fields and assets are kept.
    pub fn reset_to_defaults(&mut self) {
        self.interaction.cancel();
        self.document.elements = default_layout(self.canvas());
        self.selection.refresh(&self.document.elements);
        debug!("Layout reset to defaults");
    }

    /// Switch to another template canvas.
    ///
    /// Element geometry is rebuilt from the new canvas's defaults; fields and
    /// asset bindings carry over.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.interaction.cancel();
        let canvas = Canvas::new(canvas.width, canvas.height);
        let mut document = LayoutDocument::new(canvas);
        document.fields = std::mem::take(&mut self.document.fields);
        document.assets = std::mem::take(&mut self.document.assets);
        self.document = document;
        if let Some((w, h)) = self.container {
            self.viewport = Viewport::fitted(w, h, canvas);
        }
        self.selection.refresh(&self.document.elements);
        debug!("Canvas set to {}x{}", canvas.width, canvas.height);
    }

    /// Fit the preview into a container; only ever scales down.
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container = Some((width, height));
        self.viewport = Viewport::fitted(width, height, self.canvas());
    }

    /// Set the preview scale directly.
    pub fn set_viewport_scale(&mut self, scale: f32) {
        self.viewport = Viewport::with_scale(scale);
    }

    /// Set the post text bound into the text blocks.
    pub fn set_content(&mut self, content: PostContent) {
        self.content = content;
    }

    /// Set the poster's own date and issue fields.
    pub fn set_fields(&mut self, fields: PosterFields) {
        self.document.fields = fields;
    }

    /// Select an element.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] while a pointer session runs.
    pub fn select(&mut self, key: ElementKey) -> CoreResult<()> {
        if let Some(active) = self.interaction.state().key() {
            return Err(CoreError::InteractionActive(active));
        }
        self.selection.select(key, &self.document.elements);
        Ok(())
    }

    /// Text a block displays: post content, or the key name as placeholder.
    #[must_use]
    pub fn text_for(&self, key: ElementKey) -> Option<String> {
        self.content
            .text_for(key, &self.document.fields)
            .map(|t| if t.trim().is_empty() { key.to_string() } else { t })
    }

    /// Canvas-space bounds of an element, with text height estimated.
    #[must_use]
    pub fn element_rect(&self, key: ElementKey) -> Option<Rect> {
        let element = self.document.elements.get(key)?;
        let mut rect = element.bounds();
        if let Some(t) = element.as_text() {
            let content = self.text_for(key).unwrap_or_default();
            rect.h = text::block_height(&content, t.font_size, t.font_weight, t.w);
        }
        Some(rect)
    }

    fn handle_boxes(&self, key: ElementKey) -> Vec<HandleBox> {
        let Some(rect) = self.element_rect(key) else {
            return Vec::new();
        };
        let screen = self.viewport.to_screen(rect);
        Handle::exposed_for(key.kind())
            .iter()
            .map(|&handle| {
                let anchor = handle.anchor(screen);
                HandleBox {
                    handle,
                    rect: Rect::centered(anchor.x, anchor.y, HANDLE_SIZE),
                }
            })
            .collect()
    }

    /// Screen-space boxes for the edit surface, in paint order.
    #[must_use]
    pub fn edit_boxes(&self) -> Vec<EditBox> {
        let selected = self.selected();
        self.document
            .elements
            .iter()
            .filter_map(|(key, element)| {
                let rect = self.viewport.to_screen(self.element_rect(key)?);
                let is_selected = key == selected;
                Some(EditBox {
                    key,
                    kind: element.kind(),
                    rect,
                    selected: is_selected,
                    handles: if is_selected {
                        self.handle_boxes(key)
                    } else {
                        Vec::new()
                    },
                })
            })
            .collect()
    }

    /// Pointer went down at a screen position.
    ///
    /// Handles of the selected element are tested first, then element bodies
    /// from top to bottom of the paint order. A body hit selects the element
    /// and starts moving it. Returns `None` when nothing was hit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] while a pointer session runs.
    pub fn pointer_down(&mut self, screen: Point) -> CoreResult<Option<Hit>> {
        if let Some(active) = self.interaction.state().key() {
            return Err(CoreError::InteractionActive(active));
        }
        let selected = self.selected();
        if let Some(hb) = self
            .handle_boxes(selected)
            .into_iter()
            .find(|hb| hb.rect.contains(screen))
        {
            self.pointer_down_on_handle(selected, hb.handle, screen)?;
            return Ok(Some(Hit::Handle {
                key: selected,
                handle: hb.handle,
            }));
        }
        let hit = self
            .document
            .elements
            .iter()
            .rev()
            .map(|(key, _)| key)
            .find(|&key| {
                self.element_rect(key)
                    .is_some_and(|r| self.viewport.to_screen(r).contains(screen))
            });
        match hit {
            Some(key) => {
                self.pointer_down_on(key, screen)?;
                Ok(Some(Hit::Body { key }))
            }
            None => Ok(None),
        }
    }

    /// Pointer went down on an element body: select it and start moving.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] while a pointer session runs.
    pub fn pointer_down_on(&mut self, key: ElementKey, screen: Point) -> CoreResult<()> {
        self.select(key)?;
        self.interaction
            .begin_move(key, screen, &self.document.elements)
    }

    /// Pointer went down on a resize handle: select and start resizing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] while a pointer session runs,
    /// or [`CoreError::HandleNotExposed`] for a vertical handle on text.
    pub fn pointer_down_on_handle(
        &mut self,
        key: ElementKey,
        handle: Handle,
        screen: Point,
    ) -> CoreResult<()> {
        if !Handle::exposed_for(key.kind()).contains(&handle) {
            return Err(CoreError::HandleNotExposed { key, handle });
        }
        self.select(key)?;
        self.interaction
            .begin_resize(key, handle, screen, &self.document.elements)
    }

    /// Pointer moved. Returns the key that changed, if any.
    pub fn pointer_move(&mut self, screen: Point) -> Option<ElementKey> {
        let canvas = self.canvas();
        let changed =
            self.interaction
                .pointer_move(screen, self.viewport, &mut self.document.elements, canvas);
        if changed.is_some() {
            self.selection.refresh(&self.document.elements);
        }
        changed
    }

    /// Pointer released. Always returns the machine to idle.
    pub fn pointer_up(&mut self) -> Option<ElementKey> {
        let key = self.interaction.pointer_up();
        self.selection.refresh(&self.document.elements);
        key
    }

    /// Apply a typed edit to the selected element.
    ///
    /// Returns `false` when the field is hidden for the element's kind.
    pub fn edit_property(&mut self, edit: &PropertyEdit) -> bool {
        let canvas = self.canvas();
        let key = self.selected();
        let applied = self
            .document
            .elements
            .get_mut(key)
            .is_some_and(|el| apply_edit(el, edit, canvas));
        self.selection.refresh(&self.document.elements);
        if applied {
            debug!("Edited {} on {key}", edit.field());
        }
        applied
    }

    /// Apply raw panel input to the selected element.
    ///
    /// Input the field cannot take leaves the element unchanged and returns
    /// `Ok(false)`; the form is refreshed either way.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProperty`] for an unknown field name.
    pub fn set_property(&mut self, field: &str, raw: &str) -> CoreResult<bool> {
        let field: PropertyField = field.parse()?;
        match PropertyEdit::parse(field, raw) {
            Some(edit) => Ok(self.edit_property(&edit)),
            None => {
                self.selection.refresh(&self.document.elements);
                Ok(false)
            }
        }
    }

    /// Bind a media item to the next free slot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlotsFull`] when every slot is taken.
    pub fn select_media(&mut self, id: MediaId) -> CoreResult<usize> {
        let slot = self.document.assets.select(id)?;
        debug!("Media {id} bound to slot {slot}");
        Ok(slot)
    }

    /// Unbind a media item; later items shift down one slot.
    pub fn remove_media(&mut self, id: MediaId) -> Option<usize> {
        let slot = self.document.assets.remove(id);
        if let Some(slot) = slot {
            debug!("Media {id} removed from slot {slot}");
        }
        slot
    }

    /// Bind or unbind a media item. Returns whether it is now bound.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SlotsFull`] when binding into a full list.
    pub fn toggle_media(&mut self, id: MediaId) -> CoreResult<bool> {
        self.document.assets.toggle(id)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}
