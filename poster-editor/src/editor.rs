//! Editor workflow around one publicity post.
//!
//! The [`Editor`] owns the [`EditorSession`] and talks to the [`Backend`]:
//! lookups on open, template switches, save, and export with auto-save
//! before the first upload. Every failure also ends up in [`Editor::status`].

use std::path::PathBuf;
use std::sync::Arc;

use poster_core::{CoreError, EditorSession, LayoutPatch, PosterFields, DEFAULT_CANVAS};
use poster_renderer::{EmbeddedImage, MediaSources, PosterExporter, RenderError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{
    Backend, BackendError, MediaAsset, PostId, RecordId, SaveLayoutRequest, TemplateType,
    TemplateTypeId,
};
use crate::config::EditorConfig;
use crate::status::Status;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors surfaced by the editor workflow.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Layout model rejected an operation.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Rendering the export failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Talking to the backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Save or export needs a template type.
    #[error("select a template type first")]
    MissingTemplate,
    /// The template type is not in the lookup list.
    #[error("unknown template type {0}")]
    UnknownTemplate(TemplateTypeId),
    /// Writing the local download failed.
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    /// A background render task did not finish.
    #[error("render task failed: {0}")]
    Task(String),
}

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Record the artifact is attached to.
    pub record_id: RecordId,
    /// Name of the artifact.
    pub filename: String,
    /// Where the local download was written.
    pub path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Size of the JPEG in bytes.
    pub size: usize,
}

/// Poster layout editor for a single post.
pub struct Editor {
    backend: Arc<dyn Backend>,
    config: EditorConfig,
    exporter: PosterExporter,
    post: PostId,
    session: EditorSession,
    templates: Vec<TemplateType>,
    media: Vec<MediaAsset>,
    template: Option<TemplateTypeId>,
    record_id: Option<RecordId>,
    status: Status,
}

impl Editor {
    /// Create an editor for `post` showing the default layout.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, config: EditorConfig, post: PostId) -> Self {
        let exporter = PosterExporter::new(config.export.clone());
        Self {
            backend,
            config,
            exporter,
            post,
            session: EditorSession::new(DEFAULT_CANVAS),
            templates: Vec::new(),
            media: Vec::new(),
            template: None,
            record_id: None,
            status: Status::Idle,
        }
    }

    /// Create and open an editor.
    ///
    /// Never fails: see [`Editor::open`] for how backend errors degrade it.
    pub async fn connect(backend: Arc<dyn Backend>, config: EditorConfig, post: PostId) -> Self {
        let mut editor = Self::new(backend, config, post);
        editor.open().await;
        editor
    }

    /// Post being edited.
    #[must_use]
    pub fn post(&self) -> PostId {
        self.post
    }

    /// Live editing state.
    #[must_use]
    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Live editing state, for pointer and property input.
    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    /// Template types from the last lookup.
    #[must_use]
    pub fn templates(&self) -> &[TemplateType] {
        &self.templates
    }

    /// Media palette from the last lookup.
    #[must_use]
    pub fn media(&self) -> &[MediaAsset] {
        &self.media
    }

    /// Selected template type.
    #[must_use]
    pub fn template(&self) -> Option<&TemplateType> {
        self.template
            .and_then(|id| self.templates.iter().find(|t| t.id == id))
    }

    /// Stored layout record, once loaded or saved.
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Fetch lookups and the stored layout.
    ///
    /// Failures only degrade the editor. A failed lookup leaves its list
    /// empty; a failed layout fetch keeps the default layout with no record.
    /// Either way the status carries the message and `false` is returned.
    pub async fn open(&mut self) -> bool {
        self.status = Status::Loading;
        let lookups_ok = self.load_lookups().await;
        if let Err(e) = self.load_layout().await {
            warn!("Post {} opened with default layout: {e}", self.post);
            self.session.load_persisted(None);
            return false;
        }
        if lookups_ok {
            self.status = Status::Ready;
        }
        lookups_ok
    }

    /// Fetch template types, event media and post content.
    ///
    /// Returns `false` if any lookup failed; the status then names the first
    /// failure and editing continues with what was loaded.
    pub async fn load_lookups(&mut self) -> bool {
        let mut failure: Option<String> = None;

        match self.backend.template_types().await {
            Ok(templates) => self.templates = templates,
            Err(e) => {
                warn!("Template type lookup failed: {e}");
                failure.get_or_insert(format!("could not load template types: {e}"));
            }
        }
        match self.backend.event_media(self.post).await {
            Ok(media) => self.media = media,
            Err(e) => {
                warn!("Media lookup for post {} failed: {e}", self.post);
                self.media.clear();
                failure.get_or_insert(format!("could not load media: {e}"));
            }
        }
        match self.backend.post_content(self.post).await {
            Ok(content) => self.session.set_content(content),
            Err(e) => {
                warn!("Content lookup for post {} failed: {e}", self.post);
                failure.get_or_insert(format!("could not load post content: {e}"));
            }
        }

        debug!(
            "Lookups: {} templates, {} media",
            self.templates.len(),
            self.media.len()
        );
        match failure {
            Some(message) => {
                self.status = Status::Error(message);
                false
            }
            None => true,
        }
    }

    /// Fetch the stored layout and merge it over the defaults.
    ///
    /// A stored template type that is in the lookup list becomes the selected
    /// template and supplies the canvas. A stored document that is not a JSON
    /// object is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn load_layout(&mut self) -> EditorResult<()> {
        let stored = match self.backend.load_layout(self.post).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(e.into())),
        };
        let Some(stored) = stored else {
            debug!("Post {} has no stored layout", self.post);
            self.session.load_persisted(None);
            return Ok(());
        };

        self.record_id = Some(stored.record_id);
        if let Some(id) = stored.template_type_id {
            match self.templates.iter().find(|t| t.id == id) {
                Some(template) => {
                    self.template = Some(id);
                    self.session.set_canvas(template.canvas());
                }
                None => warn!("Stored template type {id} is not available"),
            }
        }

        let patch = match LayoutPatch::from_value(stored.layout_document) {
            Ok(patch) => Some(patch),
            Err(e) => {
                warn!("Ignoring unreadable layout of post {}: {e}", self.post);
                None
            }
        };
        self.session.load_persisted(patch.as_ref());
        info!(
            "Loaded layout record {} for post {}",
            stored.record_id, self.post
        );
        Ok(())
    }

    /// Switch template type.
    ///
    /// Element geometry is rebuilt from the new canvas's defaults; fields and
    /// media bindings carry over. Selecting the current template is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownTemplate`] if `id` is not in the lookup
    /// list.
    pub fn select_template(&mut self, id: TemplateTypeId) -> EditorResult<()> {
        if self.template == Some(id) {
            return Ok(());
        }
        let Some(canvas) = self
            .templates
            .iter()
            .find(|t| t.id == id)
            .map(TemplateType::canvas)
        else {
            return Err(self.fail(EditorError::UnknownTemplate(id)));
        };
        self.template = Some(id);
        self.session.set_canvas(canvas);
        info!(
            "Template {id} selected ({}x{})",
            canvas.width, canvas.height
        );
        Ok(())
    }

    /// Set the poster's own date and issue fields.
    pub fn set_fields(&mut self, fields: PosterFields) {
        self.session.set_fields(fields);
    }

    /// Save the layout document and asset slot bindings.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MissingTemplate`] without a selected template,
    /// or the backend error. The in-memory document is unchanged either way.
    pub async fn save(&mut self) -> EditorResult<RecordId> {
        match self.try_save().await {
            Ok(record_id) => {
                self.status = Status::Saved { record_id };
                Ok(record_id)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn try_save(&mut self) -> EditorResult<RecordId> {
        let template_type_id = self.template.ok_or(EditorError::MissingTemplate)?;
        self.status = Status::Saving;
        let document = self.session.document();
        let request = SaveLayoutRequest {
            template_type_id,
            layout_document: document.to_value()?,
            asset_slots: document.assets.slot_bindings(),
        };
        let record_id = self.backend.save_layout(self.post, &request).await?;
        self.record_id = Some(record_id);
        info!("Saved layout of post {} as record {record_id}", self.post);
        Ok(record_id)
    }

    /// Render the poster, write it to the download directory and attach it
    /// to the layout record.
    ///
    /// The layout is saved first if it has no record yet; a failed save
    /// aborts the export.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MissingTemplate`] without a selected template,
    /// or the first save, render, write or upload error.
    pub async fn export(&mut self) -> EditorResult<ExportOutcome> {
        match self.try_export().await {
            Ok(outcome) => {
                self.status = Status::Exported {
                    filename: outcome.filename.clone(),
                };
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn try_export(&mut self) -> EditorResult<ExportOutcome> {
        let template = self.template().cloned().ok_or(EditorError::MissingTemplate)?;
        if !poster_renderer::raster_available() {
            return Err(RenderError::RasterUnavailable(
                "built without the raster feature".to_string(),
            )
            .into());
        }

        let record_id = match self.record_id {
            Some(id) => id,
            None => {
                debug!("No layout record yet, saving before export");
                self.try_save().await?
            }
        };
        self.status = Status::Exporting;

        let sources = self.collect_sources(&template).await;
        let exporter = self.exporter.clone();
        let document = self.session.document().clone();
        let content = self.session.content().clone();
        let artifact =
            tokio::task::spawn_blocking(move || exporter.export(&document, &content, &sources))
                .await
                .map_err(|e| EditorError::Task(e.to_string()))??;

        let filename = format!("poster-{}.jpg", self.post);
        tokio::fs::create_dir_all(&self.config.download_dir).await?;
        let path = self.config.download_dir.join(&filename);
        tokio::fs::write(&path, &artifact.bytes).await?;
        debug!("Wrote {}", path.display());

        let size = artifact.bytes.len();
        self.backend
            .upload_artifact(record_id, &filename, artifact.bytes)
            .await?;
        info!("Exported {filename} ({size} bytes) to record {record_id}");

        Ok(ExportOutcome {
            record_id,
            filename,
            path,
            width: artifact.width,
            height: artifact.height,
            size,
        })
    }

    /// Fetch and embed the template background and bound media.
    ///
    /// Anything that cannot be fetched or decoded is left out of the export.
    async fn collect_sources(&self, template: &TemplateType) -> MediaSources {
        let mut sources = MediaSources::new();

        if let Some(file_ref) = &template.background_image_ref {
            match self.fetch_embedded(file_ref).await {
                Ok(image) => sources.set_background(image),
                Err(e) => warn!("Background {file_ref} skipped: {e}"),
            }
        }

        for &id in self.session.document().assets.ids() {
            let Some(asset) = self.media.iter().find(|m| m.id == id) else {
                warn!("Media {id} is not in the palette, slot left empty");
                continue;
            };
            match self.fetch_embedded(&asset.file_ref).await {
                Ok(image) => sources.insert(id, image),
                Err(e) => warn!("Media {id} skipped: {e}"),
            }
        }
        sources
    }

    async fn fetch_embedded(&self, file_ref: &str) -> EditorResult<EmbeddedImage> {
        let bytes = self.backend.fetch_asset(file_ref).await?;
        Ok(EmbeddedImage::from_asset(file_ref, &bytes)?)
    }

    fn fail(&mut self, error: EditorError) -> EditorError {
        warn!("Editor operation failed: {error}");
        self.status = Status::Error(error.to_string());
        error
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("post", &self.post)
            .field("template", &self.template)
            .field("record_id", &self.record_id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
