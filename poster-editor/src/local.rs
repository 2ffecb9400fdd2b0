//! In-process backend with optional on-disk persistence.
//!
//! Used for offline editing and tests. Layout records keep their identifier
//! per post across saves; artifacts replace any prior artifact of a record.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use poster_core::{PostContent, SlotBinding};
use serde::{Deserialize, Serialize};

use crate::backend::{
    Backend, BackendError, BackendResult, MediaAsset, PostId, RecordId, SaveLayoutRequest,
    StoredLayout, TemplateType,
};

/// A layout record as written to `<data_dir>/layouts/post-<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutFile {
    post_id: PostId,
    #[serde(flatten)]
    layout: StoredLayout,
    #[serde(default)]
    asset_slots: Vec<SlotBinding>,
}

/// Artifact attached to a layout record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Filename the artifact was uploaded under.
    pub filename: String,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct LocalState {
    templates: Vec<TemplateType>,
    posts: HashMap<PostId, PostContent>,
    media: HashMap<PostId, Vec<MediaAsset>>,
    assets: HashMap<String, Vec<u8>>,
    layouts: HashMap<PostId, LayoutFile>,
    artifacts: HashMap<RecordId, StoredArtifact>,
    next_record: RecordId,
}

/// Thread-safe in-memory backend.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    state: Arc<RwLock<LocalState>>,
    data_dir: Option<PathBuf>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBackend {
    /// Create an empty backend that keeps everything in memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LocalState {
                next_record: 1,
                ..LocalState::default()
            })),
            data_dir: None,
        }
    }

    /// Create a backend that persists layouts and artifacts under `data_dir`.
    ///
    /// Layout records already on disk are loaded so record identifiers keep
    /// increasing across runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or read.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(data_dir.join("layouts"))?;
        std::fs::create_dir_all(data_dir.join("artifacts"))?;

        let backend = Self {
            data_dir: Some(data_dir),
            ..Self::new()
        };
        let loaded = backend.load_layouts_from_disk()?;
        if loaded > 0 {
            tracing::info!("Loaded {loaded} layout records from disk");
        }
        Ok(backend)
    }

    /// Register a template type.
    #[must_use]
    pub fn add_template(self, template: TemplateType) -> Self {
        self.write().templates.push(template);
        self
    }

    /// Register the base content of a post.
    #[must_use]
    pub fn add_post(self, post: PostId, content: PostContent) -> Self {
        self.write().posts.insert(post, content);
        self
    }

    /// Register a media item for the event behind a post.
    #[must_use]
    pub fn add_media(self, post: PostId, media: MediaAsset) -> Self {
        self.write().media.entry(post).or_default().push(media);
        self
    }

    /// Register the bytes behind an asset reference.
    #[must_use]
    pub fn add_asset(self, file_ref: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.write().assets.insert(file_ref.into(), bytes);
        self
    }

    /// Artifact attached to a record, if any.
    #[must_use]
    pub fn artifact(&self, record: RecordId) -> Option<StoredArtifact> {
        self.read().artifacts.get(&record).cloned()
    }

    /// Asset slot bindings last saved for a post.
    #[must_use]
    pub fn asset_slots(&self, post: PostId) -> Vec<SlotBinding> {
        self.read()
            .layouts
            .get(&post)
            .map(|f| f.asset_slots.clone())
            .unwrap_or_default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LocalState> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LocalState> {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn load_layouts_from_disk(&self) -> BackendResult<usize> {
        let Some(ref data_dir) = self.data_dir else {
            return Ok(0);
        };
        let mut loaded = 0;
        for entry in std::fs::read_dir(data_dir.join("layouts"))? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let file: LayoutFile = match std::fs::read_to_string(&path)
                .map_err(BackendError::from)
                .and_then(|s| serde_json::from_str(&s).map_err(BackendError::from))
            {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!("Skipping unreadable layout file {}: {e}", path.display());
                    continue;
                }
            };
            let mut state = self.write();
            state.next_record = state.next_record.max(file.layout.record_id + 1);
            state.layouts.insert(file.post_id, file);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Save a layout record to disk. No-op without a data directory.
    fn persist_layout(&self, file: &LayoutFile) -> BackendResult<()> {
        let Some(ref data_dir) = self.data_dir else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(file)?;
        let path = data_dir
            .join("layouts")
            .join(format!("post-{}.json", file.post_id));
        std::fs::write(&path, json).inspect_err(|e| {
            tracing::warn!(
                "Failed to persist layout of post {} to {}: {e}",
                file.post_id,
                path.display()
            );
        })?;
        Ok(())
    }

    fn persist_artifact(&self, record: RecordId, artifact: &StoredArtifact) -> BackendResult<()> {
        let Some(ref data_dir) = self.data_dir else {
            return Ok(());
        };
        let dir = data_dir.join("artifacts");
        // one artifact per record
        let prefix = format!("{record}-");
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let stale = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix));
            if stale {
                std::fs::remove_file(&path)?;
            }
        }
        let path = dir.join(format!("{prefix}{}", sanitize_filename(&artifact.filename)));
        std::fs::write(&path, &artifact.bytes)?;
        Ok(())
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn template_types(&self) -> BackendResult<Vec<TemplateType>> {
        Ok(self.read().templates.clone())
    }

    async fn event_media(&self, post: PostId) -> BackendResult<Vec<MediaAsset>> {
        Ok(self.read().media.get(&post).cloned().unwrap_or_default())
    }

    async fn post_content(&self, post: PostId) -> BackendResult<PostContent> {
        self.read()
            .posts
            .get(&post)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("post {post}")))
    }

    async fn load_layout(&self, post: PostId) -> BackendResult<Option<StoredLayout>> {
        Ok(self.read().layouts.get(&post).map(|f| f.layout.clone()))
    }

    async fn save_layout(
        &self,
        post: PostId,
        request: &SaveLayoutRequest,
    ) -> BackendResult<RecordId> {
        // memory only changes once the record is on disk
        let mut state = self.write();
        let existing = state.layouts.get(&post).map(|f| f.layout.record_id);
        let record_id = existing.unwrap_or(state.next_record);
        let file = LayoutFile {
            post_id: post,
            layout: StoredLayout {
                record_id,
                template_type_id: Some(request.template_type_id),
                layout_document: request.layout_document.clone(),
            },
            asset_slots: request.asset_slots.clone(),
        };
        self.persist_layout(&file)?;
        if existing.is_none() {
            state.next_record += 1;
        }
        state.layouts.insert(post, file);
        drop(state);
        tracing::debug!("Stored layout of post {post} as record {record_id}");
        Ok(record_id)
    }

    async fn upload_artifact(
        &self,
        record: RecordId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()> {
        let known = self
            .read()
            .layouts
            .values()
            .any(|f| f.layout.record_id == record);
        if !known {
            return Err(BackendError::NotFound(format!("layout record {record}")));
        }
        let artifact = StoredArtifact {
            filename: filename.to_string(),
            bytes,
        };
        self.persist_artifact(record, &artifact)?;
        self.write().artifacts.insert(record, artifact);
        Ok(())
    }

    async fn fetch_asset(&self, file_ref: &str) -> BackendResult<Vec<u8>> {
        if file_ref.starts_with("data:") {
            return poster_renderer::decode_data_uri(file_ref)
                .map_err(|e| BackendError::UnexpectedResponse(e.to_string()));
        }
        self.read()
            .assets
            .get(file_ref)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("asset {file_ref}")))
    }
}

/// Sanitize a name for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, `_` or `.` with `_`.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
