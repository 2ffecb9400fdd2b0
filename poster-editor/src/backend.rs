//! Contract with the publicity backend.
//!
//! The editor only consumes these operations; transport and storage belong to
//! the implementations ([`crate::HttpBackend`], [`crate::LocalBackend`]).

use async_trait::async_trait;
use poster_core::{Canvas, MediaId, PostContent, SlotBinding};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of a publicity post.
pub type PostId = i64;
/// Identifier of a stored layout record.
pub type RecordId = i64;
/// Identifier of a template type.
pub type TemplateTypeId = i64;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend base URL provided by configuration is invalid.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("backend HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("backend returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
    /// JSON parsing failed unexpectedly.
    #[error("failed to parse backend payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The response did not match the expected structure.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
    /// An I/O error occurred in local storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Returns true if this error is retryable (transient HTTP failures).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_builder(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// A poster template: fixed canvas size plus an optional background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateType {
    /// Template identifier.
    pub id: TemplateTypeId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Asset reference of the background artwork.
    #[serde(default)]
    pub background_image_ref: Option<String>,
}

impl TemplateType {
    /// Canvas defined by this template, raised to the minimum size.
    #[must_use]
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.canvas_width, self.canvas_height)
    }
}

/// A media item attached to the event behind a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Media identifier.
    pub id: MediaId,
    /// Asset reference for fetching pixels.
    pub file_ref: String,
    /// Name shown in the media palette.
    #[serde(default)]
    pub display_name: String,
}

/// A stored layout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLayout {
    /// Record identifier.
    pub record_id: RecordId,
    /// Template the layout was saved with.
    #[serde(default)]
    pub template_type_id: Option<TemplateTypeId>,
    /// Layout document as stored; read leniently.
    #[serde(default)]
    pub layout_document: Value,
}

/// Body of a layout save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLayoutRequest {
    /// Selected template.
    pub template_type_id: TemplateTypeId,
    /// Complete layout document.
    pub layout_document: Value,
    /// Media bound to each asset slot.
    pub asset_slots: Vec<SlotBinding>,
}

/// Response of a layout save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLayoutResponse {
    /// Record the layout was stored under.
    pub record_id: RecordId,
}

/// Operations the editor consumes from the publicity backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// All template types.
    async fn template_types(&self) -> BackendResult<Vec<TemplateType>>;

    /// Media of the event behind `post`.
    async fn event_media(&self, post: PostId) -> BackendResult<Vec<MediaAsset>>;

    /// Base text fields of `post`.
    async fn post_content(&self, post: PostId) -> BackendResult<PostContent>;

    /// The stored layout of `post`, if one was ever saved.
    async fn load_layout(&self, post: PostId) -> BackendResult<Option<StoredLayout>>;

    /// Create or replace the layout of `post`.
    async fn save_layout(&self, post: PostId, request: &SaveLayoutRequest)
        -> BackendResult<RecordId>;

    /// Attach an export artifact to a record, replacing any prior one.
    async fn upload_artifact(
        &self,
        record: RecordId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> BackendResult<()>;

    /// Pixels behind an asset reference.
    async fn fetch_asset(&self, file_ref: &str) -> BackendResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_type_wire_format() {
        let t: TemplateType = serde_json::from_str(
            r#"{"id":3,"canvasWidth":1080,"canvasHeight":1920,"backgroundImageRef":"bg/story.png"}"#,
        )
        .expect("template");
        assert_eq!(t.canvas(), Canvas::new(1080, 1920));
        assert_eq!(t.background_image_ref.as_deref(), Some("bg/story.png"));
        assert!(t.name.is_empty());
    }

    #[test]
    fn test_template_canvas_is_raised() {
        let t = TemplateType {
            id: 1,
            name: "tiny".into(),
            canvas_width: 10,
            canvas_height: 10,
            background_image_ref: None,
        };
        assert_eq!(t.canvas(), Canvas::new(320, 320));
    }

    #[test]
    fn test_save_request_serializes_camel_case() {
        let req = SaveLayoutRequest {
            template_type_id: 2,
            layout_document: serde_json::json!({"version": 1}),
            asset_slots: vec![SlotBinding {
                media_id: 7,
                slot_number: 0,
            }],
        };
        let v = serde_json::to_value(&req).expect("json");
        assert_eq!(v["templateTypeId"], 2);
        assert_eq!(v["assetSlots"][0]["mediaId"], 7);
        assert_eq!(v["assetSlots"][0]["slotNumber"], 0);
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(BackendError::Status {
            status: 503,
            url: "x".into()
        }
        .is_retryable());
        assert!(!BackendError::Status {
            status: 404,
            url: "x".into()
        }
        .is_retryable());
        assert!(!BackendError::NotFound("post".into()).is_retryable());
        assert!(!BackendError::InvalidUrl("bad".into()).is_retryable());
    }
}
