//! # Poster Studio Editor
//!
//! Editor workflow for publicity posters: fetches lookups and the stored
//! layout from the publicity backend, drives an [`EditorSession`], saves the
//! layout document and exports the finished poster.
//!
//! ```text
//! ┌──────────────┐   Backend trait   ┌──────────────────────────┐
//! │    Editor    │ ────────────────▶ │ HttpBackend │ LocalBackend│
//! │  (session,   │                   └──────────────────────────┘
//! │   status)    │ ── export ──▶ poster-renderer ──▶ JPEG
//! └──────────────┘
//! ```
//!
//! [`EditorSession`]: poster_core::EditorSession

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod editor;
pub mod http;
pub mod local;
pub mod status;
pub mod telemetry;

pub use backend::{
    Backend, BackendError, BackendResult, MediaAsset, PostId, RecordId, SaveLayoutRequest,
    SaveLayoutResponse, StoredLayout, TemplateType, TemplateTypeId,
};
pub use config::{build_backend, EditorConfig};
pub use editor::{Editor, EditorError, EditorResult, ExportOutcome};
pub use http::{HttpBackend, RetryPolicy};
pub use local::{LocalBackend, StoredArtifact};
pub use status::Status;
pub use telemetry::init_tracing;
