//! # Poster Studio Renderer
//!
//! Export surface for poster layouts. Output is always at the template's true
//! canvas size, regardless of how the edit surface is scaled.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │      LayoutDocument + PostContent + media   │
//! ├─────────────────────────────────────────────┤
//! │  compose_svg        (W × H, no chrome)      │
//! ├─────────────────────────────────────────────┤
//! │  resvg / tiny-skia  (W·k × H·k)             │
//! ├─────────────────────────────────────────────┤
//! │  downsample + JPEG  (exactly W × H)         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod media;

pub use error::{RenderError, RenderResult};
pub use export::{compose_svg, ExportArtifact, ExportConfig, PosterExporter, ARTIFACT_MIME};
pub use media::{decode_data_uri, EmbedFormat, EmbeddedImage, MediaSources};

/// Whether this build can rasterise exports.
#[must_use]
pub const fn raster_available() -> bool {
    cfg!(feature = "raster")
}
