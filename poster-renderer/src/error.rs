//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Rasterisation is not compiled in, or the pixmap could not be allocated.
    #[error("Rasterisation unavailable: {0}")]
    RasterUnavailable(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Composing, rasterising or encoding the artifact failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
