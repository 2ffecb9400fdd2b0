//! Media embedding for the export surface.
//!
//! Backgrounds and slot images arrive as raw bytes from the backend and are
//! embedded into the composed SVG as base64 data URIs.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use poster_core::MediaId;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Raster formats the export surface can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF, first frame.
    Gif,
    /// WebP.
    WebP,
}

impl EmbedFormat {
    fn from_image(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    /// Format named by the leading bytes of an encoded image.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        image::guess_format(bytes).ok().and_then(Self::from_image)
    }

    /// Format implied by an asset reference.
    ///
    /// Data URIs are read by their MIME type; anything else by the extension
    /// of its path, ignoring a query string or fragment.
    #[must_use]
    pub fn from_file_ref(file_ref: &str) -> Option<Self> {
        let format = if let Some(rest) = file_ref.strip_prefix("data:") {
            let mime = rest.split([';', ',']).next().unwrap_or_default();
            image::ImageFormat::from_mime_type(mime)
        } else {
            let path = file_ref.split(['?', '#']).next().unwrap_or_default();
            Path::new(path)
                .extension()
                .and_then(image::ImageFormat::from_extension)
        };
        format.and_then(Self::from_image)
    }

    /// MIME type written into the data URI.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

/// An image ready to be referenced from the export SVG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    data_uri: String,
}

impl EmbeddedImage {
    /// Encode the bytes fetched for an asset reference.
    ///
    /// The format comes from the bytes themselves; when they are not
    /// recognised the reference's extension or MIME type is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] if neither names an embeddable
    /// format.
    pub fn from_asset(file_ref: &str, bytes: &[u8]) -> RenderResult<Self> {
        let format = match EmbedFormat::sniff(bytes) {
            Some(format) => format,
            None => {
                let format = EmbedFormat::from_file_ref(file_ref).ok_or_else(|| {
                    RenderError::Resource(format!("{file_ref} is not an embeddable image"))
                })?;
                debug!("Unrecognised bytes for {file_ref}, embedding as {}", format.mime());
                format
            }
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            data_uri: format!("data:{};base64,{encoded}", format.mime()),
        })
    }

    /// The `data:` URI used as the SVG `href`.
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Bytes carried by a base64 data URI such as `data:image/png;base64,...`.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the URI is malformed or not base64.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;
    if !metadata.ends_with(";base64") {
        return Err(RenderError::Resource(
            "Only base64 data URIs are supported".to_string(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
}

/// Pixels the export surface can draw: an optional template background and
/// the images bound to asset slots.
#[derive(Debug, Clone, Default)]
pub struct MediaSources {
    background: Option<EmbeddedImage>,
    media: HashMap<MediaId, EmbeddedImage>,
}

impl MediaSources {
    /// No background, no media.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template background.
    pub fn set_background(&mut self, image: EmbeddedImage) {
        self.background = Some(image);
    }

    /// Template background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&EmbeddedImage> {
        self.background.as_ref()
    }

    /// Register the pixels of a media item.
    pub fn insert(&mut self, id: MediaId, image: EmbeddedImage) {
        self.media.insert(id, image);
    }

    /// Pixels of a media item, if loaded.
    #[must_use]
    pub fn get(&self, id: MediaId) -> Option<&EmbeddedImage> {
        self.media.get(&id)
    }

    /// Number of loaded media items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.media.len()
    }

    /// Whether no media items are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red PNG
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn png_bytes() -> Vec<u8> {
        base64::engine::general_purpose::STANDARD
            .decode(PNG_BASE64)
            .expect("png fixture")
    }

    #[test]
    fn test_sniff_encoded_bytes() {
        assert_eq!(EmbedFormat::sniff(&png_bytes()), Some(EmbedFormat::Png));
        assert_eq!(
            EmbedFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(EmbedFormat::Jpeg)
        );
        assert_eq!(EmbedFormat::sniff(b"GIF89a"), Some(EmbedFormat::Gif));
        assert_eq!(EmbedFormat::sniff(b"ab"), None);
    }

    #[test]
    fn test_format_from_file_ref() {
        assert_eq!(
            EmbedFormat::from_file_ref("media/12/stage.JPG"),
            Some(EmbedFormat::Jpeg)
        );
        assert_eq!(
            EmbedFormat::from_file_ref("files/5.webp?v=3"),
            Some(EmbedFormat::WebP)
        );
        assert_eq!(
            EmbedFormat::from_file_ref("data:image/gif;base64,R0lG"),
            Some(EmbedFormat::Gif)
        );
        assert_eq!(EmbedFormat::from_file_ref("bg/feed.tiff"), None);
        assert_eq!(EmbedFormat::from_file_ref("media/12"), None);
    }

    #[test]
    fn test_embed_png() {
        let image = EmbeddedImage::from_asset("red.png", &png_bytes()).expect("embed");
        assert_eq!(
            image.data_uri(),
            format!("data:image/png;base64,{PNG_BASE64}")
        );
    }

    #[test]
    fn test_sniffed_format_wins_over_extension() {
        let image = EmbeddedImage::from_asset("red.jpg", &png_bytes()).expect("embed");
        assert!(image.data_uri().starts_with("data:image/png;"));
    }

    #[test]
    fn test_unrecognised_bytes_fall_back_to_extension() {
        let image = EmbeddedImage::from_asset("files/5.jpeg", b"truncated").expect("embed");
        assert!(image.data_uri().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_embed_rejects_unknown_asset() {
        assert!(EmbeddedImage::from_asset("notes.txt", b"not an image").is_err());
        assert!(EmbeddedImage::from_asset("media/7", b"not an image").is_err());
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = format!("data:image/png;base64,{PNG_BASE64}");
        assert_eq!(decode_data_uri(&uri).expect("decode"), png_bytes());
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
        assert!(decode_data_uri("data:image/png,abc").is_err());
    }

    #[test]
    fn test_media_sources() {
        let mut sources = MediaSources::new();
        assert!(sources.is_empty());
        sources.insert(3, EmbeddedImage::from_asset("red.png", &png_bytes()).expect("embed"));
        assert_eq!(sources.len(), 1);
        assert!(sources.get(3).is_some());
        assert!(sources.get(4).is_none());
        assert!(sources.background().is_none());
    }
}
