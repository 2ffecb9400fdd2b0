//! Layout document export to JPEG.
//!
//! The export surface is composed as SVG at the template's true pixel size,
//! independent of the scaled on-screen preview. It is rasterised at an
//! oversampling factor with resvg/tiny-skia, downsampled to exactly the
//! canvas dimensions, flattened over the background and encoded as JPEG.

use std::fmt::Write;

use poster_core::element::{Align, Element, ElementKey};
use poster_core::text::{wrap, LINE_HEIGHT};
use poster_core::{LayoutDocument, PostContent};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::media::MediaSources;

/// MIME type of the export artifact.
pub const ARTIFACT_MIME: &str = "image/jpeg";

/// Configuration for poster export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Render-resolution multiplier before downsampling (default: 2.0).
    pub oversample: f32,
    /// JPEG quality 1-100 (default: 92).
    pub jpeg_quality: u8,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
    /// Load system fonts for text rendering.
    pub load_system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            oversample: 2.0,
            jpeg_quality: 92,
            background: [255, 255, 255, 255],
            load_system_fonts: true,
        }
    }
}

impl ExportConfig {
    /// Oversampling factor clamped to `[1, 4]`.
    #[must_use]
    pub fn effective_oversample(&self) -> f32 {
        if self.oversample.is_finite() {
            self.oversample.clamp(1.0, 4.0)
        } else {
            1.0
        }
    }
}

/// An encoded poster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    /// Width in pixels; equals the canvas width.
    pub width: u32,
    /// Height in pixels; equals the canvas height.
    pub height: u32,
}

impl ExportArtifact {
    /// MIME type of [`ExportArtifact::bytes`].
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        ARTIFACT_MIME
    }
}

/// Compose the export surface as SVG at true canvas size.
///
/// Image slots without bound or loaded media and text blocks without content
/// are left out. No selection chrome is drawn.
#[must_use]
pub fn compose_svg(
    document: &LayoutDocument,
    content: &PostContent,
    sources: &MediaSources,
    background: [u8; 4],
) -> String {
    let (w, h) = (document.canvas.width, document.canvas.height);

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
    );

    let bg_alpha = f32::from(background[3]) / 255.0;
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
        background[0], background[1], background[2], bg_alpha,
    );

    if let Some(bg) = sources.background() {
        let _ = write!(
            svg,
            "<image x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"xMidYMid slice\" href=\"{}\"/>",
            bg.data_uri(),
        );
    }

    for (key, element) in document.elements.iter() {
        match element {
            Element::Image(_) => {
                let Some(image) = document
                    .assets
                    .media_for(key)
                    .and_then(|id| sources.get(id))
                else {
                    continue;
                };
                render_image_svg(&mut svg, key, element, image.data_uri());
            }
            Element::Text(_) => {
                let Some(text) = content
                    .text_for(key, &document.fields)
                    .filter(|t| !t.trim().is_empty())
                else {
                    continue;
                };
                render_text_svg(&mut svg, element, &text);
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Render an image slot clipped to its box.
fn render_image_svg(svg: &mut String, key: ElementKey, element: &Element, href: &str) {
    let b = element.bounds();
    let _ = write!(
        svg,
        "<clipPath id=\"clip-{key}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath>",
        b.x, b.y, b.w, b.h,
    );
    let _ = write!(
        svg,
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#clip-{key})\" href=\"{href}\"/>",
        b.x, b.y, b.w, b.h,
    );
}

/// Render a text block as one `<text>` per wrapped line.
#[allow(clippy::cast_precision_loss)]
fn render_text_svg(svg: &mut String, element: &Element, text: &str) {
    let Some(t) = element.as_text() else {
        return;
    };
    let (anchor, x) = match t.align {
        Align::Left => ("start", t.x),
        Align::Center => ("middle", t.x + t.w / 2.0),
        Align::Right => ("end", t.x + t.w),
    };
    let color = escape_xml(&t.color);
    let family = escape_xml(&t.font_family);
    let line_height = t.font_size * LINE_HEIGHT;

    for (i, line) in wrap(text, t.font_size, t.font_weight, t.w)
        .iter()
        .enumerate()
    {
        if line.is_empty() {
            continue;
        }
        let y = t.y + i as f32 * line_height + t.font_size;
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{color}\" font-family=\"{family}\" text-anchor=\"{anchor}\">{}</text>",
            t.font_size,
            t.font_weight,
            escape_xml(line),
        );
    }
}

/// Renders layout documents to JPEG artifacts.
#[derive(Debug, Clone)]
pub struct PosterExporter {
    config: ExportConfig,
}

impl PosterExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the document at exactly `canvas.width × canvas.height`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::RasterUnavailable`] without the `raster`
    /// feature or when the pixmap cannot be allocated, and
    /// [`RenderError::Export`] if rasterisation or encoding fails.
    pub fn export(
        &self,
        document: &LayoutDocument,
        content: &PostContent,
        sources: &MediaSources,
    ) -> RenderResult<ExportArtifact> {
        let svg = compose_svg(document, content, sources, self.config.background);
        let (width, height) = (document.canvas.width, document.canvas.height);
        tracing::debug!(
            "Exporting {width}x{height} at {}x oversampling",
            self.config.effective_oversample()
        );

        let rgb = self.rasterize(&svg)?;
        let rgb = if rgb.dimensions() == (width, height) {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, image::imageops::FilterType::Lanczos3)
        };

        let bytes = self.encode_jpeg(&rgb)?;
        tracing::info!("Exported {width}x{height} poster ({} bytes)", bytes.len());
        Ok(ExportArtifact {
            bytes,
            width,
            height,
        })
    }

    fn encode_jpeg(&self, rgb: &image::RgbImage) -> RenderResult<Vec<u8>> {
        use image::ImageEncoder;

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf,
            self.config.jpeg_quality.clamp(1, 100),
        );
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8.into(),
            )
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }

    /// Rasterise an SVG string at the oversampling factor, flattened to RGB.
    #[cfg(feature = "raster")]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn rasterize(&self, svg_string: &str) -> RenderResult<image::RgbImage> {
        let mut opt = usvg::Options::default();
        if self.config.load_system_fonts {
            opt.fontdb_mut().load_system_fonts();
        }
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let scale = self.config.effective_oversample();
        let px_w = (tree.size().width() * scale).ceil() as u32;
        let px_h = (tree.size().height() * scale).ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1)).ok_or_else(|| {
            RenderError::RasterUnavailable(format!("cannot allocate {px_w}x{px_h} pixmap"))
        })?;

        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        // Pixmap data is premultiplied, so compositing over the background
        // is `c + bg * (1 - a)`.
        let bg = &self.config.background;
        let (width, height) = (pixmap.width(), pixmap.height());
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for (&p, &b) in pixel[..3].iter().zip(bg) {
                let v = f32::from(b).mul_add(inv, f32::from(p));
                rgb_data.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }

        image::RgbImage::from_raw(width, height, rgb_data)
            .ok_or_else(|| RenderError::Export("Pixel buffer size mismatch".to_string()))
    }

    #[cfg(not(feature = "raster"))]
    #[allow(clippy::unused_self)]
    fn rasterize(&self, _svg_string: &str) -> RenderResult<image::RgbImage> {
        Err(RenderError::RasterUnavailable(
            "built without the raster feature".to_string(),
        ))
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
