//! Geometry utilities: clamping, rectangles and the viewport scale transform.
//!
//! All element geometry lives in canvas space (true template pixels). The edit
//! surface may be shrunk to fit its container; [`Viewport`] converts between
//! the two so that a drag feels identical at any zoom level.

use serde::{Deserialize, Serialize};

use crate::element::Canvas;

/// Smallest scale factor the viewport will report.
///
/// A zero-sized container would otherwise produce a zero divisor for pointer
/// deltas.
pub const MIN_SCALE: f32 = 0.05;

/// Clamp `value` into `[min, max]`.
///
/// Mirrors `min(max(value, min), max)`: when `max < min` the result is `max`.
/// A NaN input maps to `min`.
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Uniform scale applied to the preview so the canvas fits its container.
///
/// The canvas is only ever scaled down, never up.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scale_factor(container_width: f32, container_height: f32, canvas: Canvas) -> f32 {
    let sx = container_width / canvas.width as f32;
    let sy = container_height / canvas.height as f32;
    clamp(sx.min(sy), MIN_SCALE, 1.0)
}

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Square of side `size` centred on `(cx, cy)`.
    #[must_use]
    pub fn centered(cx: f32, cy: f32, size: f32) -> Self {
        Self::new(cx - size / 2.0, cy - size / 2.0, size, size)
    }
}

/// The on-screen presentation of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current uniform scale (screen px per canvas px).
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Viewport {
    /// Viewport with an explicit scale, clamped to `[MIN_SCALE, 1]`.
    #[must_use]
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale: clamp(scale, MIN_SCALE, 1.0),
        }
    }

    /// Viewport fitted into a container of the given size.
    #[must_use]
    pub fn fitted(container_width: f32, container_height: f32, canvas: Canvas) -> Self {
        Self {
            scale: scale_factor(container_width, container_height, canvas),
        }
    }

    /// Convert a screen-space pointer delta into canvas space.
    #[must_use]
    pub fn to_canvas_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        (dx / self.scale, dy / self.scale)
    }

    /// Project a canvas-space rectangle onto the screen.
    #[must_use]
    pub fn to_screen(&self, r: Rect) -> Rect {
        Rect::new(
            r.x * self.scale,
            r.y * self.scale,
            r.w * self.scale,
            r.h * self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_inside_and_outside() {
        assert!((clamp(5.0, 0.0, 10.0) - 5.0).abs() < f32::EPSILON);
        assert!((clamp(-3.0, 0.0, 10.0)).abs() < f32::EPSILON);
        assert!((clamp(42.0, 0.0, 10.0) - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clamp_nan_maps_to_min() {
        assert!((clamp(f32::NAN, 2.0, 10.0) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn scale_never_exceeds_one() {
        let canvas = Canvas::new(1080, 1350);
        assert!((scale_factor(4000.0, 4000.0, canvas) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn scale_uses_tighter_axis() {
        let canvas = Canvas::new(1000, 2000);
        let s = scale_factor(500.0, 500.0, canvas);
        assert!((s - 0.25).abs() < 1e-6);
    }

    #[test]
    fn scale_has_floor_for_empty_container() {
        let canvas = Canvas::new(1080, 1350);
        assert!((scale_factor(0.0, 0.0, canvas) - MIN_SCALE).abs() < f32::EPSILON);
    }

    #[test]
    fn viewport_round_trips_delta() {
        let vp = Viewport::with_scale(0.4);
        let (dx, dy) = vp.to_canvas_delta(40.0, -20.0);
        assert!((dx - 100.0).abs() < 1e-3);
        assert!((dy + 50.0).abs() < 1e-3);
        let r = vp.to_screen(Rect::new(100.0, 100.0, 50.0, 50.0));
        assert!((r.x - 40.0).abs() < 1e-3);
        assert!((r.w - 20.0).abs() < 1e-3);
    }
}
