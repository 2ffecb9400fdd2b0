//! Pointer-driven move and resize.
//!
//! ```text
//!            begin_move                 pointer_up / cancel
//!   Idle ───────────────▶ Moving ──────────────────────────▶ Idle
//!     │      begin_resize                pointer_up / cancel
//!     └─────────────────▶ Resizing ────────────────────────▶ Idle
//! ```
//!
//! Pointer capture exists only while the machine is not idle, so a second
//! interaction cannot start on top of a running one, and leaving the state
//! always releases the capture.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{Canvas, ElementKey, ElementKind, MIN_IMAGE_SIZE};
use crate::geometry::{clamp, Point, Rect, Viewport};
use crate::layout::Layout;
use crate::{CoreError, CoreResult};

/// An edge or corner affordance of a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    /// Top edge.
    N,
    /// Bottom edge.
    S,
    /// Right edge.
    E,
    /// Left edge.
    W,
    /// Top-right corner.
    Ne,
    /// Top-left corner.
    Nw,
    /// Bottom-right corner.
    Se,
    /// Bottom-left corner.
    Sw,
}

impl Handle {
    /// All eight handles.
    pub const ALL: [Self; 8] = [
        Self::Nw,
        Self::N,
        Self::Ne,
        Self::E,
        Self::Se,
        Self::S,
        Self::Sw,
        Self::W,
    ];

    /// Handles a text block exposes; its height is intrinsic.
    pub const HORIZONTAL: [Self; 2] = [Self::E, Self::W];

    /// Handles exposed by an element kind.
    #[must_use]
    pub fn exposed_for(kind: ElementKind) -> &'static [Self] {
        match kind {
            ElementKind::Text => &Self::HORIZONTAL,
            ElementKind::Image => &Self::ALL,
        }
    }

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub const fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Whether dragging this handle moves the right edge.
    #[must_use]
    pub const fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Whether dragging this handle moves the top edge.
    #[must_use]
    pub const fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Whether dragging this handle moves the bottom edge.
    #[must_use]
    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Where the handle sits on a rectangle.
    #[must_use]
    pub fn anchor(self, r: Rect) -> Point {
        let x = if self.moves_left() {
            r.x
        } else if self.moves_right() {
            r.right()
        } else {
            r.x + r.w / 2.0
        };
        let y = if self.moves_top() {
            r.y
        } else if self.moves_bottom() {
            r.bottom()
        } else {
            r.y + r.h / 2.0
        };
        Point::new(x, y)
    }

    /// The serialized name of this handle.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::Ne => "ne",
            Self::Nw => "nw",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handle {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| CoreError::UnknownHandle(s.to_string()))
    }
}

/// Current pointer interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Interaction {
    /// No pointer session.
    #[default]
    Idle,
    /// Dragging an element body.
    Moving {
        /// Element being moved.
        key: ElementKey,
        /// Screen position of pointer-down.
        origin: Point,
        /// Geometry at pointer-down.
        snapshot: Rect,
    },
    /// Dragging a resize handle.
    Resizing {
        /// Element being resized.
        key: ElementKey,
        /// Handle being dragged.
        handle: Handle,
        /// Screen position of pointer-down.
        origin: Point,
        /// Geometry at pointer-down.
        snapshot: Rect,
    },
}

impl Interaction {
    /// Element the interaction acts on.
    #[must_use]
    pub const fn key(&self) -> Option<ElementKey> {
        match self {
            Self::Idle => None,
            Self::Moving { key, .. } | Self::Resizing { key, .. } => Some(*key),
        }
    }
}

/// Offset `snapshot` by a canvas-space delta.
///
/// Clamping into the canvas is left to [`crate::Element::normalize`].
#[must_use]
pub fn move_rect(snapshot: Rect, dx: f32, dy: f32) -> Rect {
    Rect::new(snapshot.x + dx, snapshot.y + dy, snapshot.w, snapshot.h)
}

/// Resize `snapshot` by dragging `handle` a canvas-space delta.
///
/// The edge opposite the dragged one stays fixed. Text blocks only respond
/// to the horizontal component.
#[must_use]
pub fn resize_rect(
    snapshot: Rect,
    handle: Handle,
    dx: f32,
    dy: f32,
    kind: ElementKind,
    canvas: Canvas,
) -> Rect {
    let mut r = snapshot;
    let min_w = kind.min_width();

    if handle.moves_right() {
        let max_w = (canvas.w() - snapshot.x).max(min_w);
        r.w = clamp(snapshot.w + dx, min_w, max_w);
    } else if handle.moves_left() {
        let right = snapshot.right();
        r.x = clamp(snapshot.x + dx, 0.0, (right - min_w).max(0.0));
        r.w = right - r.x;
    }

    if kind == ElementKind::Text {
        return r;
    }

    if handle.moves_bottom() {
        let max_h = (canvas.h() - snapshot.y).max(MIN_IMAGE_SIZE);
        r.h = clamp(snapshot.h + dy, MIN_IMAGE_SIZE, max_h);
    } else if handle.moves_top() {
        let bottom = snapshot.bottom();
        r.y = clamp(snapshot.y + dy, 0.0, (bottom - MIN_IMAGE_SIZE).max(0.0));
        r.h = bottom - r.y;
    }
    r
}

/// The three-state pointer interaction machine.
#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    state: Interaction,
}

impl InteractionMachine {
    /// A machine in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &Interaction {
        &self.state
    }

    /// Whether move/up events are being captured.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        !matches!(self.state, Interaction::Idle)
    }

    fn ensure_idle(&self) -> CoreResult<()> {
        match self.state.key() {
            Some(active) => Err(CoreError::InteractionActive(active)),
            None => Ok(()),
        }
    }

    /// Pointer went down on an element body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] if a session is running, or
    /// [`CoreError::UnknownElement`] if the layout lacks `key`.
    pub fn begin_move(&mut self, key: ElementKey, pointer: Point, layout: &Layout) -> CoreResult<()> {
        self.ensure_idle()?;
        let snapshot = layout
            .get(key)
            .ok_or_else(|| CoreError::UnknownElement(key.to_string()))?
            .bounds();
        tracing::debug!("Interaction idle -> moving({key})");
        self.state = Interaction::Moving {
            key,
            origin: pointer,
            snapshot,
        };
        Ok(())
    }

    /// Pointer went down on one of an element's resize handles.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InteractionActive`] if a session is running,
    /// [`CoreError::UnknownElement`] if the layout lacks `key`, or
    /// [`CoreError::HandleNotExposed`] for a vertical handle on text.
    pub fn begin_resize(
        &mut self,
        key: ElementKey,
        handle: Handle,
        pointer: Point,
        layout: &Layout,
    ) -> CoreResult<()> {
        self.ensure_idle()?;
        let element = layout
            .get(key)
            .ok_or_else(|| CoreError::UnknownElement(key.to_string()))?;
        if !Handle::exposed_for(element.kind()).contains(&handle) {
            return Err(CoreError::HandleNotExposed { key, handle });
        }
        tracing::debug!("Interaction idle -> resizing({key}, {handle})");
        self.state = Interaction::Resizing {
            key,
            handle,
            origin: pointer,
            snapshot: element.bounds(),
        };
        Ok(())
    }

    /// Apply a pointer move to the layout.
    ///
    /// Returns the key that changed, or `None` when idle.
    pub fn pointer_move(
        &mut self,
        pointer: Point,
        viewport: Viewport,
        layout: &mut Layout,
        canvas: Canvas,
    ) -> Option<ElementKey> {
        let (key, rect) = match self.state {
            Interaction::Idle => return None,
            Interaction::Moving {
                key,
                origin,
                snapshot,
            } => {
                let (dx, dy) = viewport.to_canvas_delta(pointer.x - origin.x, pointer.y - origin.y);
                (key, move_rect(snapshot, dx, dy))
            }
            Interaction::Resizing {
                key,
                handle,
                origin,
                snapshot,
            } => {
                let (dx, dy) = viewport.to_canvas_delta(pointer.x - origin.x, pointer.y - origin.y);
                (key, resize_rect(snapshot, handle, dx, dy, key.kind(), canvas))
            }
        };
        let element = layout.get_mut(key)?;
        element.set_bounds(rect);
        element.normalize(canvas);
        Some(key)
    }

    /// Pointer released anywhere: end the session.
    ///
    /// Returns the key that was being edited.
    pub fn pointer_up(&mut self) -> Option<ElementKey> {
        let key = self.state.key();
        if let Some(key) = key {
            tracing::debug!("Interaction on {key} -> idle");
        }
        self.state = Interaction::Idle;
        key
    }

    /// Abnormal termination (pointer lost, template switch). Same as release.
    pub fn cancel(&mut self) -> Option<ElementKey> {
        self.pointer_up()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_layout;

    fn setup() -> (Layout, Canvas) {
        let canvas = Canvas::new(1000, 1000);
        (default_layout(canvas), canvas)
    }

    #[test]
    fn starts_idle() {
        let machine = InteractionMachine::new();
        assert_eq!(machine.state(), &Interaction::Idle);
        assert!(!machine.is_capturing());
    }

    #[test]
    fn move_divides_delta_by_scale() {
        let (mut layout, canvas) = setup();
        let before = layout.get(ElementKey::Title).expect("title").bounds();
        let mut machine = InteractionMachine::new();
        machine
            .begin_move(ElementKey::Title, Point::new(100.0, 100.0), &layout)
            .expect("begin");
        machine.pointer_move(
            Point::new(120.0, 110.0),
            Viewport::with_scale(0.5),
            &mut layout,
            canvas,
        );
        let after = layout.get(ElementKey::Title).expect("title").bounds();
        assert!((after.x - (before.x + 40.0)).abs() < 1e-3);
        assert!((after.y - (before.y + 20.0)).abs() < 1e-3);
    }

    #[test]
    fn move_is_relative_to_snapshot_not_last_event() {
        let (mut layout, canvas) = setup();
        let before = layout.get(ElementKey::Cover).expect("cover").bounds();
        let mut machine = InteractionMachine::new();
        machine
            .begin_move(ElementKey::Cover, Point::new(0.0, 0.0), &layout)
            .expect("begin");
        let vp = Viewport::default();
        machine.pointer_move(Point::new(10.0, 0.0), vp, &mut layout, canvas);
        machine.pointer_move(Point::new(15.0, 0.0), vp, &mut layout, canvas);
        let after = layout.get(ElementKey::Cover).expect("cover").bounds();
        assert!((after.x - (before.x + 15.0)).abs() < 1e-3);
    }

    #[test]
    fn move_clamps_to_canvas() {
        let (mut layout, canvas) = setup();
        let mut machine = InteractionMachine::new();
        machine
            .begin_move(ElementKey::Cover, Point::new(0.0, 0.0), &layout)
            .expect("begin");
        machine.pointer_move(
            Point::new(-5000.0, 5000.0),
            Viewport::default(),
            &mut layout,
            canvas,
        );
        let after = layout.get(ElementKey::Cover).expect("cover").bounds();
        assert!(after.x.abs() < f32::EPSILON);
        assert!((after.bottom() - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn east_handle_changes_only_width() {
        let canvas = Canvas::new(1000, 1000);
        let snap = Rect::new(100.0, 100.0, 200.0, 150.0);
        let r = resize_rect(snap, Handle::E, 50.0, 80.0, ElementKind::Image, canvas);
        assert!((r.x - 100.0).abs() < f32::EPSILON);
        assert!((r.y - 100.0).abs() < f32::EPSILON);
        assert!((r.w - 250.0).abs() < f32::EPSILON);
        assert!((r.h - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn west_handle_keeps_right_edge() {
        let canvas = Canvas::new(1000, 1000);
        let snap = Rect::new(100.0, 100.0, 200.0, 150.0);
        let r = resize_rect(snap, Handle::W, 30.0, 0.0, ElementKind::Text, canvas);
        assert!((r.x - 130.0).abs() < f32::EPSILON);
        assert!((r.right() - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn west_handle_stops_at_min_width() {
        let canvas = Canvas::new(1000, 1000);
        let snap = Rect::new(100.0, 100.0, 200.0, 0.0);
        let r = resize_rect(snap, Handle::W, 500.0, 0.0, ElementKind::Text, canvas);
        assert!((r.w - 80.0).abs() < f32::EPSILON);
        assert!((r.right() - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn north_west_corner_moves_both_axes() {
        let canvas = Canvas::new(1000, 1000);
        let snap = Rect::new(100.0, 100.0, 200.0, 150.0);
        let r = resize_rect(snap, Handle::Nw, -20.0, -40.0, ElementKind::Image, canvas);
        assert!((r.x - 80.0).abs() < f32::EPSILON);
        assert!((r.y - 60.0).abs() < f32::EPSILON);
        assert!((r.right() - 300.0).abs() < f32::EPSILON);
        assert!((r.bottom() - 250.0).abs() < f32::EPSILON);
    }

    #[test]
    fn south_handle_clamps_to_min_height() {
        let canvas = Canvas::new(1000, 1000);
        let snap = Rect::new(100.0, 100.0, 200.0, 150.0);
        let r = resize_rect(snap, Handle::S, 0.0, -500.0, ElementKind::Image, canvas);
        assert!((r.h - MIN_IMAGE_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn text_refuses_vertical_handles() {
        let (layout, _) = setup();
        let mut machine = InteractionMachine::new();
        let err = machine
            .begin_resize(ElementKey::Title, Handle::S, Point::default(), &layout)
            .unwrap_err();
        assert!(matches!(err, CoreError::HandleNotExposed { .. }));
        assert!(!machine.is_capturing());
    }

    #[test]
    fn second_interaction_is_refused() {
        let (layout, _) = setup();
        let mut machine = InteractionMachine::new();
        machine
            .begin_move(ElementKey::Title, Point::default(), &layout)
            .expect("begin");
        let err = machine
            .begin_resize(ElementKey::Cover, Handle::Se, Point::default(), &layout)
            .unwrap_err();
        assert!(matches!(err, CoreError::InteractionActive(ElementKey::Title)));
    }

    #[test]
    fn pointer_up_always_returns_to_idle() {
        let (layout, _) = setup();
        let mut machine = InteractionMachine::new();
        machine
            .begin_resize(ElementKey::Cover, Handle::Se, Point::default(), &layout)
            .expect("begin");
        assert_eq!(machine.pointer_up(), Some(ElementKey::Cover));
        assert!(!machine.is_capturing());
        assert_eq!(machine.pointer_up(), None);
    }

    #[test]
    fn idle_move_is_ignored() {
        let (mut layout, canvas) = setup();
        let before = layout.clone();
        let mut machine = InteractionMachine::new();
        let changed = machine.pointer_move(
            Point::new(50.0, 50.0),
            Viewport::default(),
            &mut layout,
            canvas,
        );
        assert!(changed.is_none());
        assert_eq!(layout, before);
    }

    #[test]
    fn handle_parses_and_displays() {
        assert_eq!("se".parse::<Handle>().ok(), Some(Handle::Se));
        assert!("x".parse::<Handle>().is_err());
        assert_eq!(Handle::Nw.to_string(), "nw");
    }
}
