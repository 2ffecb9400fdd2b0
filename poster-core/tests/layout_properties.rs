//! Property tests for layout invariants.
//!
//! Covers:
//! - Default layouts stay inside any valid canvas
//! - Clamping never escapes its range
//! - Merging a document with itself is a no-op
//! - Pointer moves scale by the viewport

use poster_core::{
    clamp, default_layout, merge_document, Canvas, Element, ElementKey, InteractionMachine,
    LayoutDocument, LayoutPatch, Point, Viewport,
};
use proptest::prelude::*;

fn assert_inside(element: &Element, canvas: Canvas) -> Result<(), TestCaseError> {
    let b = element.bounds();
    prop_assert!(b.x >= 0.0, "x {} < 0", b.x);
    prop_assert!(b.y >= 0.0, "y {} < 0", b.y);
    prop_assert!(b.right() <= canvas.w() + 1e-3, "right {} > {}", b.right(), canvas.w());
    prop_assert!(b.bottom() <= canvas.h() + 1e-3, "bottom {} > {}", b.bottom(), canvas.h());
    Ok(())
}

proptest! {
    #[test]
    fn prop_default_layout_inside_canvas(w in 320u32..4000, h in 320u32..4000) {
        let canvas = Canvas::new(w, h);
        let layout = default_layout(canvas);
        prop_assert_eq!(layout.len(), ElementKey::ALL.len());
        for (_, element) in layout.iter() {
            assert_inside(element, canvas)?;
        }
    }

    #[test]
    fn prop_clamp_stays_in_range(v in -1.0e6f32..1.0e6, lo in -1000.0f32..1000.0, span in 0.0f32..1000.0) {
        let hi = lo + span;
        let c = clamp(v, lo, hi);
        prop_assert!(c >= lo && c <= hi);
    }

    #[test]
    fn prop_merge_self_is_identity(w in 320u32..3000, h in 320u32..3000, ids in prop::collection::vec(0i64..50, 0..10)) {
        let mut doc = LayoutDocument::new(Canvas::new(w, h));
        for id in ids {
            let _ = doc.assets.select(id);
        }
        let patch = LayoutPatch::from(&doc);
        prop_assert_eq!(merge_document(&doc, Some(&patch)), doc);
    }

    #[test]
    fn prop_move_divides_by_scale(dx in -50.0f32..50.0, dy in -50.0f32..50.0, scale in 0.1f32..1.0) {
        let canvas = Canvas::new(2000, 2000);
        let mut layout = default_layout(canvas);
        let before = layout.get(ElementKey::Cover).map(Element::bounds).unwrap_or_default();
        let mut machine = InteractionMachine::new();
        machine.begin_move(ElementKey::Cover, Point::new(0.0, 0.0), &layout).expect("begin");
        machine.pointer_move(Point::new(dx, dy), Viewport::with_scale(scale), &mut layout, canvas);
        let after = layout.get(ElementKey::Cover).map(Element::bounds).unwrap_or_default();
        // the cover starts well inside a 2000px canvas, so no clamping applies
        prop_assert!((after.x - (before.x + dx / scale)).abs() < 1e-2);
        prop_assert!((after.y - (before.y + dy / scale)).abs() < 1e-2);
    }
}
