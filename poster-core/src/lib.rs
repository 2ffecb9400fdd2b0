//! # Poster Studio Core
//!
//! Core poster layout logic for the publicity poster editor.
//! Compiles to WASM for the browser edit surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              poster-core.wasm               │
//! ├─────────────────────────────────────────────┤
//! │  Layout Model    │  Interaction             │
//! │  - Elements      │  - Move / resize         │
//! │  - Defaults      │  - Handle rules          │
//! │  - Asset slots   │  - Viewport scaling      │
//! ├─────────────────────────────────────────────┤
//! │  Merge           │  Selection               │
//! │  - Per field     │  - Property form         │
//! │  - Clamping      │  - Typed edits           │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod content;
pub mod element;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod merge;
pub mod schema;
pub mod selection;
pub mod session;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use assets::{AssetSelection, MediaId, SlotBinding, MAX_SLOTS};
pub use content::PostContent;
pub use element::{
    Align, Canvas, Element, ElementKey, ElementKind, ImageElement, TextElement, DEFAULT_CANVAS,
};
pub use error::{CoreError, CoreResult};
pub use geometry::{clamp, scale_factor, Point, Rect, Viewport};
pub use interaction::{Handle, Interaction, InteractionMachine};
pub use layout::{default_layout, Layout};
pub use merge::{merge_document, merge_layout, reconcile};
pub use schema::{ElementPatch, LayoutDocument, LayoutPatch, PosterFields, LAYOUT_VERSION};
pub use selection::{PropertyEdit, PropertyField, PropertyForm, SelectionState};
pub use session::{EditBox, EditorSession, HandleBox, Hit};

/// Poster core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
