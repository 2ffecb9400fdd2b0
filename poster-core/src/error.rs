//! Error types for poster layout operations.

use thiserror::Error;

use crate::element::ElementKey;
use crate::interaction::Handle;

/// Result type for core layout operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in layout operations.
///
/// Geometry input is never an error: out-of-range values are clamped. These
/// variants only cover requests the editor cannot honour at all.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An element key string did not name any known element.
    #[error("Unknown element key: {0}")]
    UnknownElement(String),

    /// A handle string did not name any known resize handle.
    #[error("Unknown resize handle: {0}")]
    UnknownHandle(String),

    /// A property name did not name any panel field.
    #[error("Unknown property field: {0}")]
    UnknownProperty(String),

    /// A pointer session is already in progress.
    #[error("Interaction already active on {0}")]
    InteractionActive(ElementKey),

    /// The element kind does not expose the requested handle.
    #[error("Handle {handle} is not exposed on {key}")]
    HandleNotExposed {
        /// Element the pointer went down on.
        key: ElementKey,
        /// Handle that was requested.
        handle: Handle,
    },

    /// The asset slot list is full.
    #[error("All {0} asset slots are already bound")]
    SlotsFull(usize),

    /// Layout document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
