//! User-facing status line.

use serde::Serialize;

use crate::backend::RecordId;

/// What the editor last did, shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum Status {
    /// Nothing has happened yet.
    Idle,
    /// Lookups or a stored layout are being fetched.
    Loading,
    /// The layout is ready to edit.
    Ready,
    /// A save is in flight.
    Saving,
    /// The layout was saved.
    Saved {
        /// Record the layout was stored under.
        #[serde(rename = "recordId")]
        record_id: RecordId,
    },
    /// An export is in flight.
    Exporting,
    /// The poster was exported and uploaded.
    Exported {
        /// Name of the written file.
        filename: String,
    },
    /// The last operation failed.
    Error(String),
}

impl Status {
    /// Whether the status reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str(""),
            Self::Loading => f.write_str("Loading..."),
            Self::Ready => f.write_str("Ready"),
            Self::Saving => f.write_str("Saving..."),
            Self::Saved { record_id } => write!(f, "Layout saved (record {record_id})"),
            Self::Exporting => f.write_str("Exporting..."),
            Self::Exported { filename } => write!(f, "Exported {filename}"),
            Self::Error(message) => write!(f, "Error: {message}"),
        }
    }
}
