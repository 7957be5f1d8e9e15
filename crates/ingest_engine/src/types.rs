use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Root path or archive could not be opened; ends the episode.
    #[error("cannot read {}: {reason}", .path.display())]
    InputUnreadable { path: PathBuf, reason: String },
    /// A single file could not be read as text; recorded and skipped.
    #[error("failed to decode {}: {reason}", .path.display())]
    FileDecodeFailed { path: PathBuf, reason: String },
    /// A container was requested while another one is being processed.
    #[error("already processing {active}")]
    Busy { active: String },
    #[error("cancelled")]
    Cancelled,
}

impl IngestError {
    pub(crate) fn unreadable(path: &Path, reason: impl ToString) -> Self {
        IngestError::InputUnreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode_failed(path: &Path, reason: impl ToString) -> Self {
        IngestError::FileDecodeFailed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// A file that was enumerated but left out of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub relative_path: String,
    pub error: IngestError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// Enumeration finished; `total` files will be read.
    Enumerated { total: usize },
    /// One more file was read or skipped.
    ItemFinished { completed: usize, total: usize },
}

/// Merged output of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub content: String,
    pub item_count: usize,
    pub skipped: Vec<SkippedFile>,
}
