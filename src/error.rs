use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = EditorError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum EditorError {
    /// The oracle could not answer for this word. The engine leaves the word
    /// unclassified instead of surfacing this.
    #[error("spell oracle unavailable for '{word}': {reason}")]
    OracleUnavailable { word: String, reason: String },

    #[error("failed to open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {} at byte {offset}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed value for {key}: '{value}' ({reason})")]
    MalformedSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("range {start}..{end} is outside the buffer (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("no file is open for paging")]
    NoFileOpen,
}

impl EditorError {
    pub fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        EditorError::InvalidRange { start, end, len }
    }

    /// True for conditions the caller may retry or report to the user, as
    /// opposed to contract violations.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            EditorError::FileOpen { .. } | EditorError::FileRead { .. } | EditorError::FileWrite { .. }
        )
    }
}
