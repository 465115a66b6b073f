pub mod buffer;
pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod error;
pub mod pager;
pub mod session;
pub mod settings;
pub mod source;
pub mod text;

pub use buffer::{AnnotatedBuffer, Classification, Palette, Rgb, StyledSpan};
pub use checker::oracle::{SpellOracle, WordListOracle};
pub use checker::SpellCheckEngine;
pub use config::Config;
pub use error::EditorError;
pub use pager::{PageOutcome, ScrollPager, ScrollPosition};
pub use session::EditorSession;
pub use settings::{FontDescriptor, FontStyle, Settings};
pub use source::ChunkedFileSource;

use serde::Serialize;

/// Outcome of a full-document spell check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpellCheckResult {
    pub error_count: usize,
    pub word_count: usize,
    /// Words the oracle could not answer for.
    pub unclassified_count: usize,
}

impl SpellCheckResult {
    /// Message shown when a check finishes, e.g. "Found 1 error".
    pub fn summary(&self) -> String {
        let noun = if self.error_count == 1 { "error" } else { "errors" };
        format!("Found {} {}", self.error_count, noun)
    }
}
