pub mod dictionary;
pub mod oracle;
pub mod tokenizer;

use crate::buffer::{AnnotatedBuffer, Classification};
use crate::error::{EditorError, Result};
use crate::text::{byte_index, char_index};
use crate::SpellCheckResult;
use oracle::SpellOracle;
use std::ops::Range;
use tokenizer::WordSpan;
use tracing::{debug, info};

/// Classifies words in an [`AnnotatedBuffer`] using an injected oracle.
pub struct SpellCheckEngine {
    oracle: Box<dyn SpellOracle>,
}

impl SpellCheckEngine {
    pub fn new(oracle: impl SpellOracle + 'static) -> Self {
        Self {
            oracle: Box::new(oracle),
        }
    }

    /// Check the word that ends at (or contains) `caret`.
    ///
    /// Called when a word-finishing key is typed. Returns the classification
    /// that was recorded, or `None` if there was no word or the oracle could
    /// not answer.
    pub fn check_last_word(
        &self,
        buffer: &mut AnnotatedBuffer,
        caret: usize,
    ) -> Result<Option<Classification>> {
        if caret > buffer.len() {
            return Err(EditorError::invalid_range(caret, caret, buffer.len()));
        }

        let Some(word) = tokenizer::word_at(buffer.text(), caret) else {
            return Ok(None);
        };

        let ignored = self.ignored_on_line(buffer.text(), &word);
        self.classify(buffer, &word, &ignored)
    }

    /// Reclassify every word in the buffer.
    pub fn check_text_area(&self, buffer: &mut AnnotatedBuffer) -> Result<SpellCheckResult> {
        let words = tokenizer::words(buffer.text());
        let ignored = self.oracle.ignored_ranges(buffer.text());
        buffer.clear_spans();

        let mut result = SpellCheckResult {
            word_count: words.len(),
            ..Default::default()
        };

        for word in &words {
            match self.classify(buffer, word, &ignored)? {
                Some(Classification::Incorrect) => result.error_count += 1,
                Some(Classification::Correct) => {}
                None => result.unclassified_count += 1,
            }
        }

        info!(
            words = result.word_count,
            errors = result.error_count,
            unclassified = result.unclassified_count,
            "spell check complete"
        );
        Ok(result)
    }

    /// Ignored ranges of the line holding `word`, in buffer offsets.
    fn ignored_on_line(&self, content: &str, word: &WordSpan) -> Vec<Range<usize>> {
        let Some(start) = byte_index(content, word.range.start) else {
            return Vec::new();
        };
        let line_start = content[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = content[start..]
            .find('\n')
            .map_or(content.len(), |i| start + i);
        let base = word.range.start - char_index(&content[line_start..], start - line_start);

        self.oracle
            .ignored_ranges(&content[line_start..line_end])
            .into_iter()
            .map(|r| r.start + base..r.end + base)
            .collect()
    }

    fn classify(
        &self,
        buffer: &mut AnnotatedBuffer,
        word: &WordSpan,
        ignored: &[Range<usize>],
    ) -> Result<Option<Classification>> {
        if ignored
            .iter()
            .any(|r| r.start < word.range.end && word.range.start < r.end)
        {
            buffer.set_span_color(word.range.clone(), Classification::Correct)?;
            return Ok(Some(Classification::Correct));
        }

        match self.oracle.is_correct(&word.text) {
            Ok(correct) => {
                let classification = if correct {
                    Classification::Correct
                } else {
                    Classification::Incorrect
                };
                buffer.set_span_color(word.range.clone(), classification)?;
                Ok(Some(classification))
            }
            Err(e) => {
                debug!(word = %word.text, error = %e, "leaving word unclassified");
                buffer.clear_span(word.range.clone())?;
                Ok(None)
            }
        }
    }
}
