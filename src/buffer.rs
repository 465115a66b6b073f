//! Document text plus non-overlapping correctness spans.
//!
//! All offsets are char offsets into the content, and ranges are half-open.
//! Any span that a mutation overlaps or touches is dropped: its word may have
//! changed, so it stays unclassified until the next check. Inserting text that
//! begins or ends with a delimiter next to a word keeps that word's span. The
//! buffer never guesses a classification.

use crate::checker::tokenizer::is_delimiter;
use crate::error::{EditorError, Result};
use crate::text::{byte_index, char_len};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Rendering hint for each classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub correct: Rgb,
    pub incorrect: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            correct: Rgb::BLACK,
            incorrect: Rgb::RED,
        }
    }
}

impl Palette {
    pub fn color_for(&self, classification: Classification) -> Rgb {
        match classification {
            Classification::Correct => self.correct,
            Classification::Incorrect => self.incorrect,
        }
    }
}

/// A classified range together with the color it should be drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    pub range: Range<usize>,
    pub classification: Classification,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    end: usize,
    classification: Classification,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotatedBuffer {
    content: String,
    len: usize,
    /// Keyed by span start.
    spans: BTreeMap<usize, Span>,
    palette: Palette,
}

impl AnnotatedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let content = text.into();
        Self {
            len: char_len(&content),
            content,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn slice(&self, range: Range<usize>) -> Result<&str> {
        let (start, end) = self.byte_range(&range)?;
        Ok(&self.content[start..end])
    }

    pub fn insert_text(&mut self, at: usize, text: &str) -> Result<()> {
        let byte = byte_index(&self.content, at)
            .ok_or_else(|| EditorError::invalid_range(at, at, self.len))?;
        if text.is_empty() {
            return Ok(());
        }

        let inserted = char_len(text);
        self.content.insert_str(byte, text);
        self.len += inserted;

        // A delimiter at the edge of the inserted text leaves the touching
        // word as it was.
        let keeps_left = text.chars().next().is_some_and(is_delimiter);
        let keeps_right = text.chars().next_back().is_some_and(is_delimiter);

        self.spans = std::mem::take(&mut self.spans)
            .into_iter()
            .filter_map(|(start, span)| {
                if span.end < at || (span.end == at && keeps_left) {
                    Some((start, span))
                } else if start > at || (start == at && keeps_right) {
                    Some((
                        start + inserted,
                        Span {
                            end: span.end + inserted,
                            ..span
                        },
                    ))
                } else {
                    trace!(start, end = span.end, "span invalidated by insert");
                    None
                }
            })
            .collect();

        Ok(())
    }

    /// Append at the end of the content. A span that ends exactly at the old
    /// end is dropped, since the appended text may continue its word.
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some((&start, span)) = self.spans.iter().next_back() {
            if span.end == self.len {
                self.spans.remove(&start);
            }
        }
        self.content.push_str(text);
        self.len += char_len(text);
    }

    /// Remove `range` and return the removed text.
    pub fn delete_text(&mut self, range: Range<usize>) -> Result<String> {
        let (start_byte, end_byte) = self.byte_range(&range)?;
        if range.is_empty() {
            return Ok(String::new());
        }

        let removed: String = self.content.drain(start_byte..end_byte).collect();
        let removed_len = range.end - range.start;
        self.len -= removed_len;

        self.spans = std::mem::take(&mut self.spans)
            .into_iter()
            .filter_map(|(start, span)| {
                if span.end < range.start {
                    Some((start, span))
                } else if start > range.end {
                    Some((
                        start - removed_len,
                        Span {
                            end: span.end - removed_len,
                            ..span
                        },
                    ))
                } else {
                    trace!(start, end = span.end, "span invalidated by delete");
                    None
                }
            })
            .collect();

        Ok(removed)
    }

    /// Replace the whole content and drop every span.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = text.into();
        self.len = char_len(&self.content);
        self.spans.clear();
    }

    /// Record a classification for `range`. Spans that overlap it are
    /// replaced, so the last write wins.
    pub fn set_span_color(
        &mut self,
        range: Range<usize>,
        classification: Classification,
    ) -> Result<()> {
        if range.is_empty() || range.end > self.len {
            return Err(EditorError::invalid_range(range.start, range.end, self.len));
        }

        self.remove_overlapping(&range);
        self.spans.insert(
            range.start,
            Span {
                end: range.end,
                classification,
            },
        );
        Ok(())
    }

    /// Drop any classification overlapping `range`. Returns whether something
    /// was removed.
    pub fn clear_span(&mut self, range: Range<usize>) -> Result<bool> {
        if range.start > range.end || range.end > self.len {
            return Err(EditorError::invalid_range(range.start, range.end, self.len));
        }
        Ok(self.remove_overlapping(&range) > 0)
    }

    pub fn clear_spans(&mut self) {
        self.spans.clear();
    }

    /// Exact-range lookup.
    pub fn span(&self, range: Range<usize>) -> Option<Classification> {
        self.spans
            .get(&range.start)
            .filter(|span| span.end == range.end)
            .map(|span| span.classification)
    }

    /// Classification of the char at `offset`, if it is inside a span.
    pub fn classification_at(&self, offset: usize) -> Option<Classification> {
        self.spans
            .range(..=offset)
            .next_back()
            .filter(|(_, span)| offset < span.end)
            .map(|(_, span)| span.classification)
    }

    pub fn spans(&self) -> impl Iterator<Item = (Range<usize>, Classification)> + '_ {
        self.spans
            .iter()
            .map(|(&start, span)| (start..span.end, span.classification))
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn error_count(&self) -> usize {
        self.spans
            .values()
            .filter(|span| span.classification == Classification::Incorrect)
            .count()
    }

    /// Update the rendering colors. Classifications are left as they are.
    pub fn set_palette(&mut self, correct: Rgb, incorrect: Rgb) {
        self.palette = Palette { correct, incorrect };
    }

    /// Current `(range, classification, color)` triples, in order.
    pub fn styled_spans(&self) -> Vec<StyledSpan> {
        self.spans()
            .map(|(range, classification)| StyledSpan {
                range,
                classification,
                color: self.palette.color_for(classification),
            })
            .collect()
    }

    fn byte_range(&self, range: &Range<usize>) -> Result<(usize, usize)> {
        let invalid = || EditorError::invalid_range(range.start, range.end, self.len);
        if range.start > range.end {
            return Err(invalid());
        }
        let start = byte_index(&self.content, range.start).ok_or_else(invalid)?;
        let end = start
            + byte_index(&self.content[start..], range.end - range.start).ok_or_else(invalid)?;
        Ok((start, end))
    }

    fn remove_overlapping(&mut self, range: &Range<usize>) -> usize {
        let overlapping: Vec<usize> = self
            .spans
            .range(..range.end.max(range.start + 1))
            .rev()
            .take_while(|(_, span)| span.end > range.start)
            .map(|(&start, _)| start)
            .collect();
        for start in &overlapping {
            self.spans.remove(start);
        }
        overlapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Classification::*;

    fn classified() -> AnnotatedBuffer {
        // "good bda word"
        let mut buffer = AnnotatedBuffer::from_text("good bda word");
        buffer.set_span_color(0..4, Correct).unwrap();
        buffer.set_span_color(5..8, Incorrect).unwrap();
        buffer.set_span_color(9..13, Correct).unwrap();
        buffer
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AnnotatedBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.error_count(), 0);
        assert!(buffer.styled_spans().is_empty());
    }

    #[test]
    fn test_insert_inside_word_invalidates_only_that_span() {
        let mut buffer = classified();
        buffer.insert_text(6, "a").unwrap();

        assert_eq!(buffer.text(), "good bada word");
        assert_eq!(buffer.span(0..4), Some(Correct));
        assert_eq!(buffer.span(5..8), None);
        assert_eq!(buffer.span(5..9), None);
        // Later span shifted by one char.
        assert_eq!(buffer.span(10..14), Some(Correct));
        assert_eq!(buffer.span_count(), 2);
    }

    #[test]
    fn test_insert_touching_word_end_invalidates_it() {
        let mut buffer = classified();
        buffer.insert_text(4, "s").unwrap();
        assert_eq!(buffer.text(), "goods bda word");
        assert_eq!(buffer.classification_at(0), None);
        assert_eq!(buffer.span(6..9), Some(Incorrect));
    }

    #[test]
    fn test_insert_delimiter_beside_word_keeps_span() {
        let mut buffer = classified();
        buffer.insert_text(4, ",").unwrap();
        assert_eq!(buffer.text(), "good, bda word");
        assert_eq!(buffer.span(0..4), Some(Correct));
        assert_eq!(buffer.span(6..9), Some(Incorrect));

        // Text ending in a delimiter right before a word.
        buffer.insert_text(6, "the ").unwrap();
        assert_eq!(buffer.text(), "good, the bda word");
        assert_eq!(buffer.span(10..13), Some(Incorrect));
        assert_eq!(buffer.span_count(), 3);
    }

    #[test]
    fn test_delete_inside_word() {
        let mut buffer = classified();
        let removed = buffer.delete_text(6..7).unwrap();
        assert_eq!(removed, "d");
        assert_eq!(buffer.text(), "good ba word");
        assert_eq!(buffer.span(0..4), Some(Correct));
        assert_eq!(buffer.classification_at(5), None);
        assert_eq!(buffer.span(8..12), Some(Correct));
    }

    #[test]
    fn test_delete_joining_words_invalidates_both() {
        let mut buffer = classified();
        buffer.delete_text(4..5).unwrap();
        assert_eq!(buffer.text(), "goodbda word");
        assert_eq!(buffer.span_count(), 1);
        assert_eq!(buffer.span(8..12), Some(Correct));
    }

    #[test]
    fn test_out_of_bounds_is_invalid_range() {
        let mut buffer = classified();
        assert!(matches!(
            buffer.insert_text(99, "x"),
            Err(EditorError::InvalidRange { .. })
        ));
        assert!(buffer.delete_text(10..20).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 5..2;
        assert!(buffer.delete_text(reversed).is_err());
        assert!(buffer.set_span_color(12..14, Correct).is_err());
        assert!(buffer.set_span_color(3..3, Correct).is_err());
        assert_eq!(buffer.text(), "good bda word");
    }

    #[test]
    fn test_set_span_last_write_wins() {
        let mut buffer = classified();
        buffer.set_span_color(5..8, Correct).unwrap();
        assert_eq!(buffer.span(5..8), Some(Correct));
        assert_eq!(buffer.error_count(), 0);
        assert_eq!(buffer.span_count(), 3);
    }

    #[test]
    fn test_set_span_replaces_overlapping() {
        let mut buffer = classified();
        buffer.set_span_color(2..7, Incorrect).unwrap();
        let spans: Vec<_> = buffer.spans().collect();
        assert_eq!(spans, vec![(2..7, Incorrect), (9..13, Correct)]);
    }

    #[test]
    fn test_clear_span() {
        let mut buffer = classified();
        assert!(buffer.clear_span(5..8).unwrap());
        assert!(!buffer.clear_span(5..8).unwrap());
        assert_eq!(buffer.span_count(), 2);
    }

    #[test]
    fn test_append_drops_trailing_span() {
        let mut buffer = classified();
        buffer.append_text("s here");
        assert_eq!(buffer.text(), "good bda words here");
        assert_eq!(buffer.span(9..13), None);
        assert_eq!(buffer.span_count(), 2);
        assert_eq!(buffer.len(), 19);
    }

    #[test]
    fn test_palette_changes_colors_not_classes() {
        let mut buffer = classified();
        let blue = Rgb::new(0, 0, 255);
        let orange = Rgb::new(255, 165, 0);
        buffer.set_palette(blue, orange);

        let styled = buffer.styled_spans();
        assert_eq!(styled[0].color, blue);
        assert_eq!(styled[1].classification, Incorrect);
        assert_eq!(styled[1].color, orange);
    }

    #[test]
    fn test_multibyte_offsets() {
        let mut buffer = AnnotatedBuffer::from_text("naïve café");
        buffer.set_span_color(6..10, Correct).unwrap();
        assert_eq!(buffer.slice(6..10).unwrap(), "café");
        buffer.insert_text(0, "très ").unwrap();
        assert_eq!(buffer.text(), "très naïve café");
        assert_eq!(buffer.span(11..15), Some(Correct));
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::RED.to_string(), "#ff0000");
    }
}
