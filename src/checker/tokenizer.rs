use crate::text::{byte_index, char_index};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Punctuation that ends a word in addition to whitespace. Apostrophes and
/// hyphens are not listed: "don't" and "well-known" stay whole.
const DELIMITERS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '(', ')', '[', ']', '{', '}', '<', '>', '/', '\\', '|',
    '*', '_', '=', '+', '#', '@', '&', '~', '^', '`', '\u{2013}', '\u{2014}', '\u{2026}',
    '\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}',
];

/// A word located in some content. `range` is in chars, half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub range: Range<usize>,
    pub text: String,
}

impl WordSpan {
    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

pub fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || DELIMITERS.contains(&ch)
}

/// Keys that finish a word while typing and trigger a last-word check.
pub fn ends_word(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}

/// Split content into words, in order.
pub fn words(content: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut word_start = 0;
    let mut pos = 0;

    for grapheme in content.graphemes(true) {
        let ch = grapheme.chars().next().unwrap_or(' ');
        let width = grapheme.chars().count();

        if is_delimiter(ch) {
            if !current.is_empty() {
                spans.push(WordSpan {
                    range: word_start..pos,
                    text: std::mem::take(&mut current),
                });
            }
        } else {
            if current.is_empty() {
                word_start = pos;
            }
            current.push_str(grapheme);
        }

        pos += width;
    }

    if !current.is_empty() {
        spans.push(WordSpan {
            range: word_start..pos,
            text: current,
        });
    }

    spans
}

/// The word ending at or containing `caret` (a char offset).
///
/// Delimiters directly before the caret are skipped, so a caret placed
/// right after a freshly typed space or newline still finds the word
/// before it. Returns `None` when there is no such word or the caret is past
/// the end of `content`.
pub fn word_at(content: &str, caret: usize) -> Option<WordSpan> {
    let caret_byte = byte_index(content, caret)?;
    let anchor = content[..caret_byte].trim_end_matches(is_delimiter).len();
    if anchor == 0 {
        return None;
    }

    // Words never contain newlines, so only the anchor's line needs scanning.
    let line_start = content[..anchor].rfind('\n').map_or(0, |i| i + 1);
    let line_end = content[anchor..]
        .find('\n')
        .map_or(content.len(), |i| anchor + i);

    let line = &content[line_start..line_end];
    let target = char_index(line, anchor - line_start);
    let base = char_index(content, line_start);

    words(line)
        .into_iter()
        .find(|w| w.range.start < target && target <= w.range.end)
        .map(|w| WordSpan {
            range: w.range.start + base..w.range.end + base,
            text: w.text,
        })
}
