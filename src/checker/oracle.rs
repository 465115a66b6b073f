use crate::error::{EditorError, Result};
use std::collections::HashSet;
use std::ops::Range;

/// Answers whether a single word is correctly spelled.
///
/// An `Err` means the oracle cannot answer (dictionary missing, backend
/// down). The engine treats that word as unclassified.
pub trait SpellOracle {
    fn is_correct(&self, word: &str) -> Result<bool>;

    /// Char ranges of `content` that are not prose (URLs, addresses, hashes).
    /// Words touching these ranges count as correct without a lookup.
    fn ignored_ranges(&self, _content: &str) -> Vec<Range<usize>> {
        Vec::new()
    }
}

impl<O: SpellOracle + ?Sized> SpellOracle for Box<O> {
    fn is_correct(&self, word: &str) -> Result<bool> {
        (**self).is_correct(word)
    }

    fn ignored_ranges(&self, content: &str) -> Vec<Range<usize>> {
        (**self).ignored_ranges(content)
    }
}

impl<O: SpellOracle + ?Sized> SpellOracle for &O {
    fn is_correct(&self, word: &str) -> Result<bool> {
        (**self).is_correct(word)
    }

    fn ignored_ranges(&self, content: &str) -> Vec<Range<usize>> {
        (**self).ignored_ranges(content)
    }
}

/// Case-insensitive in-memory word set.
#[derive(Debug, Clone, Default)]
pub struct WordListOracle {
    words: HashSet<String>,
}

impl WordListOracle {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Parse a word-per-line list. Blank lines and `#` comments are skipped.
    pub fn from_lines(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SpellOracle for WordListOracle {
    fn is_correct(&self, word: &str) -> Result<bool> {
        Ok(self.contains(word))
    }
}

/// Oracle with no backing dictionary. Every lookup fails, so nothing gets
/// classified. Used when no dictionary could be loaded.
#[derive(Debug, Clone)]
pub struct UnavailableOracle {
    reason: String,
}

impl UnavailableOracle {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpellOracle for UnavailableOracle {
    fn is_correct(&self, word: &str) -> Result<bool> {
        Err(EditorError::OracleUnavailable {
            word: word.to_string(),
            reason: self.reason.clone(),
        })
    }
}
