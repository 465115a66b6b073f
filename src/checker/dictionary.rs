use crate::checker::oracle::{SpellOracle, WordListOracle};
use crate::error::Result as EditorResult;
use crate::text::char_len;
use crate::Config;
use anyhow::{Context, Result};
use fst::{Set, SetBuilder, Streamer};
use regex::Regex;
use std::fs::{self, File};
use std::io::BufWriter;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sorted word set stored as a finite state transducer.
pub struct Dictionary {
    set: Set<Vec<u8>>,
}

impl Dictionary {
    /// Load the installed dictionary for `language`, falling back to the
    /// embedded bootstrap list when none is installed.
    pub fn load(language: &str) -> Result<Self> {
        match Self::installed_path(language) {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => {
                info!(language, "no installed dictionary, using embedded word list");
                Self::embedded()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;
        let set = Set::new(bytes).context("Failed to parse dictionary")?;
        debug!(path = %path.display(), words = set.len(), "loaded dictionary");
        Ok(Self { set })
    }

    /// Build an in-memory dictionary from an unsorted word list.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = Set::from_iter(normalize(words)).context("Failed to build dictionary")?;
        Ok(Self { set })
    }

    pub fn embedded() -> Result<Self> {
        Self::from_words(EMBEDDED_WORDS.iter())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Every word, in order. Walks the whole set.
    pub fn words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(self.set.len());
        let mut stream = self.set.stream();
        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                words.push(word);
            }
        }
        words
    }

    /// Write a dictionary file from a word list.
    pub fn build_from_words(words: &[String], output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let file = File::create(output_path)
            .with_context(|| format!("Failed to create dictionary: {}", output_path.display()))?;
        let mut builder =
            SetBuilder::new(BufWriter::new(file)).context("Failed to create FST builder")?;

        for word in normalize(words) {
            builder
                .insert(word.as_bytes())
                .context("Failed to insert word into dictionary")?;
        }

        builder.finish().context("Failed to finalize dictionary")?;
        Ok(())
    }

    /// Path of the installed dictionary for `language` in the data directory.
    pub fn installed_path(language: &str) -> Option<PathBuf> {
        Config::data_dir().map(|dir| dir.join(format!("{}.dict", language)))
    }
}

fn normalize<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

/// Dictionary lookup layered with a personal word list, ignore patterns and
/// skip rules for things that are not prose (numbers, single letters).
pub struct DictionaryOracle {
    dictionary: Dictionary,
    personal_words: WordListOracle,
    ignore_patterns: Vec<Regex>,
    case_sensitive: bool,
}

impl DictionaryOracle {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            personal_words: WordListOracle::default(),
            ignore_patterns: Vec::new(),
            case_sensitive: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let dictionary = Dictionary::load(&config.language)?;

        let personal_words = match &config.personal_dictionary {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path)
                    .context("Failed to read personal dictionary")?;
                WordListOracle::from_lines(&content)
            }
            _ => WordListOracle::default(),
        };

        let mut ignore_patterns = Vec::new();
        for pattern in &config.ignore_patterns {
            match Regex::new(pattern) {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid ignore pattern"),
            }
        }

        Ok(Self {
            dictionary,
            personal_words,
            ignore_patterns,
            case_sensitive: config.case_sensitive,
        })
    }

    pub fn with_personal_words(mut self, words: WordListOracle) -> Self {
        self.personal_words = words;
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn should_ignore(&self, word: &str) -> bool {
        if word.chars().count() <= 1 {
            return true;
        }

        if word.chars().all(|c| c.is_numeric()) {
            return true;
        }

        self.ignore_patterns.iter().any(|p| p.is_match(word))
    }
}

impl SpellOracle for DictionaryOracle {
    fn is_correct(&self, word: &str) -> EditorResult<bool> {
        // Quotes and dashes at the edges belong to the sentence, not the word.
        let word = word.trim_matches(|c: char| c == '\'' || c == '-' || c == '\u{2019}');

        if word.is_empty() || self.should_ignore(word) {
            return Ok(true);
        }

        if self.personal_words.contains(word) {
            return Ok(true);
        }

        if self.case_sensitive {
            return Ok(self.dictionary.contains(word)
                || (is_capitalized(word) && self.dictionary.contains(&word.to_lowercase())));
        }

        Ok(self.dictionary.contains(&word.to_lowercase()))
    }

    fn ignored_ranges(&self, content: &str) -> Vec<Range<usize>> {
        let mut matches: Vec<Range<usize>> = self
            .ignore_patterns
            .iter()
            .flat_map(|p| p.find_iter(content).map(|m| m.range()))
            .filter(|r| !r.is_empty())
            .collect();
        matches.sort_by_key(|r| r.start);

        // Starts are sorted, so byte offsets convert in one forward pass.
        let (mut byte, mut chars) = (0, 0);
        matches
            .into_iter()
            .map(|r| {
                chars += char_len(&content[byte..r.start]);
                byte = r.start;
                chars..chars + char_len(&content[r.start..r.end])
            })
            .collect()
    }
}

fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.all(|c| !c.is_uppercase())
}

/// Bootstrap list used until a full dictionary is downloaded.
const EMBEDDED_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "ask", "at", "away", "back", "bad", "be", "because", "been", "before", "being",
    "below", "best", "better", "between", "big", "book", "both", "boy", "but", "by", "call",
    "came", "can", "car", "change", "check", "child", "city", "close", "come", "could", "country",
    "day", "did", "different", "do", "does", "done", "down", "each", "early", "easy", "edit",
    "editor", "end", "enough", "even", "ever", "every", "eye", "face", "fact", "family", "far",
    "few", "file", "find", "fine", "first", "follow", "font", "food", "for", "found", "from",
    "get", "girl", "give", "go", "good", "great", "group", "had", "hand", "has", "have", "he",
    "head", "hello", "help", "her", "here", "high", "him", "his", "home", "house", "how", "i",
    "idea", "if", "important", "in", "into", "is", "it", "its", "just", "keep", "kind", "know",
    "large", "last", "late", "learn", "leave", "left", "let", "life", "light", "like", "line",
    "little", "live", "long", "look", "made", "make", "man", "many", "may", "me", "mean", "men",
    "might", "more", "most", "mother", "move", "much", "must", "my", "name", "near", "need",
    "never", "new", "next", "night", "no", "not", "now", "number", "of", "off", "often", "old",
    "on", "once", "one", "only", "open", "or", "other", "our", "out", "over", "own", "page",
    "paper", "part", "people", "place", "play", "point", "put", "read", "real", "right", "room",
    "run", "said", "same", "save", "saw", "say", "school", "see", "seem", "set", "she", "should",
    "show", "side", "small", "so", "some", "something", "sound", "spell", "spelling", "start",
    "state", "still", "story", "study", "such", "take", "tell", "test", "text", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "thing", "think", "this", "those",
    "thought", "three", "through", "time", "to", "together", "too", "took", "tree", "try",
    "turn", "two", "under", "until", "up", "us", "use", "very", "walk", "want", "was", "watch",
    "water", "way", "we", "well", "went", "were", "what", "when", "where", "which", "while",
    "white", "who", "why", "will", "with", "without", "word", "words", "work", "world", "would",
    "write", "year", "yes", "you", "young", "your",
];
