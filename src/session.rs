//! One editing session: the document buffer, the spell-check engine and the
//! file currently being paged in.
//!
//! The UI owns a single `EditorSession` and routes keystrokes, scroll events
//! and menu commands to it. Everything runs synchronously on the caller's
//! thread.

use crate::buffer::{AnnotatedBuffer, Classification, Rgb};
use crate::checker::oracle::SpellOracle;
use crate::checker::tokenizer;
use crate::checker::SpellCheckEngine;
use crate::error::{EditorError, Result};
use crate::pager::{PageOutcome, ScrollPager, ScrollPosition};
use crate::settings::{FontDescriptor, FontStyle, Settings, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::source::{desired_chunk_length, ChunkedFileSource};
use crate::{Config, SpellCheckResult};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct EditorSession {
    buffer: AnnotatedBuffer,
    engine: SpellCheckEngine,
    source: Option<ChunkedFileSource>,
    pager: ScrollPager,
    font: FontDescriptor,
    initial_width_factor: i64,
    scroll_probe_width: i64,
    /// Text as of the last open or save, grown as chunks are paged in.
    saved_text: String,
}

impl EditorSession {
    pub fn new(oracle: impl SpellOracle + 'static, config: &Config, settings: Settings) -> Self {
        Self {
            buffer: AnnotatedBuffer::with_palette(settings.palette),
            engine: SpellCheckEngine::new(oracle),
            source: None,
            pager: ScrollPager::new(config.scroll_threshold),
            font: settings.font,
            initial_width_factor: config.initial_width_factor,
            scroll_probe_width: config.scroll_probe_width,
            saved_text: String::new(),
        }
    }

    pub fn buffer(&self) -> &AnnotatedBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// Path of the file being paged in, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.path())
    }

    /// True when no file is open or the open file has been read to the end.
    pub fn is_fully_loaded(&self) -> bool {
        self.source.as_ref().map_or(true, |s| s.is_eof())
    }

    /// True when the text differs from what was last opened or saved.
    pub fn is_modified(&self) -> bool {
        self.buffer.text() != self.saved_text
    }

    /// Current appearance, for persisting at shutdown.
    pub fn settings(&self) -> Settings {
        Settings {
            font: self.font.clone(),
            palette: self.buffer.palette(),
        }
    }

    pub fn current_font(&self) -> &FontDescriptor {
        &self.font
    }

    /// Store the font used for rendering. Sizes outside the supported range
    /// are clamped.
    pub fn set_font(&mut self, family: impl Into<String>, size: u32, style: FontStyle) {
        self.font = FontDescriptor {
            family: family.into(),
            size: size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            style,
        };
        debug!(font = ?self.font, "font changed");
    }

    pub fn set_palette(&mut self, correct: Rgb, incorrect: Rgb) {
        self.buffer.set_palette(correct, incorrect);
    }

    /// Open `path` for lazy loading, replacing the current document.
    ///
    /// The first chunk is sized from `viewport_width` and checked right away.
    /// If the file cannot be opened the current document is left untouched.
    pub fn open_file(&mut self, path: impl AsRef<Path>, viewport_width: i64) -> Result<SpellCheckResult> {
        let path = path.as_ref();
        let mut source = ChunkedFileSource::open(path)?;

        self.buffer = AnnotatedBuffer::with_palette(self.buffer.palette());
        self.pager = ScrollPager::new(self.pager.threshold());
        self.saved_text.clear();

        let first = source.read_chunk(desired_chunk_length(
            viewport_width.saturating_mul(self.initial_width_factor),
        ));
        self.source = Some(source);
        let first = first?;
        self.buffer.append_text(&first);
        self.saved_text.push_str(&first);

        info!(
            path = %path.display(),
            chars = self.buffer.len(),
            eof = self.is_fully_loaded(),
            "opened file"
        );
        self.check_text_area()
    }

    /// Drop the open file and start an empty document.
    pub fn close_file(&mut self) {
        self.source = None;
        self.buffer = AnnotatedBuffer::with_palette(self.buffer.palette());
        self.saved_text.clear();
    }

    /// Append the next chunk of the open file. Appended text is not checked.
    pub fn load_next_chunk(&mut self, viewport_width: i64) -> Result<PageOutcome> {
        let source = self.source.as_mut().ok_or(EditorError::NoFileOpen)?;
        let outcome = self.pager.load(viewport_width, source, &mut self.buffer)?;
        self.track_appended(outcome)
    }

    /// Page in more text if the viewport is close to the end of what is
    /// loaded. A no-op when no file is open.
    pub fn on_scroll(&mut self, position: ScrollPosition) -> Result<PageOutcome> {
        let Some(source) = self.source.as_mut() else {
            return Ok(PageOutcome::AtEof);
        };
        let outcome =
            self.pager
                .on_scroll(position, self.scroll_probe_width, source, &mut self.buffer)?;
        self.track_appended(outcome)
    }

    /// Paged-in text comes straight from disk, so it joins the saved text.
    fn track_appended(&mut self, outcome: PageOutcome) -> Result<PageOutcome> {
        if let PageOutcome::Appended(n) = outcome {
            let len = self.buffer.len();
            let tail = self.buffer.slice(len.saturating_sub(n)..len)?;
            self.saved_text.push_str(tail);
        }
        Ok(outcome)
    }

    /// Page until the end of the file. Returns the number of chars appended.
    pub fn load_remaining(&mut self, viewport_width: i64) -> Result<usize> {
        let mut total = 0;
        loop {
            match self.load_next_chunk(viewport_width)? {
                PageOutcome::Appended(n) => total += n,
                PageOutcome::AtEof => break,
                PageOutcome::NotNearEnd | PageOutcome::Busy => {}
            }
            if self.is_fully_loaded() {
                break;
            }
        }
        Ok(total)
    }

    /// Insert typed text at `caret`. When it ends with a word-finishing key
    /// the word before it is checked.
    pub fn type_text(&mut self, caret: usize, text: &str) -> Result<Option<Classification>> {
        self.insert_text(caret, text)?;
        match text.chars().next_back() {
            Some(last) if tokenizer::ends_word(last) => {
                self.check_last_word(caret + text.chars().count())
            }
            _ => Ok(None),
        }
    }

    pub fn insert_text(&mut self, at: usize, text: &str) -> Result<()> {
        self.buffer.insert_text(at, text)
    }

    pub fn delete_text(&mut self, range: Range<usize>) -> Result<String> {
        self.buffer.delete_text(range)
    }

    pub fn check_last_word(&mut self, caret: usize) -> Result<Option<Classification>> {
        self.engine.check_last_word(&mut self.buffer, caret)
    }

    pub fn check_text_area(&mut self) -> Result<SpellCheckResult> {
        self.engine.check_text_area(&mut self.buffer)
    }

    /// Write the document to `path`. A partly paged file is read to the end
    /// first, so the unread tail is never lost.
    pub fn save_to(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if !self.is_fully_loaded() {
            let appended = self.load_remaining(self.scroll_probe_width)?;
            debug!(appended, "paged in rest of file before saving");
        }
        fs::write(&path, self.buffer.text())
            .map_err(|source| EditorError::FileWrite { path: path.clone(), source })?;
        self.saved_text = self.buffer.text().to_string();
        info!(path = %path.display(), chars = self.buffer.len(), "saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::oracle::WordListOracle;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn session() -> EditorSession {
        let oracle = WordListOracle::new(["hello", "world", "this", "is", "fine", "lorem", "ipsum"]);
        EditorSession::new(oracle, &Config::default(), Settings::default())
    }

    fn temp_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_open_small_file_checks_it() {
        let file = temp_file("Helo wrold. This is fine.");
        let mut session = session();
        let result = session.open_file(file.path(), 800).unwrap();

        assert_eq!(result.error_count, 2);
        assert!(session.is_fully_loaded());
        assert_eq!(session.text(), "Helo wrold. This is fine.");
        assert_eq!(session.file_path(), Some(file.path()));
        assert!(!session.is_modified());
    }

    #[test]
    fn test_open_missing_file_keeps_document() {
        let mut session = session();
        session.type_text(0, "hello ").unwrap();
        let dir = tempdir().unwrap();

        let err = session.open_file(dir.path().join("gone.txt"), 800).unwrap_err();
        assert!(matches!(err, EditorError::FileOpen { .. }));
        assert_eq!(session.text(), "hello ");
    }

    #[test]
    fn test_chunk_size_does_not_change_content() {
        let text: String = "lorem ipsum dolor sit amet ".repeat(371)[..10_000].to_string();
        let file = temp_file(&text);

        let mut small = session();
        small.open_file(file.path(), 0).unwrap();
        while !small.is_fully_loaded() {
            small.load_next_chunk(500).unwrap();
        }

        let mut large = session();
        large.open_file(file.path(), 0).unwrap();
        large.load_remaining(2_000).unwrap();

        assert_eq!(small.text(), text);
        assert_eq!(large.text(), text);
    }

    #[test]
    fn test_scroll_pages_in_until_eof() {
        let text = "hello world ".repeat(100);
        let file = temp_file(&text);
        let mut session = session();
        session.open_file(file.path(), 1).unwrap();
        let initial = session.buffer().len();
        assert!(initial < text.len());

        let bottom = ScrollPosition::new(1000, 1000, 100);
        let far = ScrollPosition::new(0, 1000, 100);
        assert_eq!(session.on_scroll(far).unwrap(), PageOutcome::NotNearEnd);
        assert_eq!(session.buffer().len(), initial);

        let mut guard = 0;
        while session.on_scroll(bottom).unwrap() != PageOutcome::AtEof {
            guard += 1;
            assert!(guard < 1000);
        }
        assert_eq!(session.text(), text);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_paged_text_is_not_checked() {
        let text = format!("{}wrold", "hello ".repeat(40));
        let file = temp_file(&text);
        let mut session = session();
        session.open_file(file.path(), 1).unwrap();
        let spans_before = session.buffer().span_count();
        session.load_remaining(64).unwrap();

        assert_eq!(session.text(), text);
        assert!(session.buffer().span_count() <= spans_before);
        assert_eq!(session.buffer().error_count(), 0);
        assert_eq!(session.check_text_area().unwrap().error_count, 1);
    }

    #[test]
    fn test_load_without_file() {
        let mut session = session();
        assert!(matches!(
            session.load_next_chunk(100),
            Err(EditorError::NoFileOpen)
        ));
        assert_eq!(
            session.on_scroll(ScrollPosition::new(0, 0, 0)).unwrap(),
            PageOutcome::AtEof
        );
    }

    #[test]
    fn test_typing_checks_on_word_boundary() {
        let mut session = session();
        assert_eq!(session.type_text(0, "hel").unwrap(), None);
        assert_eq!(session.buffer().span_count(), 0);
        assert_eq!(
            session.type_text(3, "lo ").unwrap(),
            Some(Classification::Correct)
        );
        assert_eq!(
            session.type_text(6, "wrold\n").unwrap(),
            Some(Classification::Incorrect)
        );
        assert_eq!(session.buffer().span(0..5), Some(Classification::Correct));
        assert_eq!(session.buffer().span(6..11), Some(Classification::Incorrect));
        assert!(session.is_modified());
    }

    #[test]
    fn test_editing_word_invalidates_its_span() {
        let mut session = session();
        session.type_text(0, "hello wrold ").unwrap();
        session.check_text_area().unwrap();
        assert_eq!(session.buffer().error_count(), 1);

        session.delete_text(7..9).unwrap();
        session.insert_text(7, "or").unwrap();
        assert_eq!(session.text(), "hello world ");
        assert_eq!(session.buffer().span(0..5), Some(Classification::Correct));
        assert_eq!(session.buffer().classification_at(7), None);

        assert_eq!(session.check_last_word(12).unwrap(), Some(Classification::Correct));
        assert_eq!(session.buffer().error_count(), 0);
    }

    #[test]
    fn test_palette_and_font_round_trip_through_settings() {
        let mut session = session();
        session.set_palette(Rgb::new(0, 0, 255), Rgb::new(255, 165, 0));
        session.set_font("Monospaced", 500, FontStyle::Bold);

        let settings = session.settings();
        assert_eq!(settings.font.size, MAX_FONT_SIZE);
        assert_eq!(settings.font.family, "Monospaced");
        assert_eq!(Settings::parse(&settings.to_string()), settings);
    }

    #[test]
    fn test_save_clears_modified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut session = session();
        session.type_text(0, "hello world").unwrap();
        assert!(session.is_modified());

        session.save_to(&path).unwrap();
        assert!(!session.is_modified());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn test_save_over_partly_paged_file_keeps_tail() {
        let text = "hello world this is fine ".repeat(800);
        let file = temp_file(&text);
        let mut session = session();
        session.open_file(file.path(), 1).unwrap();
        assert!(!session.is_fully_loaded());
        assert!(session.buffer().len() < 100);

        session.save_to(file.path()).unwrap();

        assert!(session.is_fully_loaded());
        assert_eq!(session.text(), text);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), text);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_undoing_an_edit_is_not_a_modification() {
        let file = temp_file("hello world");
        let mut session = session();
        session.open_file(file.path(), 800).unwrap();

        session.type_text(5, ",").unwrap();
        assert!(session.is_modified());
        session.delete_text(5..6).unwrap();
        assert!(!session.is_modified());
    }

    #[test]
    fn test_paged_text_is_not_a_modification() {
        let text = "hello world ".repeat(200);
        let file = temp_file(&text);
        let mut session = session();
        session.open_file(file.path(), 1).unwrap();
        session.insert_text(0, "well ").unwrap();
        session.load_remaining(64).unwrap();
        assert!(session.is_modified());

        session.delete_text(0..5).unwrap();
        assert_eq!(session.text(), text);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_new_file_replaces_previous_state() {
        let first = temp_file("wrold wrold wrold");
        let second = temp_file("hello");
        let mut session = session();
        session.open_file(first.path(), 800).unwrap();
        assert_eq!(session.buffer().error_count(), 3);

        session.open_file(second.path(), 800).unwrap();
        assert_eq!(session.text(), "hello");
        assert_eq!(session.buffer().error_count(), 0);
        assert_eq!(session.file_path(), Some(second.path()));
    }
}
