//! Loads more of the open file when the viewport nears the end of the
//! loaded text.

use crate::buffer::AnnotatedBuffer;
use crate::error::Result;
use crate::source::{desired_chunk_length, ChunkedFileSource};
use serde::Serialize;
use std::io::Read;
use tracing::debug;

/// Default distance from the end of loaded content, in scroll units, at which
/// the next chunk is fetched.
pub const DEFAULT_SCROLL_THRESHOLD: i64 = 48;

/// Vertical scroll state reported by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPosition {
    /// Top of the viewport.
    pub value: i64,
    /// Total scrollable extent of the loaded content.
    pub maximum: i64,
    /// Height of the viewport.
    pub extent: i64,
}

impl ScrollPosition {
    pub fn new(value: i64, maximum: i64, extent: i64) -> Self {
        Self {
            value,
            maximum,
            extent,
        }
    }

    pub fn is_near_end(&self, threshold: i64) -> bool {
        self.value.saturating_add(self.extent).saturating_add(threshold) >= self.maximum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagerState {
    #[default]
    Idle,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageOutcome {
    /// A chunk of this many chars was appended.
    Appended(usize),
    NotNearEnd,
    AtEof,
    /// A fetch is already running.
    Busy,
}

#[derive(Debug, Clone)]
pub struct ScrollPager {
    state: PagerState,
    threshold: i64,
}

impl Default for ScrollPager {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD)
    }
}

impl ScrollPager {
    pub fn new(threshold: i64) -> Self {
        Self {
            state: PagerState::Idle,
            threshold: threshold.max(0),
        }
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Handle a scroll event: fetch and append the next chunk if the
    /// viewport is near the end of loaded content.
    pub fn on_scroll<R: Read>(
        &mut self,
        position: ScrollPosition,
        viewport_width: i64,
        source: &mut ChunkedFileSource<R>,
        buffer: &mut AnnotatedBuffer,
    ) -> Result<PageOutcome> {
        if source.is_eof() {
            return Ok(PageOutcome::AtEof);
        }
        if !position.is_near_end(self.threshold) {
            return Ok(PageOutcome::NotNearEnd);
        }
        self.load(viewport_width, source, buffer)
    }

    /// Fetch the next chunk regardless of scroll position.
    pub fn load<R: Read>(
        &mut self,
        viewport_width: i64,
        source: &mut ChunkedFileSource<R>,
        buffer: &mut AnnotatedBuffer,
    ) -> Result<PageOutcome> {
        if self.state == PagerState::Loading {
            return Ok(PageOutcome::Busy);
        }
        if source.is_eof() {
            return Ok(PageOutcome::AtEof);
        }

        self.state = PagerState::Loading;
        let chunk = source.read_chunk(desired_chunk_length(viewport_width));
        self.state = PagerState::Idle;

        let chunk = chunk?;
        let appended = chunk.chars().count();
        buffer.append_text(&chunk);
        debug!(appended, eof = source.is_eof(), "paged in chunk");

        if appended == 0 && source.is_eof() {
            return Ok(PageOutcome::AtEof);
        }
        Ok(PageOutcome::Appended(appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use std::io::{self, Cursor};

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "no access"))
        }
    }

    fn source(text: &str) -> ChunkedFileSource<Cursor<Vec<u8>>> {
        ChunkedFileSource::from_reader("mem", Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_near_end() {
        let pos = ScrollPosition::new(900, 1000, 80);
        assert!(pos.is_near_end(20));
        assert!(!pos.is_near_end(19));
        assert!(ScrollPosition::new(0, 0, 0).is_near_end(0));
        assert!(ScrollPosition::new(i64::MAX, 10, i64::MAX).is_near_end(5));
    }

    #[test]
    fn test_scroll_far_from_end_is_noop() {
        let mut pager = ScrollPager::new(10);
        let mut src = source(&"x".repeat(500));
        let mut buffer = AnnotatedBuffer::new();

        let outcome = pager
            .on_scroll(ScrollPosition::new(0, 1000, 100), 64, &mut src, &mut buffer)
            .unwrap();
        assert_eq!(outcome, PageOutcome::NotNearEnd);
        assert!(buffer.is_empty());
        assert_eq!(src.read_offset(), 0);
    }

    #[test]
    fn test_scroll_near_end_appends_chunk() {
        let mut pager = ScrollPager::default();
        let mut src = source(&"y".repeat(500));
        let mut buffer = AnnotatedBuffer::from_text("already ");

        let outcome = pager
            .on_scroll(ScrollPosition::new(950, 1000, 50), 100, &mut src, &mut buffer)
            .unwrap();
        assert_eq!(outcome, PageOutcome::Appended(100));
        assert_eq!(buffer.len(), 108);
        assert_eq!(buffer.span_count(), 0);
        assert_eq!(pager.state(), PagerState::Idle);
    }

    #[test]
    fn test_scroll_at_eof_is_noop() {
        let mut pager = ScrollPager::default();
        let mut src = source("tiny");
        let mut buffer = AnnotatedBuffer::new();
        let end = ScrollPosition::new(100, 100, 10);

        assert_eq!(
            pager.on_scroll(end, 64, &mut src, &mut buffer).unwrap(),
            PageOutcome::Appended(4)
        );
        assert!(src.is_eof());
        assert_eq!(
            pager.on_scroll(end, 64, &mut src, &mut buffer).unwrap(),
            PageOutcome::AtEof
        );
        assert_eq!(buffer.text(), "tiny");
    }

    #[test]
    fn test_busy_pager_does_not_fetch() {
        let mut pager = ScrollPager::default();
        pager.state = PagerState::Loading;
        let mut src = source("content");
        let mut buffer = AnnotatedBuffer::new();

        assert_eq!(
            pager.load(64, &mut src, &mut buffer).unwrap(),
            PageOutcome::Busy
        );
        assert_eq!(src.read_offset(), 0);
    }

    #[test]
    fn test_read_failure_returns_to_idle() {
        let mut pager = ScrollPager::default();
        let mut src = ChunkedFileSource::from_reader("locked.txt", BrokenReader);
        let mut buffer = AnnotatedBuffer::from_text("kept");

        let err = pager
            .on_scroll(ScrollPosition::new(0, 0, 0), 64, &mut src, &mut buffer)
            .unwrap_err();
        assert!(matches!(err, EditorError::FileRead { .. }));
        assert_eq!(pager.state(), PagerState::Idle);
        assert_eq!(buffer.text(), "kept");
    }

    #[test]
    fn test_negative_threshold_clamped() {
        assert_eq!(ScrollPager::new(-5).threshold(), 0);
    }
}
