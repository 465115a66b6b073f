//! Forward-only, read-once access to a file in UTF-8 chunks.

use crate::error::{EditorError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Smallest chunk `desired_chunk_length` will ask for.
pub const MIN_CHUNK_LENGTH: usize = 64;
/// Largest chunk `desired_chunk_length` will ask for.
pub const MAX_CHUNK_LENGTH: usize = 1 << 20;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Chars to request for a viewport `viewport_width` units wide.
///
/// Callers pass a pixel width scaled by however many lines they expect to
/// fill, or a fixed probe size. Zero and negative widths get the floor.
pub fn desired_chunk_length(viewport_width: i64) -> usize {
    let width = usize::try_from(viewport_width).unwrap_or(0);
    width.clamp(MIN_CHUNK_LENGTH, MAX_CHUNK_LENGTH)
}

/// Reads a file as successive chunks of text.
///
/// `read_offset` counts bytes handed to the caller and only grows. Once
/// `eof` is set every further read returns an empty string.
pub struct ChunkedFileSource<R = File> {
    path: PathBuf,
    reader: BufReader<R>,
    read_offset: u64,
    eof: bool,
    /// Bytes read from the file but not yet returned, kept across a failed
    /// read so a retry neither skips nor repeats text.
    pending: Vec<u8>,
    pending_chars: usize,
}

impl ChunkedFileSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EditorError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened file for chunked reading");
        Ok(Self::from_reader(path, file))
    }
}

impl<R: Read> ChunkedFileSource<R> {
    /// Wrap any reader. `path` is only used for error messages.
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            path: path.into(),
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, reader),
            read_offset: 0,
            eof: false,
            pending: Vec::new(),
            pending_chars: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_offset(&self) -> u64 {
        self.read_offset
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Read up to `desired_length` chars.
    ///
    /// Never splits a UTF-8 sequence. Returns fewer chars (possibly none)
    /// only when the file is exhausted, in which case `eof` is set. Invalid
    /// UTF-8 is replaced with U+FFFD.
    pub fn read_chunk(&mut self, desired_length: usize) -> Result<String> {
        if self.eof && self.pending.is_empty() {
            return Ok(String::new());
        }

        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    warn!(path = %self.path.display(), error = %source, "chunk read failed");
                    return Err(EditorError::FileRead {
                        path: self.path.clone(),
                        offset: self.read_offset + self.pending.len() as u64,
                        source,
                    });
                }
            };

            if buf.is_empty() {
                self.eof = true;
                break;
            }

            let mut take = 0;
            let mut filled = false;
            for &byte in buf {
                if starts_char(byte) {
                    if self.pending_chars >= desired_length {
                        filled = true;
                        break;
                    }
                    self.pending_chars += 1;
                }
                take += 1;
            }

            self.pending.extend_from_slice(&buf[..take]);
            self.reader.consume(take);

            if filled {
                break;
            }
        }

        let bytes = std::mem::take(&mut self.pending);
        self.pending_chars = 0;
        self.read_offset += bytes.len() as u64;

        let chunk = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    offset = self.read_offset,
                    "invalid UTF-8 in chunk, replacing"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        debug!(
            chars = desired_length,
            bytes = chunk.len(),
            offset = self.read_offset,
            eof = self.eof,
            "read chunk"
        );
        Ok(chunk)
    }
}

/// True for any byte that is not a UTF-8 continuation byte.
fn starts_char(byte: u8) -> bool {
    byte & 0b1100_0000 != 0b1000_0000
}
