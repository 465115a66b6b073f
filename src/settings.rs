//! Editor appearance settings persisted as `KEY=VALUE` lines.
//!
//! ```text
//! FONT_TYPE=Serif
//! FONT_SIZE=20
//! FONT_STYLE=0
//! CORRECT_COLOR=0/0/0
//! INCORRECT_COLOR=255/0/0
//! ```
//!
//! Unknown keys are ignored. A missing or malformed field keeps its default
//! and the rest of the file still loads.

use crate::buffer::{Palette, Rgb};
use crate::error::EditorError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const FONT_TYPE: &str = "FONT_TYPE";
pub const FONT_SIZE: &str = "FONT_SIZE";
pub const FONT_STYLE: &str = "FONT_STYLE";
pub const CORRECT_COLOR: &str = "CORRECT_COLOR";
pub const INCORRECT_COLOR: &str = "INCORRECT_COLOR";

/// Joins the components of an RGB triple.
pub const SEPARATOR: char = '/';

pub const DEFAULT_FONT_FAMILY: &str = "Serif";
pub const DEFAULT_FONT_SIZE: u32 = 20;
pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn code(self) -> u8 {
        match self {
            FontStyle::Plain => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FontStyle::Plain),
            1 => Some(FontStyle::Bold),
            2 => Some(FontStyle::Italic),
            3 => Some(FontStyle::BoldItalic),
            _ => None,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub size: u32,
    pub style: FontStyle,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.to_string(),
            size: DEFAULT_FONT_SIZE,
            style: FontStyle::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub font: FontDescriptor,
    pub palette: Palette,
}

impl Settings {
    /// Parse settings text, logging and skipping malformed fields.
    pub fn parse(text: &str) -> Self {
        let (settings, problems) = Self::parse_report(text);
        for problem in &problems {
            warn!("{}, using default", problem);
        }
        settings
    }

    /// Parse settings text and return every malformed field alongside.
    pub fn parse_report(text: &str) -> (Self, Vec<EditorError>) {
        let mut settings = Self::default();
        let mut problems = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!(line, "skipping settings line without '='");
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            if value.contains(char::REPLACEMENT_CHARACTER) {
                problems.push(EditorError::MalformedSetting {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "value is not valid UTF-8".to_string(),
                });
                continue;
            }

            let applied = match key {
                FONT_TYPE => parse_family(value).map(|v| settings.font.family = v),
                FONT_SIZE => parse_size(value).map(|v| settings.font.size = v),
                FONT_STYLE => parse_style(value).map(|v| settings.font.style = v),
                CORRECT_COLOR => parse_rgb(value).map(|v| settings.palette.correct = v),
                INCORRECT_COLOR => parse_rgb(value).map(|v| settings.palette.incorrect = v),
                _ => {
                    debug!(key, "ignoring unknown settings key");
                    Ok(())
                }
            };

            if let Err(reason) = applied {
                problems.push(EditorError::MalformedSetting {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason,
                });
            }
        }

        (settings, problems)
    }

    /// Read settings from `path`. A missing file yields the defaults.
    ///
    /// Bytes that are not UTF-8 only spoil the field they appear in.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}={}", FONT_TYPE, self.font.family)?;
        writeln!(f, "{}={}", FONT_SIZE, self.font.size)?;
        writeln!(f, "{}={}", FONT_STYLE, self.font.style.code())?;
        writeln!(f, "{}={}", CORRECT_COLOR, encode_rgb(self.palette.correct))?;
        writeln!(f, "{}={}", INCORRECT_COLOR, encode_rgb(self.palette.incorrect))
    }
}

pub fn encode_rgb(color: Rgb) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        color.r,
        color.g,
        color.b,
        sep = SEPARATOR
    )
}

pub fn parse_rgb(value: &str) -> Result<Rgb, String> {
    let parts: Vec<&str> = value.split(SEPARATOR).map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!(
            "expected three components separated by '{}'",
            SEPARATOR
        ));
    };
    let component = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| format!("'{}' is not a color component in 0..=255", s))
    };
    Ok(Rgb::new(component(*r)?, component(*g)?, component(*b)?))
}

fn parse_family(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("font family is empty".to_string());
    }
    Ok(value.to_string())
}

fn parse_size(value: &str) -> Result<u32, String> {
    let size: u32 = value
        .parse()
        .map_err(|_| "font size is not a number".to_string())?;
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        return Err(format!(
            "font size must be between {} and {}",
            MIN_FONT_SIZE, MAX_FONT_SIZE
        ));
    }
    Ok(size)
}

fn parse_style(value: &str) -> Result<FontStyle, String> {
    value
        .parse::<u8>()
        .ok()
        .and_then(FontStyle::from_code)
        .ok_or_else(|| "font style must be 0, 1, 2 or 3".to_string())
}
