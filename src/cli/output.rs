use crate::buffer::{AnnotatedBuffer, Classification, Rgb};
use crate::settings::Settings;
use crate::SpellCheckResult;
use colored::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A misspelled word located by line and column (both 1-based, columns in chars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Misspelling {
    pub word: String,
    pub line: usize,
    pub column: usize,
}

/// Per-file entry of the JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub error_count: usize,
    pub word_count: usize,
    pub fully_loaded: bool,
    pub errors: Vec<Misspelling>,
}

impl FileReport {
    pub fn new(
        file_path: &Path,
        buffer: &AnnotatedBuffer,
        result: &SpellCheckResult,
        fully_loaded: bool,
    ) -> Self {
        Self {
            file: file_path.display().to_string(),
            error_count: result.error_count,
            word_count: result.word_count,
            fully_loaded,
            errors: misspellings(buffer),
        }
    }
}

/// Every `Incorrect` span in the buffer, in document order.
pub fn misspellings(buffer: &AnnotatedBuffer) -> Vec<Misspelling> {
    let mut found = Vec::new();
    let mut spans = buffer
        .spans()
        .filter(|(_, class)| *class == Classification::Incorrect)
        .peekable();

    let (mut line, mut column) = (1, 1);
    let mut word = String::new();

    for (offset, ch) in buffer.text().chars().enumerate() {
        let Some((range, _)) = spans.peek() else {
            break;
        };
        if range.contains(&offset) {
            if word.is_empty() {
                found.push(Misspelling {
                    word: String::new(),
                    line,
                    column,
                });
            }
            word.push(ch);
            if offset + 1 == range.end {
                if let Some(last) = found.last_mut() {
                    last.word = std::mem::take(&mut word);
                }
                spans.next();
            }
        }

        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    found
}

/// Render the buffer text with each classified word drawn in its palette
/// color. Misspelled words are also underlined.
pub fn render_buffer(buffer: &AnnotatedBuffer, colored_output: bool) -> String {
    if !colored_output {
        return buffer.text().to_string();
    }

    let text = buffer.text();
    let mut out = String::with_capacity(text.len() * 2);
    let mut chars = text.chars();
    let mut pos = 0;

    for styled in buffer.styled_spans() {
        out.extend(chars.by_ref().take(styled.range.start - pos));
        let word: String = chars.by_ref().take(styled.range.len()).collect();
        pos = styled.range.end;

        let painted = paint(&word, styled.color);
        match styled.classification {
            Classification::Correct => out.push_str(&painted.to_string()),
            Classification::Incorrect => out.push_str(&painted.underline().to_string()),
        }
    }
    out.extend(chars);
    out
}

fn paint(text: &str, color: Rgb) -> ColoredString {
    text.truecolor(color.r, color.g, color.b)
}

/// Every file's report as one JSON array.
pub fn print_json_reports(reports: &[FileReport]) {
    match serde_json::to_string_pretty(reports) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode report: {}", e),
    }
}

pub fn print_text_report(report: &FileReport, colored_output: bool) {
    if report.errors.is_empty() {
        return;
    }

    let file_name = report.file.as_str();
    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for error in &report.errors {
        let position = format!("{}:{}", error.line, error.column);
        if colored_output {
            println!("  {} {}", position.blue().bold(), error.word.red().bold());
        } else {
            println!("  {} {}", position, error.word);
        }
    }
}

pub fn print_check_summary(total_errors: usize, files: &[impl AsRef<Path>], colored: bool) {
    println!();
    let file_word = if files.len() == 1 { "file" } else { "files" };
    if total_errors == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word,
                files.len(),
                file_word
            );
        } else {
            println!(
                "✗ {} {} found in {} {}",
                total_errors,
                error_word,
                files.len(),
                file_word
            );
        }
    }
}

pub fn print_settings(settings: &Settings, path: Option<&Path>, colored: bool) {
    if let Some(path) = path {
        println!("# {}", path.display());
    }
    for line in settings.to_string().lines() {
        if colored {
            if let Some((key, value)) = line.split_once('=') {
                println!("{}={}", key.cyan(), value);
                continue;
            }
        }
        println!("{}", line);
    }

    if colored {
        println!(
            "\n{} {}",
            paint("correct", settings.palette.correct),
            paint("incorrect", settings.palette.incorrect).underline()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> AnnotatedBuffer {
        let mut buffer = AnnotatedBuffer::from_text("good bda\nwrod ok");
        buffer.set_span_color(0..4, Classification::Correct).unwrap();
        buffer.set_span_color(5..8, Classification::Incorrect).unwrap();
        buffer.set_span_color(9..13, Classification::Incorrect).unwrap();
        buffer
    }

    #[test]
    fn test_misspellings_have_positions() {
        let found = misspellings(&buffer());
        assert_eq!(
            found,
            vec![
                Misspelling {
                    word: "bda".to_string(),
                    line: 1,
                    column: 6
                },
                Misspelling {
                    word: "wrod".to_string(),
                    line: 2,
                    column: 1
                },
            ]
        );
    }

    #[test]
    fn test_json_reports_form_one_array() {
        let result = SpellCheckResult {
            error_count: 2,
            word_count: 4,
            unclassified_count: 0,
        };
        let reports = vec![
            FileReport::new(Path::new("a.txt"), &buffer(), &result, true),
            FileReport::new(Path::new("b.txt"), &buffer(), &result, false),
        ];
        let json = serde_json::to_string(&reports).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["file"], "b.txt");
        assert_eq!(value[1]["fully_loaded"], false);
        assert_eq!(value[0]["errors"][1]["word"], "wrod");
    }

    #[test]
    fn test_plain_render_is_text() {
        assert_eq!(render_buffer(&buffer(), false), "good bda\nwrod ok");
    }

    #[test]
    fn test_colored_render_keeps_text() {
        colored::control::set_override(true);
        let rendered = render_buffer(&buffer(), true);
        colored::control::unset_override();

        assert!(rendered.contains("bda"));
        assert!(rendered.contains("\x1b["));
        assert!(rendered.ends_with(" ok"));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Text.to_string(), "text");
    }
}
