use crate::checker::dictionary::Dictionary;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

// Pinned to a commit so a download always yields the same list.
const WORDLIST_BASE_URL: &str =
    "https://raw.githubusercontent.com/dwyl/english-words/6e4bc58ad764c3e6df8b5be4048671962c9d6a23";
const WORDLIST_VERSION: &str = "2023.12";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDictionary {
    pub language: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

fn data_dir() -> Result<PathBuf> {
    Config::data_dir().context("Failed to get data directory")
}

fn wordlist_url(language: &str) -> Result<String> {
    match language {
        "en_US" | "en_GB" => Ok(format!("{}/words_alpha.txt", WORDLIST_BASE_URL)),
        other => anyhow::bail!(
            "Language '{}' is not supported. Only 'en_US' and 'en_GB' are currently available.",
            other
        ),
    }
}

/// One lowercase word per non-empty line; single letters are dropped.
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|word| word.chars().count() > 1)
        .collect()
}

/// Every `*.dict` file in `dir`, sorted by language.
pub fn installed_dictionaries(dir: &Path) -> Result<Vec<InstalledDictionary>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("dict") {
            continue;
        }
        let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let size_bytes = fs::metadata(&path)?.len();
        found.push(InstalledDictionary {
            language: language.to_string(),
            path: path.clone(),
            size_bytes,
        });
    }
    found.sort_by(|a, b| a.language.cmp(&b.language));
    Ok(found)
}

pub fn list_dictionaries() -> Result<()> {
    let data_dir = data_dir()?;
    let installed = installed_dictionaries(&data_dir)?;

    if installed.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "The built-in word list is used until you run {}.",
            "spellpad dict download en_US".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();
    for dict in &installed {
        println!(
            "  {} {} ({})",
            "✓".green(),
            dict.language.cyan().bold(),
            format!("{}KB", dict.size_bytes / 1024).dimmed()
        );
    }
    println!();
    println!(
        "Data directory: {}",
        data_dir.display().to_string().dimmed()
    );

    Ok(())
}

pub fn download_dictionary(language: &str) -> Result<()> {
    let url = wordlist_url(language)?;
    println!(
        "{} dictionary for {} (version: {})...",
        "Downloading".cyan().bold(),
        language.yellow(),
        WORDLIST_VERSION.dimmed()
    );
    println!("Source: {}", url.dimmed());

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Downloading...");

    let response = reqwest::blocking::get(&url).context("Failed to download dictionary")?;
    if !response.status().is_success() {
        spinner.abandon_with_message("Download failed");
        anyhow::bail!("Failed to download dictionary: HTTP {}", response.status());
    }
    let content = response.text().context("Failed to read dictionary body")?;
    spinner.finish_with_message("Download complete");

    let words = parse_word_list(&content);
    info!(language, words = words.len(), "building dictionary");
    println!("Found {} words", words.len().to_string().yellow());

    let dict_path = data_dir()?.join(format!("{}.dict", language));
    Dictionary::build_from_words(&words, &dict_path)?;

    println!(
        "{} Dictionary installed: {}",
        "✓".green().bold(),
        dict_path.display().to_string().cyan()
    );
    Ok(())
}

pub fn update_dictionaries() -> Result<()> {
    let installed = installed_dictionaries(&data_dir()?)?;
    if installed.is_empty() {
        println!("{}", "No dictionaries to update.".yellow());
        return Ok(());
    }

    println!(
        "{} {} {}...",
        "Updating".cyan().bold(),
        installed.len(),
        if installed.len() == 1 {
            "dictionary"
        } else {
            "dictionaries"
        }
    );
    println!();

    for dict in installed {
        debug!(language = %dict.language, "updating dictionary");
        download_dictionary(&dict.language)?;
        println!();
    }

    println!("{} All dictionaries updated!", "✓".green().bold());
    Ok(())
}

pub fn show_info(language: &str) -> Result<()> {
    let path = Dictionary::installed_path(language).context("Failed to get data directory")?;

    if !path.exists() {
        let embedded = Dictionary::embedded()?;
        println!(
            "{} Dictionary for {} not installed.",
            "✗".red().bold(),
            language.yellow()
        );
        println!("  Built-in word list: {} words", embedded.len());
        println!(
            "Run {} to download it.",
            format!("spellpad dict download {}", language).cyan()
        );
        return Ok(());
    }

    let metadata = fs::metadata(&path)?;
    println!("{}", format!("Dictionary: {}", language).bold());
    println!("  Path: {}", path.display());
    println!("  Size: {} KB", metadata.len() / 1024);
    println!("  Version: {}", WORDLIST_VERSION);
    println!("  Format: FST");

    match Dictionary::load_from_path(&path) {
        Ok(dict) => println!("  Words: {}", dict.len().to_string().yellow()),
        Err(e) => println!("  {}: {:#}", "Error loading dictionary".red(), e),
    }

    Ok(())
}
