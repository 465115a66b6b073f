use crate::pager::DEFAULT_SCROLL_THRESHOLD;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Scales the window width into the size of the first chunk of a file.
pub const DEFAULT_INITIAL_WIDTH_FACTOR: i64 = 19;
/// Fixed width probe used when paging on scroll.
pub const DEFAULT_SCROLL_PROBE_WIDTH: i64 = 96;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub language: String,
    pub personal_dictionary: Option<PathBuf>,
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: i64,

    #[serde(default = "default_initial_width_factor")]
    pub initial_width_factor: i64,

    #[serde(default = "default_scroll_probe_width")]
    pub scroll_probe_width: i64,

    /// Where appearance settings are stored; defaults to the config dir.
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
}

fn default_scroll_threshold() -> i64 {
    DEFAULT_SCROLL_THRESHOLD
}

fn default_initial_width_factor() -> i64 {
    DEFAULT_INITIAL_WIDTH_FACTOR
}

fn default_scroll_probe_width() -> i64 {
    DEFAULT_SCROLL_PROBE_WIDTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            personal_dictionary: None,
            ignore_patterns: vec![
                r"\b[A-Z0-9_]{2,}\b".to_string(),    // ALL_CAPS
                r"https?://\S+".to_string(),         // URLs
                r"\b[a-fA-F0-9]{32,}\b".to_string(), // Hashes
                r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(), // Emails
            ],
            case_sensitive: false,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            initial_width_factor: DEFAULT_INITIAL_WIDTH_FACTOR,
            scroll_probe_width: DEFAULT_SCROLL_PROBE_WIDTH,
            settings_file: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(language: Option<String>, personal_dict: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config = config.merge(Self::from_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".spellpad.toml");
        if local_path.exists() {
            config = config.merge(Self::from_file(&local_path)?);
        }

        if let Some(language) = language {
            config.language = language;
        }
        if let Some(dict) = personal_dict {
            config.personal_dictionary = Some(dict);
        }
        if config.personal_dictionary.is_none() {
            config.personal_dictionary = Self::default_personal_dict_path();
        }
        if config.settings_file.is_none() {
            config.settings_file = Self::default_settings_path();
        }

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // Values in `other` win where they differ from the defaults.
        if other.language != "en_US" {
            self.language = other.language;
        }
        if other.personal_dictionary.is_some() {
            self.personal_dictionary = other.personal_dictionary;
        }
        if !other.ignore_patterns.is_empty() {
            self.ignore_patterns = other.ignore_patterns;
        }
        if other.scroll_threshold != DEFAULT_SCROLL_THRESHOLD {
            self.scroll_threshold = other.scroll_threshold;
        }
        if other.initial_width_factor != DEFAULT_INITIAL_WIDTH_FACTOR {
            self.initial_width_factor = other.initial_width_factor;
        }
        if other.scroll_probe_width != DEFAULT_SCROLL_PROBE_WIDTH {
            self.scroll_probe_width = other.scroll_probe_width;
        }
        if other.settings_file.is_some() {
            self.settings_file = other.settings_file;
        }
        self.case_sensitive = other.case_sensitive;
        self
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "spellpad")
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn default_personal_dict_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("personal.txt"))
    }

    pub fn default_settings_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("settings.txt"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.language, "en_US");
        assert_eq!(config.scroll_threshold, DEFAULT_SCROLL_THRESHOLD);
        assert_eq!(config.initial_width_factor, 19);
        assert!(!config.case_sensitive);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config::default();
        let override_config = Config {
            language: "en_GB".to_string(),
            scroll_threshold: 200,
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.language, "en_GB");
        assert_eq!(merged.scroll_threshold, 200);
        assert_eq!(merged.scroll_probe_width, DEFAULT_SCROLL_PROBE_WIDTH);
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "language = \"fr_FR\"\nignore_patterns = []\ncase_sensitive = true\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.language, "fr_FR");
        assert!(config.case_sensitive);
        assert_eq!(config.scroll_probe_width, DEFAULT_SCROLL_PROBE_WIDTH);
        assert_eq!(config.settings_file, None);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "language = [").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
