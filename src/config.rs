//! Global settings (`~/.skillmaster/config.json`).
//!
//! Loaded once at startup and passed explicitly to the client and project
//! operations.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = ".skillmaster";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_INSTALL_DIR: &str = ".ai";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable consulted when no token is configured
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "SKILLMASTER_API_URL";

fn default_install_dir() -> String {
    DEFAULT_INSTALL_DIR.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_files() -> usize {
    crate::github::DEFAULT_MAX_FILES
}

/// GitHub access settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubSettings {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            max_files: default_max_files(),
        }
    }
}

/// Main settings structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default = "default_install_dir")]
    pub install_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github: GitHubSettings::default(),
            install_dir: default_install_dir(),
        }
    }
}

impl Settings {
    /// Path of the settings file (~/.skillmaster/config.json)
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Settings("cannot determine home directory".to_string()))?;
        Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load settings from the default path, then apply environment overrides.
    /// Priority: environment > settings file > built-in defaults
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::path()?)?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut settings: Settings = serde_json::from_str(&content)
            .map_err(|e| Error::Settings(format!("failed to parse {}: {e}", path.display())))?;

        if settings.install_dir.trim().is_empty() {
            settings.install_dir = default_install_dir();
        }
        if settings.github.api_url.trim().is_empty() {
            settings.github.api_url = default_api_url();
        }
        Ok(settings)
    }

    /// Environment overrides. The token variable only fills an empty token.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.github.token.is_empty() {
            if let Some(token) = var(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
                self.github.token = token;
            }
        }
        if let Some(url) = var(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.github.api_url = url;
        }
    }

    /// Write settings to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Settings(format!("failed to serialize settings: {e}")))?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    /// Create the default settings file if none exists. Never overwrites.
    /// Returns true if a file was written.
    pub fn initialize_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        Ok(true)
    }

    pub fn initialize() -> Result<bool> {
        Self::initialize_at(&Self::path()?)
    }

    pub fn has_token(&self) -> bool {
        !self.github.token.trim().is_empty()
    }

    /// Token for display: first and last four characters only.
    pub fn masked_token(&self) -> Option<String> {
        if !self.has_token() {
            return None;
        }
        let chars: Vec<char> = self.github.token.chars().collect();
        let head: String = chars.iter().take(4).collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        Some(format!("{head}...{tail}"))
    }
}
