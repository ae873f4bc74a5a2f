//! Application identity for readings tools
//!
//! The application name selects which bundle of a secrets file applies to
//! the current deployment. Resolution order:
//! 1. `APP_NAME` environment variable (if set and non-blank)
//! 2. `~/.config/readings/config.json`
//! 3. The built-in default, "readings"

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::paths::Paths;

/// Environment variable that overrides the configured application name
pub const APP_NAME_ENV: &str = "APP_NAME";

/// Application name used when nothing else is configured
pub const DEFAULT_APP_NAME: &str = "readings";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Name of the current application
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, then apply `APP_NAME`
    pub fn load() -> Result<Self> {
        let paths = Paths::new();
        let config = Self::load_from(&paths.config_file())?;
        Ok(config.with_env_override(std::env::var(APP_NAME_ENV).ok()))
    }

    /// Load config from a specific file, falling back to defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        if config.app_name.trim().is_empty() {
            bail!("app_name in {} cannot be empty", path.display());
        }

        Ok(config)
    }

    /// Replace the application name with `value` unless it is missing or blank
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(name) = value.filter(|v| !v.trim().is_empty()) {
            self.app_name = name;
        }
        self
    }
}
