//! Standard paths used by readings tools

use std::path::{Path, PathBuf};

/// File name of the per-directory secrets file
pub const SECRETS_FILE_NAME: &str = ".secrets.json";

/// Standard readings paths
pub struct Paths {
    /// Config directory (~/.config/readings)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("readings");

        Self { config }
    }

    /// Get the application config file path
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}

/// Get the secrets file path for a working directory
pub fn secrets_file(dir: &Path) -> PathBuf {
    dir.join(SECRETS_FILE_NAME)
}
