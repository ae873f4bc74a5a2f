//! Secrets loading errors

use readings_core::MustGetError;
use std::path::PathBuf;
use thiserror::Error;

/// Secrets-specific errors
#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Secrets file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "MISSING_ENV: Missing {app} in secrets file (known applications: {})",
        list_or_none(.known)
    )]
    MissingApplicationEntry { app: String, known: Vec<String> },

    #[error("Invalid secrets for {app}: {source}")]
    MissingRequiredKey {
        app: String,
        #[source]
        source: MustGetError,
    },

    #[error("Failed to parse secrets file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read secrets file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

impl SecretsError {
    /// Stable code for this kind of failure
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "FILE_NOT_FOUND",
            Self::MissingApplicationEntry { .. } => "MISSING_ENV",
            Self::MissingRequiredKey { .. } => "MISSING_REQUIRED_KEY",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Io { .. } | Self::CurrentDir(_) => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the accessor falls back to empty secrets instead of failing.
    ///
    /// Only an absent file and an absent application entry qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::MissingApplicationEntry { .. }
        )
    }
}
