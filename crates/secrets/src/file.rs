//! Secrets file - `.secrets.json`
//!
//! One credential bundle per application name:
//!
//! ```json
//! {
//!   "myapp": {
//!     "vercelAccessKeyId": "...",
//!     "vercelAccessKeySecret": "...",
//!     "historicReadingsBucket": "...",
//!     "appStorageTableName": "..."
//!   }
//! }
//! ```
//!
//! Only the bundle of the application being loaded is inspected. A bundle
//! that is absent, `null` or otherwise falsy (`false`, `""`, `0`) counts as a
//! missing entry. The selected bundle must be an object whose required keys
//! hold strings; other keys and other bundles may hold anything.

use readings_core::must_get;
use serde::de::Error as _;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::SecretsError;
use crate::resolved::{ResolvedSecrets, REQUIRED_KEYS};

/// Source of secrets file contents
pub trait SecretsReader {
    /// Read the whole file at `path` as text
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads secrets files from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl<R: SecretsReader + ?Sized> SecretsReader for &R {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}

impl SecretsReader for FsReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Parsed secrets file
#[derive(Debug, Clone)]
pub struct SecretsFile {
    /// Where the file was read from, for error reporting
    path: PathBuf,
    apps: BTreeMap<String, Value>,
}

impl SecretsFile {
    /// Read and parse the secrets file at `path`
    pub fn read<R: SecretsReader + ?Sized>(reader: &R, path: &Path) -> Result<Self, SecretsError> {
        let content = reader.read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SecretsError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => SecretsError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        Self::parse(&content, path)
    }

    /// Parse secrets file contents; `path` is only used for error reporting
    pub fn parse(content: &str, path: &Path) -> Result<Self, SecretsError> {
        let apps = serde_json::from_str(content).map_err(|e| SecretsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            apps,
        })
    }

    /// Application names present in the file, sorted
    pub fn app_names(&self) -> Vec<&str> {
        self.apps.keys().map(String::as_str).collect()
    }

    /// Get the raw bundle for an application
    pub fn entry(&self, app: &str) -> Result<&Value, SecretsError> {
        match self.apps.get(app) {
            Some(value) if !is_falsy(value) => Ok(value),
            _ => Err(SecretsError::MissingApplicationEntry {
                app: app.to_string(),
                known: self.apps.keys().cloned().collect(),
            }),
        }
    }

    /// Extract the required secrets for an application
    pub fn resolve(&self, app: &str) -> Result<ResolvedSecrets, SecretsError> {
        let bundle = self.required_values(app)?;
        let get = |key: &str| {
            must_get(&bundle, key)
                .map(str::to_string)
                .map_err(|e| SecretsError::MissingRequiredKey {
                    app: app.to_string(),
                    source: e,
                })
        };

        Ok(ResolvedSecrets {
            vercel_access_key_id: get(REQUIRED_KEYS[0])?,
            vercel_access_key_secret: get(REQUIRED_KEYS[1])?,
            historic_readings_bucket: get(REQUIRED_KEYS[2])?,
            app_storage_table_name: get(REQUIRED_KEYS[3])?,
        })
    }

    /// Shape-check an application's bundle and collect its required string
    /// values; `null` counts as absent
    fn required_values(&self, app: &str) -> Result<BTreeMap<String, String>, SecretsError> {
        let object = self
            .entry(app)?
            .as_object()
            .ok_or_else(|| self.shape_error(format!("bundle for {} must be an object", app)))?;

        let mut values = BTreeMap::new();
        for key in REQUIRED_KEYS {
            match object.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::String(value)) => {
                    values.insert(key.to_string(), value.clone());
                }
                Some(other) => {
                    return Err(self.shape_error(format!(
                        "{}.{} must be a string, found {}",
                        app, key, other
                    )));
                }
            }
        }

        Ok(values)
    }

    fn shape_error(&self, msg: String) -> SecretsError {
        SecretsError::Parse {
            path: self.path.clone(),
            source: serde_json::Error::custom(msg),
        }
    }
}

/// JSON values that do not count as a bundle
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
