//! Resolved secrets for the current application

use readings_core::format::mask;
use serde::Serialize;
use std::fmt;

/// Keys every application bundle must carry, in file spelling
pub const REQUIRED_KEYS: [&str; 4] = [
    "vercelAccessKeyId",
    "vercelAccessKeySecret",
    "historicReadingsBucket",
    "appStorageTableName",
];

/// The credential values the application runs with.
///
/// Either every field holds a real value or every field is empty (the
/// fallback record); nothing in this crate builds a mix of the two.
#[derive(Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSecrets {
    pub vercel_access_key_id: String,
    pub vercel_access_key_secret: String,
    pub historic_readings_bucket: String,
    pub app_storage_table_name: String,
}

impl ResolvedSecrets {
    /// The all-empty record used when no deployment secrets are available
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Check if this is the fallback record
    pub fn is_fallback(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_empty())
    }

    /// Field values paired with their file key names
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            (REQUIRED_KEYS[0], self.vercel_access_key_id.as_str()),
            (REQUIRED_KEYS[1], self.vercel_access_key_secret.as_str()),
            (REQUIRED_KEYS[2], self.historic_readings_bucket.as_str()),
            (REQUIRED_KEYS[3], self.app_storage_table_name.as_str()),
        ]
    }
}

// Credentials stay out of logs
impl fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("vercel_access_key_id", &mask(&self.vercel_access_key_id))
            .field("vercel_access_key_secret", &mask(&self.vercel_access_key_secret))
            .field("historic_readings_bucket", &self.historic_readings_bucket)
            .field("app_storage_table_name", &self.app_storage_table_name)
            .finish()
    }
}
