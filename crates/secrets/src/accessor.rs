//! Secrets accessor - load once, reuse for the process lifetime
//!
//! The first `get` reads `<dir>/.secrets.json`, extracts the bundle for the
//! configured application and caches the result. Later calls return the cached
//! record without touching the filesystem.
//!
//! First-call initialization is serialized: concurrent callers wait for the
//! one doing the read. Fatal errors are not cached, so a later call retries.

use once_cell::sync::OnceCell;
use readings_core::paths::secrets_file;
use readings_core::AppConfig;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::SecretsError;
use crate::file::{FsReader, SecretsFile, SecretsReader};
use crate::resolved::ResolvedSecrets;

/// What the first successful `get` produced
#[derive(Debug)]
struct Cached {
    secrets: ResolvedSecrets,
    /// Why the fallback record was used, if it was
    fallback: Option<SecretsError>,
}

/// Memoizing secrets accessor for one application
pub struct SecretsAccessor<R = FsReader> {
    reader: R,
    app_name: String,
    /// Directory holding the secrets file; the current directory if unset
    dir: Option<PathBuf>,
    cache: OnceCell<Cached>,
}

impl SecretsAccessor<FsReader> {
    /// Create an accessor reading from the filesystem
    pub fn new(app_name: impl Into<String>) -> Self {
        Self::with_reader(FsReader, app_name)
    }
}

impl<R: SecretsReader> SecretsAccessor<R> {
    /// Create an accessor with a custom reader
    pub fn with_reader(reader: R, app_name: impl Into<String>) -> Self {
        Self {
            reader,
            app_name: app_name.into(),
            dir: None,
            cache: OnceCell::new(),
        }
    }

    /// Look for the secrets file in `dir` instead of the current directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// The application whose bundle is extracted
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Path of the secrets file, resolved against the current directory now
    pub fn secrets_path(&self) -> Result<PathBuf, SecretsError> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(SecretsError::CurrentDir)?,
        };
        Ok(secrets_file(&dir))
    }

    /// Get the secrets, loading them on first call.
    ///
    /// A missing file or a missing application entry yields the fallback
    /// record and a warning. Any other failure is returned as an error.
    pub fn get(&self) -> Result<&ResolvedSecrets, SecretsError> {
        if let Some(cached) = self.cache.get() {
            debug!(app = %self.app_name, "Using cached secrets");
            return Ok(&cached.secrets);
        }

        self.cache
            .get_or_try_init(|| self.load())
            .map(|cached| &cached.secrets)
    }

    /// Why the cached record is the fallback, if it is
    pub fn fallback_reason(&self) -> Option<&SecretsError> {
        self.cache.get().and_then(|cached| cached.fallback.as_ref())
    }

    /// Load the secrets without fallback or caching
    pub fn load_strict(&self) -> Result<ResolvedSecrets, SecretsError> {
        let path = self.secrets_path()?;
        SecretsFile::read(&self.reader, &path)?.resolve(&self.app_name)
    }

    fn load(&self) -> Result<Cached, SecretsError> {
        let path = self.secrets_path()?;
        debug!(app = %self.app_name, path = %path.display(), "Loading secrets");

        let loaded = SecretsFile::read(&self.reader, &path)
            .and_then(|file| file.resolve(&self.app_name));

        match loaded {
            Ok(secrets) => Ok(Cached {
                secrets,
                fallback: None,
            }),
            Err(e) if e.is_recoverable() => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Missing data in secrets file, using empty secrets"
                );
                Ok(Cached {
                    secrets: ResolvedSecrets::fallback(),
                    fallback: Some(e),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Get the secrets for the configured application from
/// `<current dir>/.secrets.json`, loading them once per process
pub fn get_secrets() -> Result<&'static ResolvedSecrets, SecretsError> {
    static ACCESSOR: OnceCell<SecretsAccessor> = OnceCell::new();

    let accessor = ACCESSOR.get_or_try_init(|| {
        AppConfig::load()
            .map(|config| SecretsAccessor::new(config.app_name))
            .map_err(|e| SecretsError::Config(format!("{:#}", e)))
    })?;

    accessor.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::fmt::{self, Write as _};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Collects the fields of WARN events as `name=value` text
    #[derive(Clone, Default)]
    struct WarningLog(Arc<Mutex<Vec<String>>>);

    struct FieldText(String);

    impl Visit for FieldText {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            let _ = write!(self.0, "{}={:?} ", field.name(), value);
        }
    }

    impl<S: Subscriber> Layer<S> for WarningLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                let mut text = FieldText(String::new());
                event.record(&mut text);
                self.0.lock().unwrap().push(text.0);
            }
        }
    }

    fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        let log = WarningLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        let result = tracing::subscriber::with_default(subscriber, f);
        let warnings = log.0.lock().unwrap().clone();
        (result, warnings)
    }

    const MYAPP: &str = r#"{"myapp": {
        "vercelAccessKeyId": "A",
        "vercelAccessKeySecret": "B",
        "historicReadingsBucket": "C",
        "appStorageTableName": "D"
    }}"#;

    /// In-memory reader that counts reads
    struct CountingReader {
        content: Option<String>,
        reads: AtomicUsize,
    }

    impl CountingReader {
        fn new(content: Option<&str>) -> Self {
            Self {
                content: content.map(str::to_string),
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl SecretsReader for CountingReader {
        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.content
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn accessor<'a>(reader: &'a CountingReader, app: &str) -> SecretsAccessor<&'a CountingReader> {
        SecretsAccessor::with_reader(reader, app).in_dir("/srv/app")
    }

    fn expected() -> ResolvedSecrets {
        ResolvedSecrets {
            vercel_access_key_id: "A".to_string(),
            vercel_access_key_secret: "B".to_string(),
            historic_readings_bucket: "C".to_string(),
            app_storage_table_name: "D".to_string(),
        }
    }

    #[test]
    fn test_happy_path() {
        let reader = CountingReader::new(Some(MYAPP));
        let secrets = accessor(&reader, "myapp");

        assert_eq!(secrets.get().unwrap(), &expected());
        assert!(secrets.fallback_reason().is_none());
    }

    #[test]
    fn test_reads_once() {
        let reader = CountingReader::new(Some(MYAPP));
        let secrets = accessor(&reader, "myapp");

        let first = secrets.get().unwrap().clone();
        let second = secrets.get().unwrap();

        assert_eq!(&first, second);
        assert_eq!(reader.reads(), 1);
    }

    #[test]
    fn test_fallback_cached() {
        let reader = CountingReader::new(None);
        let secrets = accessor(&reader, "myapp");

        assert!(secrets.get().unwrap().is_fallback());
        assert!(secrets.get().unwrap().is_fallback());
        assert_eq!(reader.reads(), 1);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let reader = CountingReader::new(None);
        let secrets = accessor(&reader, "myapp");

        let (result, warnings) = capture_warnings(|| secrets.get().cloned());
        assert_eq!(result.unwrap(), ResolvedSecrets::fallback());

        let reason = secrets.fallback_reason().unwrap();
        assert_eq!(reason.code(), "FILE_NOT_FOUND");

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("path=/srv/app/.secrets.json"));
        assert!(warnings[0].contains("Secrets file not found"));
    }

    #[test]
    fn test_missing_entry_falls_back() {
        let reader = CountingReader::new(Some(MYAPP));
        let secrets = accessor(&reader, "otherapp");

        let (result, warnings) = capture_warnings(|| secrets.get().cloned());
        assert_eq!(result.unwrap(), ResolvedSecrets::fallback());

        let reason = secrets.fallback_reason().unwrap();
        assert_eq!(reason.code(), "MISSING_ENV");
        assert!(reason.to_string().contains("myapp"));

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("path=/srv/app/.secrets.json"));
        assert!(warnings[0].contains("MISSING_ENV"));
    }

    #[test]
    fn test_null_entry_falls_back() {
        let reader = CountingReader::new(Some(r#"{"myapp": null, "other": {}}"#));
        let secrets = accessor(&reader, "myapp");

        let (result, warnings) = capture_warnings(|| secrets.get().cloned());
        assert!(result.unwrap().is_fallback());
        assert_eq!(secrets.fallback_reason().unwrap().code(), "MISSING_ENV");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_no_warning_when_loaded() {
        let reader = CountingReader::new(Some(MYAPP));
        let secrets = accessor(&reader, "myapp");

        let (result, warnings) = capture_warnings(|| secrets.get().cloned());
        assert_eq!(result.unwrap(), expected());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_key_is_error() {
        let reader = CountingReader::new(Some(
            r#"{"myapp": {"vercelAccessKeyId": "A", "vercelAccessKeySecret": "B",
                "appStorageTableName": "D"}}"#,
        ));
        let secrets = accessor(&reader, "myapp");

        let (result, warnings) = capture_warnings(|| secrets.get().cloned());
        assert_eq!(result.unwrap_err().code(), "MISSING_REQUIRED_KEY");
        assert!(secrets.fallback_reason().is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_is_error() {
        let reader = CountingReader::new(Some("{ this is not json"));
        let secrets = accessor(&reader, "myapp");

        assert!(matches!(secrets.get(), Err(SecretsError::Parse { .. })));
    }

    #[test]
    fn test_errors_not_cached() {
        let reader = CountingReader::new(Some("{"));
        let secrets = accessor(&reader, "myapp");

        assert!(secrets.get().is_err());
        assert!(secrets.get().is_err());
        assert_eq!(reader.reads(), 2);
    }

    #[test]
    fn test_load_strict_does_not_fall_back() {
        let reader = CountingReader::new(None);
        let secrets = accessor(&reader, "myapp");

        let err = secrets.load_strict().unwrap_err();
        assert!(matches!(err, SecretsError::FileNotFound { .. }));
    }

    #[test]
    fn test_filesystem_cached() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".secrets.json"), MYAPP).unwrap();

        let secrets = SecretsAccessor::new("myapp").in_dir(dir.path());
        assert_eq!(
            secrets.secrets_path().unwrap(),
            dir.path().join(".secrets.json")
        );
        assert_eq!(secrets.get().unwrap(), &expected());

        // Cached: removing the file changes nothing
        std::fs::remove_file(dir.path().join(".secrets.json")).unwrap();
        assert_eq!(secrets.get().unwrap(), &expected());
    }

    #[test]
    fn test_filesystem_missing() {
        let dir = TempDir::new().unwrap();
        let secrets = SecretsAccessor::new("myapp").in_dir(dir.path());
        assert!(secrets.get().unwrap().is_fallback());
    }
}
