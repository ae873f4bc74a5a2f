//! secrets - Per-application secrets for readings
//!
//! "Credentials load once, or the process does not start."
//!
//! Deployment tooling drops a `.secrets.json` next to the running process.
//! It holds one credential bundle per application. This crate picks the
//! bundle for the current application, checks that every required value is
//! there, and keeps the result for the rest of the process lifetime.
//!
//! Local development works without the file: an absent file, or a file with
//! no bundle for this application, yields empty secrets and a warning. Every
//! other problem is an error.

pub mod accessor;
pub mod error;
pub mod file;
pub mod resolved;

pub use accessor::{get_secrets, SecretsAccessor};
pub use error::SecretsError;
pub use file::{FsReader, SecretsFile, SecretsReader};
pub use resolved::{ResolvedSecrets, REQUIRED_KEYS};
