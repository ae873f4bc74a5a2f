//! secrets - Inspect the per-application secrets of a readings deployment
//!
//! Commands:
//! - show: Resolve secrets the way the application does (values masked)
//! - check: Fail unless a complete bundle exists for the application
//! - path: Print the secrets file path
//! - apps: List application names in the secrets file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use readings_core::format::mask;
use readings_core::AppConfig;
use secrets::{FsReader, SecretsAccessor, SecretsFile};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "secrets")]
#[command(about = "Inspect per-application secrets loaded from .secrets.json")]
#[command(version)]
#[command(after_help = r#"SECRETS FILE:
    .secrets.json in the working directory, one bundle per application:
    { "<app>": { "vercelAccessKeyId": "...", "vercelAccessKeySecret": "...",
                 "historicReadingsBucket": "...", "appStorageTableName": "..." } }

APPLICATION NAME:
    --app, else $APP_NAME, else ~/.config/readings/config.json, else "readings""#)]
struct Cli {
    /// Application name (overrides $APP_NAME and config)
    #[arg(long, global = true)]
    app: Option<String>,

    /// Directory containing .secrets.json (default: current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print secrets (empty values when the file or bundle is missing)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Print values instead of masking them
        #[arg(long)]
        reveal: bool,
    },

    /// Verify a complete bundle exists, with no fallback to empty values
    Check,

    /// Print the secrets file path
    Path,

    /// List application names present in the secrets file
    Apps {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let accessor = build_accessor(cli.app, cli.dir)?;

    match cli.command {
        Some(Commands::Show { json, reveal }) => cmd_show(&accessor, json, reveal),
        Some(Commands::Check) => cmd_check(&accessor),
        Some(Commands::Path) => cmd_path(&accessor),
        Some(Commands::Apps { json }) => cmd_apps(&accessor, json),
        None => cmd_show(&accessor, false, false),
    }
}

/// Log filter from `RUST_LOG` directives; fallback warnings show by default
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn build_accessor(app: Option<String>, dir: Option<PathBuf>) -> Result<SecretsAccessor> {
    let app_name = match app {
        Some(name) => name,
        None => {
            AppConfig::load()
                .context("Failed to load application config")?
                .app_name
        }
    };

    let accessor = SecretsAccessor::new(app_name);
    Ok(match dir {
        Some(dir) => accessor.in_dir(dir),
        None => accessor,
    })
}

/// Resolve and print secrets
fn cmd_show(accessor: &SecretsAccessor, json: bool, reveal: bool) -> Result<()> {
    let secrets = accessor.get()?;

    if json {
        let output = if reveal {
            serde_json::to_string_pretty(secrets)?
        } else {
            let masked: BTreeMap<&str, String> = secrets
                .fields()
                .iter()
                .map(|(key, value)| (*key, mask(value)))
                .collect();
            serde_json::to_string_pretty(&masked)?
        };
        println!("{}", output);
        return Ok(());
    }

    if accessor.fallback_reason().is_some() {
        println!("Secrets for {} (empty fallback)", accessor.app_name());
    } else {
        println!("Secrets for {}", accessor.app_name());
    }
    println!();

    for (key, value) in secrets.fields() {
        let shown = if reveal { value.to_string() } else { mask(value) };
        println!("  {:<24} {}", key, shown);
    }

    Ok(())
}

/// Verify a complete bundle exists
fn cmd_check(accessor: &SecretsAccessor) -> Result<()> {
    let path = accessor.secrets_path()?;

    accessor.load_strict().with_context(|| {
        format!(
            "Secrets check failed for {} ({})",
            accessor.app_name(),
            path.display()
        )
    })?;

    println!(
        "success: {} has a complete secrets bundle in {}",
        accessor.app_name(),
        path.display()
    );

    Ok(())
}

/// Print the secrets file path
fn cmd_path(accessor: &SecretsAccessor) -> Result<()> {
    println!("{}", accessor.secrets_path()?.display());
    Ok(())
}

/// List application names
fn cmd_apps(accessor: &SecretsAccessor, json: bool) -> Result<()> {
    let path = accessor.secrets_path()?;
    let file = SecretsFile::read(&FsReader, &path)?;
    let names = file.app_names();

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No applications in {}", path.display());
        return Ok(());
    }

    for name in names {
        let marker = if name == accessor.app_name() { "*" } else { " " };
        println!("{} {}", marker, name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["secrets"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.app.is_none());

        let cli = Cli::try_parse_from(["secrets", "show", "--json"]).unwrap();
        if let Some(Commands::Show { json, reveal }) = cli.command {
            assert!(json);
            assert!(!reveal);
        } else {
            panic!("Expected Show command");
        }

        let cli = Cli::try_parse_from(["secrets", "check", "--app", "myapp"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.app.as_deref(), Some("myapp"));
    }

    #[test]
    fn test_cli_global_dir() {
        let cli =
            Cli::try_parse_from(["secrets", "--dir", "/srv/app", "apps", "--json"]).unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/srv/app")));
        assert!(matches!(cli.command, Some(Commands::Apps { json: true })));
    }

    #[test]
    fn test_build_accessor_overrides() {
        let accessor =
            build_accessor(Some("myapp".to_string()), Some(PathBuf::from("/srv/app"))).unwrap();
        assert_eq!(accessor.app_name(), "myapp");
        assert_eq!(
            accessor.secrets_path().unwrap(),
            PathBuf::from("/srv/app/.secrets.json")
        );
    }

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert!(log_filter(None).to_string().contains("warn"));
        assert!(log_filter(Some("")).to_string().contains("warn"));
        assert!(log_filter(Some("secrets=debug")).to_string().contains("secrets=debug"));
    }
}
