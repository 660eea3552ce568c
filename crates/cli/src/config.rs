//! `ingestcheck config` and config file resolution.
//!
//! Lookup order: `--config` (or `INGESTCHECK_CONFIG`), then
//! `<config dir>/ingestcheck/config.toml` when it exists, then the built-in
//! defaults.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use ingestcheck_recon::ComparisonConfig;

use crate::exit_codes::EXIT_CONFIG;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Check a config file without running a comparison
    #[command(after_help = "\
Examples:
  ingestcheck config validate site.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// Print the effective config as TOML
    #[command(after_help = "\
Examples:
  ingestcheck config show
  ingestcheck config show --config site.toml
  ingestcheck config show --path")]
    Show {
        /// Config file to show instead of the default lookup
        #[arg(long, env = "INGESTCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Print only the default config file location
        #[arg(long)]
        path: bool,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { config } => cmd_config_validate(&config),
        ConfigCommands::Show { config, path } => cmd_config_show(config, path),
    }
}

fn config_err(msg: impl Into<String>) -> CliError {
    CliError::new(EXIT_CONFIG, msg)
}

/// `<config dir>/ingestcheck/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ingestcheck").join("config.toml"))
}

fn read_config(path: &Path) -> Result<ComparisonConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_err(format!("cannot read config {}: {e}", path.display())))?;
    ComparisonConfig::from_toml(&text)
        .map_err(|e| config_err(format!("{}: {e}", path.display())))
}

/// Resolve and load the config for a run.
pub fn load_config(explicit: Option<&Path>) -> Result<ComparisonConfig, CliError> {
    if let Some(path) = explicit {
        log::debug!("config: {}", path.display());
        return read_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            log::debug!("config: {} (default location)", path.display());
            read_config(&path).map_err(|e| {
                e.with_hint(format!("fix or remove {} to use the built-in rules", path.display()))
            })
        }
        _ => {
            log::debug!("config: built-in defaults");
            Ok(ComparisonConfig::default())
        }
    }
}

fn cmd_config_validate(path: &Path) -> Result<(), CliError> {
    let config = read_config(path)?;
    eprintln!(
        "{}: ok ({} schema detector(s), {} resource detector(s), {} month token(s))",
        path.display(),
        config.schema_detectors.len(),
        config.resource_detectors.len(),
        config.months.tokens().len(),
    );
    Ok(())
}

fn cmd_config_show(explicit: Option<PathBuf>, path_only: bool) -> Result<(), CliError> {
    if path_only {
        let path = default_config_path()
            .ok_or_else(|| CliError::other("no config directory on this platform"))?;
        println!("{}", path.display());
        return Ok(());
    }
    let config = load_config(explicit.as_deref())?;
    let text = toml::to_string_pretty(&config)
        .map_err(|e| CliError::other(format!("TOML serialization error: {e}")))?;
    print!("{text}");
    Ok(())
}
