// ingestcheck CLI - compare ingestion output against raw spreadsheet data

mod compare;
mod config;
mod exit_codes;
mod quality;
mod sheets;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_DECODE, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE, EXIT_WRITE};

#[derive(Parser)]
#[command(name = "ingestcheck")]
#[command(about = "Check an ingestion pipeline's output against the raw workbook it came from")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Verbose diagnostics on stderr (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two workbooks; the raw and ingestion roles are detected automatically
    #[command(after_help = "\
The larger file is taken as raw data. If the smaller file has no recognizable \
layout but the larger one does, the roles are swapped.

Exit code 3 (with --fail-on-discrepancy) means the report found facilities \
missing from raw data, unmatched or mismatched rows, or quality issues.

Examples:
  ingestcheck compare raw.xlsx ingestion.xlsx
  ingestcheck compare a.xlsx b.xlsx --json | jq .facilities
  ingestcheck compare a.xlsx b.xlsx --output report.json --export-dir out/
  ingestcheck compare a.xlsx b.xlsx --sheet-a 'GHG Emissions' --config site.toml
  ingestcheck compare a.xlsx b.xlsx --fail-on-discrepancy")]
    Compare {
        /// First workbook
        file_a: PathBuf,

        /// Second workbook
        file_b: PathBuf,

        /// Sheet to read from the first workbook (default: chosen by role)
        #[arg(long, value_name = "SHEET")]
        sheet_a: Option<String>,

        /// Sheet to read from the second workbook (default: chosen by role)
        #[arg(long, value_name = "SHEET")]
        sheet_b: Option<String>,

        /// Comparison config (TOML)
        #[arg(long, env = "INGESTCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Print the report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the report with run metadata to a JSON file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write missing_facilities.xlsx, duplicate_rows.xlsx and comparison_results.xlsx here
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,

        /// Write the per-row match results as CSV
        #[arg(long, value_name = "PATH")]
        records_csv: Option<PathBuf>,

        /// Exit 3 when the report needs attention
        #[arg(long)]
        fail_on_discrepancy: bool,
    },

    /// Classify one workbook and run the null/duplicate checks on it
    #[command(after_help = "\
Examples:
  ingestcheck quality ingestion.xlsx
  ingestcheck quality ingestion.xlsx --sheet Data --json
  ingestcheck quality ingestion.xlsx --fail-on-discrepancy")]
    Quality {
        /// Workbook to check
        file: PathBuf,

        /// Sheet to read (default: first)
        #[arg(long)]
        sheet: Option<String>,

        /// Comparison config (TOML)
        #[arg(long, env = "INGESTCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Print the result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit 3 when any issue is found
        #[arg(long)]
        fail_on_discrepancy: bool,
    },

    /// List the sheets of a workbook
    #[command(after_help = "\
Examples:
  ingestcheck sheets raw.xlsx
  ingestcheck sheets raw.xlsx --json")]
    Sheets {
        /// Workbook to inspect
        file: PathBuf,

        /// Print the names as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Inspect and validate comparison configs
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  ingestcheck-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// RUST_LOG wins; otherwise warnings only, or debug with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            eprintln!("Usage: ingestcheck <command> [options]");
            eprintln!("       ingestcheck --help for more information");
            Ok(())
        }
        Some(Commands::Compare {
            file_a,
            file_b,
            sheet_a,
            sheet_b,
            config,
            json,
            output,
            export_dir,
            records_csv,
            fail_on_discrepancy,
        }) => compare::cmd_compare(compare::CompareArgs {
            file_a,
            file_b,
            sheet_a,
            sheet_b,
            config,
            json,
            output,
            export_dir,
            records_csv,
            fail_on_discrepancy,
        }),
        Some(Commands::Quality { file, sheet, config, json, fail_on_discrepancy }) => {
            quality::cmd_quality(file, sheet, config, json, fail_on_discrepancy)
        }
        Some(Commands::Sheets { file, json }) => sheets::cmd_sheets(file, json),
        Some(Commands::Config { command }) => config::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::new(EXIT_DECODE, msg)
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::new(EXIT_WRITE, msg)
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Missing input files are usage errors, not decode errors.
pub(crate) fn require_file(path: &std::path::Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::usage(format!("file not found: {}", path.display())))
    }
}

/// Serialize `value` as pretty JSON.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::other(format!("JSON serialization error: {e}")))
}
