//! `ingestcheck compare`: full raw vs ingestion report.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use ingestcheck_io::export::COMPARISON_HEADERS;
use ingestcheck_io::{identify_roles, import_sheet, list_sheets, select_raw_sheet, ImportResult};
use ingestcheck_recon::model::MatchRecord;
use ingestcheck_recon::table::format_number;
use ingestcheck_recon::{
    classify_resource, generate_report, ComparisonReport, MatchOutcome, Section,
};
use serde::Serialize;

use crate::config::load_config;
use crate::exit_codes::EXIT_DISCREPANCIES;
use crate::{require_file, to_json, CliError};

pub struct CompareArgs {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub sheet_a: Option<String>,
    pub sheet_b: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub records_csv: Option<PathBuf>,
    pub fail_on_discrepancy: bool,
}

impl CompareArgs {
    /// Sheet override given for `path`, which is one of the two inputs.
    fn sheet_for(&self, path: &Path) -> Option<&str> {
        if path == self.file_a {
            self.sheet_a.as_deref()
        } else {
            self.sheet_b.as_deref()
        }
    }
}

/// Report plus the run details that would make the report itself
/// non-deterministic.
#[derive(Serialize)]
struct RunEnvelope<'a> {
    report: &'a ComparisonReport,
    meta: RunMeta,
}

#[derive(Serialize)]
struct RunMeta {
    engine_version: &'static str,
    run_at: String,
    raw_file: String,
    raw_sheet: String,
    ingestion_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingestion_sheet: Option<String>,
    role_notes: Vec<String>,
    raw_import: ImportResult,
    ingestion_import: ImportResult,
}

/// Warnings for inputs that were not read in full.
fn import_warnings(raw: &ImportResult, ingestion: &ImportResult) -> Vec<String> {
    [("raw data file", raw), ("ingestion file", ingestion)]
        .into_iter()
        .filter_map(|(role, result)| result.warning().map(|w| format!("{role}: {w}")))
        .collect()
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    require_file(&args.file_a)?;
    require_file(&args.file_b)?;

    let config = load_config(args.config.as_deref())?;
    let rules = config.schema_rules();

    let roles = identify_roles(&args.file_a, &args.file_b, &rules).map_err(CliError::decode)?;
    for note in &roles.notes {
        log::info!("roles: {note}");
    }

    let ingestion_sheet = args.sheet_for(&roles.ingestion).map(str::to_string);
    let (ingestion, ingestion_import) = import_sheet(&roles.ingestion, ingestion_sheet.as_deref())
        .map_err(|e| CliError::decode(format!("ingestion file: {e}")))?;

    let raw_sheet = match args.sheet_for(&roles.raw) {
        Some(sheet) => sheet.to_string(),
        None => {
            let resource = classify_resource(&ingestion, &rules);
            let names = list_sheets(&roles.raw).map_err(CliError::decode)?;
            select_raw_sheet(&names, resource, &config.raw_sheets).map_err(|e| {
                CliError::decode(e).with_hint(format!(
                    "pick the sheet with --sheet-{} or set raw_sheets in the config",
                    if roles.raw == args.file_a { "a" } else { "b" }
                ))
            })?
        }
    };
    let (raw, raw_import) = import_sheet(&roles.raw, Some(&raw_sheet))
        .map_err(|e| CliError::decode(format!("raw data file: {e}")))?;

    let report = generate_report(&raw, &ingestion, &config);
    let warnings = import_warnings(&raw_import, &ingestion_import);

    let meta = RunMeta {
        engine_version: env!("CARGO_PKG_VERSION"),
        run_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        raw_file: roles.raw.display().to_string(),
        raw_sheet: raw_sheet.clone(),
        ingestion_file: roles.ingestion.display().to_string(),
        ingestion_sheet,
        role_notes: roles.notes.clone(),
        raw_import,
        ingestion_import,
    };

    if let Some(ref path) = args.output {
        let envelope = RunEnvelope { report: &report, meta };
        std::fs::write(path, to_json(&envelope)?)
            .map_err(|e| CliError::write(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{}", to_json(&report)?);
    }

    if let Some(ref dir) = args.export_dir {
        write_exports(&report, dir)?;
    }

    if let Some(ref path) = args.records_csv {
        let records: &[MatchRecord] = match &report.resource_comparison {
            Some(Section::Completed(outcome)) => outcome.records(),
            _ => &[],
        };
        write_records_csv(records, path)?;
        eprintln!("wrote {}", path.display());
    }

    eprintln!("raw:       {} [{}]", roles.raw.display(), raw_sheet);
    eprintln!("ingestion: {}", roles.ingestion.display());
    print_summary(&report);
    for warning in &warnings {
        eprintln!("warning: {warning}");
    }

    if args.fail_on_discrepancy && report.has_discrepancies() {
        return Err(CliError::new(EXIT_DISCREPANCIES, "discrepancies found"));
    }
    if args.fail_on_discrepancy && !warnings.is_empty() {
        return Err(CliError::new(EXIT_DISCREPANCIES, "input truncated")
            .with_hint("the comparison covers only the rows that were imported"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Human summary
// ---------------------------------------------------------------------------

fn print_summary(report: &ComparisonReport) {
    let b = &report.basic;
    eprintln!(
        "rows: raw {}, ingestion {} (difference {}, {} missing in ingestion)",
        b.raw_rows, b.ingestion_rows, b.row_difference, b.missing_rows_in_ingestion
    );
    eprintln!(
        "columns: {} common, {} raw-only, {} ingestion-only",
        b.common_columns.len(),
        b.raw_only_columns.len(),
        b.ingestion_only_columns.len()
    );

    match &report.facilities {
        Section::Completed(f) => {
            eprintln!(
                "facilities: {} raw, {} ingestion, {} common, {} missing in raw, {} missing in ingestion",
                f.raw_facilities_count,
                f.ingestion_facilities_count,
                f.common_facilities_count,
                f.missing_in_raw_count,
                f.missing_in_ingestion_count
            );
            for name in &f.missing_in_raw {
                eprintln!("  not in raw: {name}");
            }
        }
        Section::Failed(e) => eprintln!("facilities: failed: {}", e.message),
    }

    eprintln!("layout: {} / {}", report.schema, report.resource);

    match &report.resource_comparison {
        None => eprintln!("records: skipped (layout or resource not recognized)"),
        Some(Section::Failed(e)) => eprintln!("records: failed: {}", e.message),
        Some(Section::Completed(MatchOutcome::NotImplemented { message, .. })) => {
            eprintln!("records: {message}")
        }
        Some(Section::Completed(MatchOutcome::Completed { summary: s, .. })) => eprintln!(
            "records: {} of {} matched ({} equal, {} mismatched), {} without raw counterpart",
            s.matched_rows,
            s.total_ingestion_rows,
            s.quantity_matches,
            s.quantity_mismatches,
            s.unmatched_rows
        ),
    }

    match &report.quality {
        Section::Completed(q) if q.issues.is_empty() => eprintln!("quality: no issues"),
        Section::Completed(q) => {
            eprintln!("quality: {} issue(s)", q.issues.len());
            for message in q.messages() {
                eprintln!("  - {message}");
            }
        }
        Section::Failed(e) => eprintln!("quality: failed: {}", e.message),
    }
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Workbooks worth writing for `report`, as (file name, bytes).
/// Empty sections produce no file.
fn build_exports(report: &ComparisonReport) -> Result<Vec<(&'static str, Vec<u8>)>, String> {
    let mut files = Vec::new();

    if let Some(f) = report.facilities.completed() {
        if !f.missing_in_raw.is_empty() {
            files.push((
                "missing_facilities.xlsx",
                ingestcheck_io::missing_facilities_xlsx(&f.missing_in_raw)?,
            ));
        }
    }

    if let Some(table) = report.quality.completed().and_then(|q| q.duplicate_rows.as_ref()) {
        files.push(("duplicate_rows.xlsx", ingestcheck_io::duplicate_rows_xlsx(table)?));
    }

    if let Some(Section::Completed(outcome)) = &report.resource_comparison {
        if !outcome.records().is_empty() {
            files.push((
                "comparison_results.xlsx",
                ingestcheck_io::match_records_xlsx(outcome.records())?,
            ));
        }
    }

    Ok(files)
}

fn write_exports(report: &ComparisonReport, dir: &Path) -> Result<(), CliError> {
    let files = build_exports(report).map_err(CliError::write)?;
    if files.is_empty() {
        eprintln!("nothing to export");
        return Ok(());
    }

    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::write(format!("cannot create {}: {e}", dir.display())))?;
    for (name, bytes) in files {
        let path = dir.join(name);
        std::fs::write(&path, bytes)
            .map_err(|e| CliError::write(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn write_records_csv(records: &[MatchRecord], path: &Path) -> Result<(), CliError> {
    let write_err = |e: csv::Error| CliError::write(format!("cannot write {}: {e}", path.display()));

    let mut wtr = csv::Writer::from_path(path).map_err(write_err)?;
    wtr.write_record(COMPARISON_HEADERS).map_err(write_err)?;
    for rec in records {
        wtr.write_record([
            rec.facility_name.to_string(),
            rec.resource_name.to_string(),
            rec.month.to_string(),
            rec.year.to_string(),
            rec.raw_quantity.as_ref().map(ToString::to_string).unwrap_or_default(),
            rec.ingestion_quantity.to_string(),
            rec.difference.map(format_number).unwrap_or_default(),
            rec.status.label().to_string(),
        ])
        .map_err(write_err)?;
    }
    wtr.flush()
        .map_err(|e| CliError::write(format!("cannot write {}: {e}", path.display())))?;
    Ok(())
}
