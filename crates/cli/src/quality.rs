//! `ingestcheck quality`: classification and quality checks on one workbook.

use std::path::PathBuf;

use ingestcheck_io::{import_sheet, ImportResult};
use ingestcheck_recon::model::QualityReport;
use ingestcheck_recon::{
    analyze_quality, classify_resource, classify_schema, ResourceKind, SchemaKind, Section,
};
use serde::Serialize;

use crate::config::load_config;
use crate::exit_codes::EXIT_DISCREPANCIES;
use crate::{require_file, to_json, CliError};

#[derive(Serialize)]
struct QualityOutput {
    schema: SchemaKind,
    resource: ResourceKind,
    quality: Section<QualityReport>,
    import: ImportResult,
}

pub fn cmd_quality(
    file: PathBuf,
    sheet: Option<String>,
    config: Option<PathBuf>,
    json: bool,
    fail_on_discrepancy: bool,
) -> Result<(), CliError> {
    require_file(&file)?;
    let config = load_config(config.as_deref())?;
    let rules = config.schema_rules();

    let (table, import) = import_sheet(&file, sheet.as_deref()).map_err(CliError::decode)?;
    let schema = classify_schema(&table, &rules);
    let resource = classify_resource(&table, &rules);
    let quality: Section<QualityReport> =
        analyze_quality(&table, schema, &rules, &config.columns).into();

    let output = QualityOutput { schema, resource, quality, import };
    if json {
        println!("{}", to_json(&output)?);
    }

    eprintln!(
        "{}: {} rows, layout {} / {}",
        file.display(),
        table.row_count(),
        output.schema,
        output.resource
    );
    let has_issues = match &output.quality {
        Section::Completed(q) => {
            if q.issues.is_empty() {
                eprintln!("no issues");
            }
            for message in q.messages() {
                eprintln!("  - {message}");
            }
            !q.issues.is_empty()
        }
        Section::Failed(e) => {
            eprintln!("quality check failed: {}", e.message);
            true
        }
    };
    if let Some(warning) = output.import.warning() {
        eprintln!("warning: {warning}");
    }
    let needs_attention = has_issues || output.import.truncated();

    if fail_on_discrepancy && needs_attention {
        return Err(CliError::new(EXIT_DISCREPANCIES, "quality issues found"));
    }
    Ok(())
}
