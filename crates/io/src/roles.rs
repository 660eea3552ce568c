// Which of two uploaded workbooks is the raw data and which the ingestion
// output, and which raw sheet to compare against.

use std::path::{Path, PathBuf};

use ingestcheck_recon::config::RawSheets;
use ingestcheck_recon::{classify_schema, ResourceKind, SchemaKind, SchemaRules};

use crate::xlsx::read_table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub raw: PathBuf,
    pub ingestion: PathBuf,
    /// Human-readable reasons behind the assignment, in decision order.
    pub notes: Vec<String>,
}

/// Size of a file as seen by the role heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub path: &'a Path,
    pub size: u64,
}

/// Assign roles to two workbooks on disk.
///
/// The larger file is raw; on a tie the second file is raw. If the file
/// picked as ingestion has no recognizable layout on its first sheet while
/// the other file's first sheet does, the roles are swapped.
pub fn identify_roles(a: &Path, b: &Path, rules: &SchemaRules) -> Result<RoleAssignment, String> {
    let size = |p: &Path| {
        std::fs::metadata(p)
            .map(|m| m.len())
            .map_err(|e| format!("Failed to stat '{}': {}", p.display(), e))
    };
    let a = Candidate { path: a, size: size(a)? };
    let b = Candidate { path: b, size: size(b)? };

    let mut assignment = assign_by_size(a, b);

    let ingestion_schema = first_sheet_schema(&assignment.ingestion, rules)?;
    if ingestion_schema == SchemaKind::Unknown {
        let raw_schema = first_sheet_schema(&assignment.raw, rules)?;
        if raw_schema != SchemaKind::Unknown {
            log::warn!(
                "'{}' looks like ingestion output ({}), swapping roles",
                assignment.raw.display(),
                raw_schema
            );
            assignment.notes.push(format!(
                "swapped: '{}' has an unrecognized layout while '{}' is '{}'",
                assignment.ingestion.display(),
                assignment.raw.display(),
                raw_schema
            ));
            std::mem::swap(&mut assignment.raw, &mut assignment.ingestion);
        }
    }

    log::info!(
        "raw: {}, ingestion: {}",
        assignment.raw.display(),
        assignment.ingestion.display()
    );
    Ok(assignment)
}

/// Larger is raw; ties go to the second candidate.
pub fn assign_by_size(a: Candidate<'_>, b: Candidate<'_>) -> RoleAssignment {
    let (raw, ingestion) = if a.size > b.size { (a, b) } else { (b, a) };
    let note = if a.size == b.size {
        format!("equal sizes ({} bytes), second file taken as raw", a.size)
    } else {
        format!(
            "'{}' is larger ({} vs {} bytes)",
            raw.path.display(),
            raw.size,
            ingestion.size
        )
    };
    RoleAssignment {
        raw: raw.path.to_path_buf(),
        ingestion: ingestion.path.to_path_buf(),
        notes: vec![note],
    }
}

fn first_sheet_schema(path: &Path, rules: &SchemaRules) -> Result<SchemaKind, String> {
    let table = read_table(path, None)?;
    Ok(classify_schema(&table, rules))
}

/// Raw sheet holding the data for `resource`.
///
/// A known resource requires its mapped sheet; an unknown resource falls
/// back to the first sheet.
pub fn select_raw_sheet(
    sheets: &[String],
    resource: ResourceKind,
    raw_sheets: &RawSheets,
) -> Result<String, String> {
    match raw_sheets.sheet_for(resource) {
        Some(expected) => {
            if sheets.iter().any(|s| s == expected) {
                Ok(expected.to_string())
            } else {
                Err(format!(
                    "{} sheet not found in raw data file (available: {})",
                    expected,
                    sheets.join(", ")
                ))
            }
        }
        None => {
            let first = sheets
                .first()
                .ok_or_else(|| "Raw data file contains no sheets".to_string())?;
            log::warn!("unknown resource type, using first raw sheet '{}'", first);
            Ok(first.clone())
        }
    }
}
