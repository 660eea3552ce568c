use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ReconError};
use crate::table::{CellValue, Table};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Layout of the ingestion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    MonthlyRows,
    MonthlyColumns,
    Unknown,
}

impl SchemaKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MonthlyRows => "Monthly Data in Rows",
            Self::MonthlyColumns => "Monthly Data in Columns",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resource domain of the ingestion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    GhgEmissions,
    Unknown,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GhgEmissions => "GHG Emissions",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Shape + facilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicComparison {
    pub raw_rows: usize,
    pub ingestion_rows: usize,
    pub raw_columns: usize,
    pub ingestion_columns: usize,
    pub common_columns: Vec<String>,
    pub raw_only_columns: Vec<String>,
    pub ingestion_only_columns: Vec<String>,
    /// raw_rows - ingestion_rows; negative when ingestion is longer.
    pub row_difference: i64,
    pub missing_rows_in_ingestion: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityComparison {
    /// Ingestion column the identifiers were read from (`Facility Name` or its alias).
    pub ingestion_column: String,
    pub raw_facilities_count: usize,
    pub ingestion_facilities_count: usize,
    pub common_facilities_count: usize,
    /// Present in ingestion, absent from raw. Sorted.
    pub missing_in_raw: Vec<String>,
    /// Present in raw, absent from ingestion. Sorted.
    pub missing_in_ingestion: Vec<String>,
    pub missing_in_raw_count: usize,
    pub missing_in_ingestion_count: usize,
}

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NullValues,
    DuplicateRows,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub schema: SchemaKind,
    /// Measure columns left out of null and duplicate checks.
    pub excluded_columns: Vec<String>,
    pub issues: Vec<QualityIssue>,
    pub duplicate_row_count: usize,
    pub duplicate_group_count: usize,
    /// Every row of every duplicate group, in ingestion order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_rows: Option<Table>,
}

impl QualityReport {
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Record matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    Mismatch,
    NoMatchInRaw,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Match => "Match",
            Self::Mismatch => "Mismatch",
            Self::NoMatchInRaw => "No Match in Raw Data",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    /// 0-based data row in the ingestion table.
    pub ingestion_row: usize,
    pub facility_name: CellValue,
    pub resource_name: CellValue,
    pub month: CellValue,
    pub year: CellValue,
    /// Quantity of the matched raw row; omitted when no raw row matched. A
    /// matched row with a blank quantity serializes as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_quantity: Option<CellValue>,
    pub ingestion_quantity: CellValue,
    /// raw - ingestion.
    pub difference: Option<f64>,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub total_ingestion_rows: usize,
    pub matched_rows: usize,
    pub unmatched_rows: usize,
    pub quantity_matches: usize,
    pub quantity_mismatches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Completed {
        schema: SchemaKind,
        summary: MatchSummary,
        records: Vec<MatchRecord>,
    },
    /// Layout recognized but no matching strategy exists for it yet.
    NotImplemented { schema: SchemaKind, message: String },
}

impl MatchOutcome {
    pub fn summary(&self) -> Option<&MatchSummary> {
        match self {
            Self::Completed { summary, .. } => Some(summary),
            Self::NotImplemented { .. } => None,
        }
    }

    pub fn records(&self) -> &[MatchRecord] {
        match self {
            Self::Completed { records, .. } => records,
            Self::NotImplemented { .. } => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<ReconError> for SectionError {
    fn from(err: ReconError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One independently computed part of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Section<T> {
    Completed(T),
    Failed(SectionError),
}

impl<T> Section<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SectionError> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<T> From<Result<T, ReconError>> for Section<T> {
    fn from(result: Result<T, ReconError>) -> Self {
        match result {
            Ok(v) => Self::Completed(v),
            Err(e) => Self::Failed(e.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub basic: BasicComparison,
    pub facilities: Section<FacilityComparison>,
    pub schema: SchemaKind,
    pub resource: ResourceKind,
    /// Present only for a known resource with a recognized layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_comparison: Option<Section<MatchOutcome>>,
    pub quality: Section<QualityReport>,
}

impl ComparisonReport {
    /// True when anything needs a human to look at it: facilities missing
    /// from raw, unmatched or mismatched rows, quality issues, or a failed
    /// section.
    pub fn has_discrepancies(&self) -> bool {
        let facilities = match &self.facilities {
            Section::Completed(f) => f.missing_in_raw_count > 0,
            Section::Failed(_) => true,
        };
        let records = match &self.resource_comparison {
            Some(Section::Completed(outcome)) => outcome
                .summary()
                .map(|s| s.unmatched_rows > 0 || s.quantity_mismatches > 0)
                .unwrap_or(false),
            Some(Section::Failed(_)) => true,
            None => false,
        };
        let quality = match &self.quality {
            Section::Completed(q) => !q.issues.is_empty(),
            Section::Failed(_) => true,
        };
        facilities || records || quality
    }
}
