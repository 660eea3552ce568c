use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ComparisonConfig;
use crate::model::{ResourceKind, SchemaKind};
use crate::table::Table;

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

/// One column-presence requirement of a detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ColumnRule {
    /// Every listed column is present.
    AllOf { columns: Vec<String> },
    /// At least one listed column is present.
    AnyOf { columns: Vec<String> },
    /// At least `min` column names contain a month token.
    MonthColumns { min: usize },
}

impl ColumnRule {
    fn is_satisfied(&self, names: &HashSet<&str>, month_tokens: &[String]) -> bool {
        match self {
            Self::AllOf { columns } => columns.iter().all(|c| names.contains(c.as_str())),
            Self::AnyOf { columns } => columns.iter().any(|c| names.contains(c.as_str())),
            Self::MonthColumns { min } => {
                names.iter().filter(|n| is_month_column(n, month_tokens)).count() >= *min
            }
        }
    }
}

/// Named, ordered rule set that yields `kind` when every requirement holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detector<K> {
    pub name: String,
    pub kind: K,
    pub requirements: Vec<ColumnRule>,
}

impl<K> Detector<K> {
    pub fn matches(&self, columns: &[String], month_tokens: &[String]) -> bool {
        let names: HashSet<&str> = columns.iter().map(String::as_str).collect();
        self.matches_set(&names, month_tokens)
    }

    fn matches_set(&self, names: &HashSet<&str>, month_tokens: &[String]) -> bool {
        self.requirements.iter().all(|r| r.is_satisfied(names, month_tokens))
    }
}

/// Whether a column name carries one of the month tokens (`Apr-24`, `Total Apr-24`, ...).
pub fn is_month_column(name: &str, month_tokens: &[String]) -> bool {
    month_tokens.iter().any(|t| name.contains(t.as_str()))
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Resolved classification rules: month tokens plus both detector lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRules {
    pub month_tokens: Vec<String>,
    pub schema_detectors: Vec<Detector<SchemaKind>>,
    pub resource_detectors: Vec<Detector<ResourceKind>>,
}

impl Default for SchemaRules {
    fn default() -> Self {
        ComparisonConfig::default().schema_rules()
    }
}

impl SchemaRules {
    pub fn is_month_column(&self, name: &str) -> bool {
        is_month_column(name, &self.month_tokens)
    }

    /// True when some detector for `schema` accepts these columns,
    /// regardless of detector priority.
    pub fn admits(&self, columns: &[String], schema: SchemaKind) -> bool {
        self.schema_detectors
            .iter()
            .filter(|d| d.kind == schema)
            .any(|d| d.matches(columns, &self.month_tokens))
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Infer the ingestion layout from its column names. First matching detector wins.
pub fn classify_schema(ingestion: &Table, rules: &SchemaRules) -> SchemaKind {
    first_match(ingestion.columns(), &rules.schema_detectors, &rules.month_tokens)
        .unwrap_or(SchemaKind::Unknown)
}

/// Infer the resource domain from its column names. First matching detector wins.
pub fn classify_resource(ingestion: &Table, rules: &SchemaRules) -> ResourceKind {
    first_match(ingestion.columns(), &rules.resource_detectors, &rules.month_tokens)
        .unwrap_or(ResourceKind::Unknown)
}

fn first_match<K: Copy>(
    columns: &[String],
    detectors: &[Detector<K>],
    month_tokens: &[String],
) -> Option<K> {
    let names: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let hit = detectors.iter().find(|d| d.matches_set(&names, month_tokens))?;
    log::debug!("detector '{}' matched {} column(s)", hit.name, columns.len());
    Some(hit.kind)
}
