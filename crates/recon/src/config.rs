use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::classify::{ColumnRule, Detector, SchemaRules};
use crate::error::ReconError;
use crate::model::{ResourceKind, SchemaKind};

/// Longest month window accepted (ten years).
const MAX_WINDOW_MONTHS: u32 = 120;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything the engine needs beyond the two tables. Every section is
/// optional in TOML and falls back to the built-in GHG rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub columns: ColumnNames,
    pub months: MonthTokens,
    pub raw_sheets: RawSheets,
    pub schema_detectors: Vec<Detector<SchemaKind>>,
    pub resource_detectors: Vec<Detector<ResourceKind>>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            months: MonthTokens::default(),
            raw_sheets: RawSheets::default(),
            schema_detectors: default_schema_detectors(),
            resource_detectors: default_resource_detectors(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Facility column required in the raw table.
    pub raw_facility: String,
    /// Accepted facility columns in the ingestion table, in preference order.
    pub ingestion_facility: Vec<String>,
    pub resource_name: String,
    pub month: String,
    pub year: String,
    pub quantity: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            raw_facility: "Facility Name".into(),
            ingestion_facility: vec!["Facility Name".into(), "Facility".into()],
            resource_name: "Resource Name".into(),
            month: "Month".into(),
            year: "Year".into(),
            quantity: "Quantity".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw sheets
// ---------------------------------------------------------------------------

/// Sheet of the raw workbook holding each resource's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSheets {
    pub ghg_emissions: String,
}

impl Default for RawSheets {
    fn default() -> Self {
        Self {
            ghg_emissions: "GHG Emissions".into(),
        }
    }
}

impl RawSheets {
    /// None for `Unknown`: the caller falls back to the first sheet.
    pub fn sheet_for(&self, resource: ResourceKind) -> Option<&str> {
        match resource {
            ResourceKind::GhgEmissions => Some(&self.ghg_emissions),
            ResourceKind::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Month tokens
// ---------------------------------------------------------------------------

/// Month-token source: an explicit list, or a window of consecutive months
/// rendered as `Apr-24` style tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthTokens {
    Explicit { tokens: Vec<String> },
    Window { start: NaiveDate, months: u32 },
}

impl Default for MonthTokens {
    fn default() -> Self {
        Self::Window {
            start: NaiveDate::from_ymd_opt(2024, 4, 1).expect("2024-04-01 is a valid date"),
            months: 11,
        }
    }
}

impl MonthTokens {
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Self::Explicit { tokens } => tokens.clone(),
            Self::Window { start, months } => (0..*months)
                .filter_map(|i| start.checked_add_months(Months::new(i)))
                .map(|d| d.format("%b-%y").to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default detectors
// ---------------------------------------------------------------------------

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn default_schema_detectors() -> Vec<Detector<SchemaKind>> {
    vec![
        Detector {
            name: "monthly_rows".into(),
            kind: SchemaKind::MonthlyRows,
            requirements: vec![
                ColumnRule::AnyOf { columns: names(&["Facility Name", "Facility"]) },
                ColumnRule::AllOf {
                    columns: names(&[
                        "Scope",
                        "Activity Type",
                        "Month",
                        "Year",
                        "Quantity",
                        "Unit",
                        "Resource Name",
                    ]),
                },
            ],
        },
        Detector {
            name: "monthly_columns".into(),
            kind: SchemaKind::MonthlyColumns,
            requirements: vec![
                ColumnRule::AnyOf { columns: names(&["Facility Name", "Facility"]) },
                ColumnRule::AllOf { columns: names(&["Scope", "Activity Type", "Resource", "Units"]) },
                ColumnRule::MonthColumns { min: 3 },
            ],
        },
    ]
}

fn default_resource_detectors() -> Vec<Detector<ResourceKind>> {
    vec![Detector {
        name: "ghg_emissions".into(),
        kind: ResourceKind::GhgEmissions,
        requirements: vec![ColumnRule::AllOf { columns: names(&["Scope"]) }],
    }]
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ComparisonConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ComparisonConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let c = &self.columns;
        for (field, value) in [
            ("raw_facility", &c.raw_facility),
            ("resource_name", &c.resource_name),
            ("month", &c.month),
            ("year", &c.year),
            ("quantity", &c.quantity),
        ] {
            if value.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{field} must not be empty"
                )));
            }
        }
        if c.ingestion_facility.is_empty() || c.ingestion_facility.iter().any(String::is_empty) {
            return Err(ReconError::ConfigValidation(
                "columns.ingestion_facility needs at least one non-empty column name".into(),
            ));
        }

        if self.raw_sheets.ghg_emissions.is_empty() {
            return Err(ReconError::ConfigValidation(
                "raw_sheets.ghg_emissions must not be empty".into(),
            ));
        }

        match &self.months {
            MonthTokens::Explicit { tokens } => {
                if tokens.is_empty() || tokens.iter().any(String::is_empty) {
                    return Err(ReconError::ConfigValidation(
                        "months.tokens needs at least one non-empty token".into(),
                    ));
                }
            }
            MonthTokens::Window { months, .. } => {
                if *months == 0 || *months > MAX_WINDOW_MONTHS {
                    return Err(ReconError::ConfigValidation(format!(
                        "months.months must be between 1 and {MAX_WINDOW_MONTHS}, got {months}"
                    )));
                }
            }
        }

        for d in &self.schema_detectors {
            if d.kind == SchemaKind::Unknown {
                return Err(ReconError::ConfigValidation(format!(
                    "schema detector '{}': kind 'unknown' is the fallback, not a detector target",
                    d.name
                )));
            }
            validate_requirements(&d.name, &d.requirements)?;
        }
        for d in &self.resource_detectors {
            if d.kind == ResourceKind::Unknown {
                return Err(ReconError::ConfigValidation(format!(
                    "resource detector '{}': kind 'unknown' is the fallback, not a detector target",
                    d.name
                )));
            }
            validate_requirements(&d.name, &d.requirements)?;
        }

        Ok(())
    }

    pub fn schema_rules(&self) -> SchemaRules {
        SchemaRules {
            month_tokens: self.months.tokens(),
            schema_detectors: self.schema_detectors.clone(),
            resource_detectors: self.resource_detectors.clone(),
        }
    }
}

fn validate_requirements(name: &str, requirements: &[ColumnRule]) -> Result<(), ReconError> {
    if requirements.is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "detector '{name}' has no requirements"
        )));
    }
    for rule in requirements {
        match rule {
            ColumnRule::AllOf { columns } | ColumnRule::AnyOf { columns } if columns.is_empty() => {
                return Err(ReconError::ConfigValidation(format!(
                    "detector '{name}': column list must not be empty"
                )));
            }
            ColumnRule::MonthColumns { min: 0 } => {
                return Err(ReconError::ConfigValidation(format!(
                    "detector '{name}': month_columns.min must be at least 1"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_apr24_to_feb25() {
        let tokens = MonthTokens::default().tokens();
        assert_eq!(
            tokens,
            vec![
                "Apr-24", "May-24", "Jun-24", "Jul-24", "Aug-24", "Sep-24", "Oct-24", "Nov-24",
                "Dec-24", "Jan-25", "Feb-25"
            ]
        );
    }

    #[test]
    fn empty_toml_is_default() {
        let config = ComparisonConfig::from_toml("").unwrap();
        assert_eq!(config, ComparisonConfig::default());
    }

    #[test]
    fn parse_month_window() {
        let config = ComparisonConfig::from_toml(
            r#"
[months]
start = "2025-04-01"
months = 3
"#,
        )
        .unwrap();
        assert_eq!(config.months.tokens(), vec!["Apr-25", "May-25", "Jun-25"]);
        // Untouched sections keep their defaults.
        assert_eq!(config.columns, ColumnNames::default());
        assert_eq!(config.schema_detectors.len(), 2);
    }

    #[test]
    fn parse_explicit_tokens_and_columns() {
        let config = ComparisonConfig::from_toml(
            r#"
[columns]
raw_facility = "Site"
ingestion_facility = ["Site", "Site Code"]

[months]
tokens = ["FY25-Q1", "FY25-Q2"]
"#,
        )
        .unwrap();
        assert_eq!(config.columns.raw_facility, "Site");
        assert_eq!(config.columns.ingestion_facility, vec!["Site", "Site Code"]);
        assert_eq!(config.columns.quantity, "Quantity");
        assert_eq!(config.months.tokens(), vec!["FY25-Q1", "FY25-Q2"]);
    }

    #[test]
    fn parse_detectors() {
        let config = ComparisonConfig::from_toml(
            r#"
[[schema_detectors]]
name = "site_rows"
kind = "monthly_rows"
requirements = [
  { rule = "all_of", columns = ["Site", "Quantity"] },
  { rule = "month_columns", min = 1 },
]

[[resource_detectors]]
name = "water"
kind = "ghg_emissions"
requirements = [{ rule = "any_of", columns = ["Scope", "Scope 1"] }]
"#,
        )
        .unwrap();
        assert_eq!(config.schema_detectors.len(), 1);
        assert_eq!(config.schema_detectors[0].name, "site_rows");
        assert_eq!(
            config.schema_detectors[0].requirements[1],
            ColumnRule::MonthColumns { min: 1 }
        );
        assert_eq!(config.resource_detectors[0].kind, ResourceKind::GhgEmissions);
    }

    #[test]
    fn raw_sheet_mapping() {
        let config = ComparisonConfig::from_toml(
            r#"
[raw_sheets]
ghg_emissions = "Emissions FY25"
"#,
        )
        .unwrap();
        assert_eq!(config.raw_sheets.sheet_for(ResourceKind::GhgEmissions), Some("Emissions FY25"));
        assert_eq!(config.raw_sheets.sheet_for(ResourceKind::Unknown), None);
        assert_eq!(
            RawSheets::default().sheet_for(ResourceKind::GhgEmissions),
            Some("GHG Emissions")
        );
    }

    #[test]
    fn reject_empty_facility_aliases() {
        let err = ComparisonConfig::from_toml(
            r#"
[columns]
ingestion_facility = []
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ingestion_facility"));
    }

    #[test]
    fn reject_oversized_window() {
        let err = ComparisonConfig::from_toml(
            r#"
[months]
start = "2024-04-01"
months = 500
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("between 1 and 120"));
    }

    #[test]
    fn reject_unknown_detector_kind() {
        let err = ComparisonConfig::from_toml(
            r#"
[[schema_detectors]]
name = "bad"
kind = "monthly_quarters"
requirements = [{ rule = "all_of", columns = ["A"] }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_fallback_kind_as_target() {
        let err = ComparisonConfig::from_toml(
            r#"
[[schema_detectors]]
name = "catch_all"
kind = "unknown"
requirements = [{ rule = "all_of", columns = ["A"] }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("catch_all"));
    }

    #[test]
    fn reject_zero_month_columns() {
        let err = ComparisonConfig::from_toml(
            r#"
[[schema_detectors]]
name = "zero"
kind = "monthly_columns"
requirements = [{ rule = "month_columns", min = 0 }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }
}
