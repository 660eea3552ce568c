use std::collections::BTreeSet;

use crate::classify::{classify_resource, classify_schema};
use crate::config::ComparisonConfig;
use crate::facility::compare_facilities;
use crate::matcher::match_records;
use crate::model::{BasicComparison, ComparisonReport, ResourceKind, SchemaKind};
use crate::quality::analyze_quality;
use crate::table::Table;

/// Compare a raw table against its ingestion table. Never fails: each
/// section that cannot be computed is reported as `Section::Failed`.
pub fn generate_report(raw: &Table, ingestion: &Table, config: &ComparisonConfig) -> ComparisonReport {
    let rules = config.schema_rules();

    let basic = basic_comparison(raw, ingestion);
    let facilities = compare_facilities(raw, ingestion, &config.columns).into();

    let schema = classify_schema(ingestion, &rules);
    let resource = classify_resource(ingestion, &rules);
    log::info!("ingestion classified as '{schema}' / '{resource}'");

    let resource_comparison = if resource == ResourceKind::Unknown || schema == SchemaKind::Unknown {
        log::debug!("record matching skipped");
        None
    } else {
        Some(match_records(raw, ingestion, schema, &config.columns).into())
    };

    let quality = analyze_quality(ingestion, schema, &rules, &config.columns).into();

    ComparisonReport {
        basic,
        facilities,
        schema,
        resource,
        resource_comparison,
        quality,
    }
}

/// Row and column counts plus sorted column-set differences.
pub fn basic_comparison(raw: &Table, ingestion: &Table) -> BasicComparison {
    let raw_cols: BTreeSet<&str> = raw.columns().iter().map(String::as_str).collect();
    let ing_cols: BTreeSet<&str> = ingestion.columns().iter().map(String::as_str).collect();
    let owned = |it: Vec<&str>| it.into_iter().map(str::to_string).collect::<Vec<_>>();

    let row_difference = raw.row_count() as i64 - ingestion.row_count() as i64;

    BasicComparison {
        raw_rows: raw.row_count(),
        ingestion_rows: ingestion.row_count(),
        raw_columns: raw.column_count(),
        ingestion_columns: ingestion.column_count(),
        common_columns: owned(raw_cols.intersection(&ing_cols).copied().collect()),
        raw_only_columns: owned(raw_cols.difference(&ing_cols).copied().collect()),
        ingestion_only_columns: owned(ing_cols.difference(&raw_cols).copied().collect()),
        row_difference,
        missing_rows_in_ingestion: row_difference.max(0) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{MatchOutcome, Section};
    use crate::table::CellValue;

    fn table(cols: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::new(cols.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    const ING_COLS: [&str; 8] = [
        "Facility",
        "Scope",
        "Activity Type",
        "Month",
        "Year",
        "Quantity",
        "Unit",
        "Resource Name",
    ];

    fn ing_row(facility: &str, month: &str, qty: f64) -> Vec<CellValue> {
        vec![
            facility.into(),
            "Scope 1".into(),
            "Stationary".into(),
            month.into(),
            2024_i64.into(),
            qty.into(),
            "L".into(),
            "Diesel".into(),
        ]
    }

    fn raw_table() -> Table {
        table(
            &["Facility Name", "Resource Name", "Month", "Year", "Quantity", "Notes"],
            vec![
                vec!["Plant A".into(), "Diesel".into(), "Apr".into(), 2024_i64.into(), 10.0.into(), "".into()],
                vec!["Plant B".into(), "Diesel".into(), "Apr".into(), 2024_i64.into(), 3.0.into(), "".into()],
                vec!["Plant A".into(), "Diesel".into(), "May".into(), 2024_i64.into(), 12.0.into(), "".into()],
            ],
        )
    }

    #[test]
    fn basic_stats_are_sorted_and_signed() {
        let raw = table(&["B", "A", "C"], vec![vec![1.0.into(), 2.0.into(), 3.0.into()]]);
        let ing = table(&["D", "A"], vec![vec![1.0.into(), 2.0.into()], vec![1.0.into(), 2.0.into()]]);
        let basic = basic_comparison(&raw, &ing);
        assert_eq!(basic.common_columns, vec!["A"]);
        assert_eq!(basic.raw_only_columns, vec!["B", "C"]);
        assert_eq!(basic.ingestion_only_columns, vec!["D"]);
        assert_eq!(basic.row_difference, -1);
        assert_eq!(basic.missing_rows_in_ingestion, 0);
    }

    #[test]
    fn full_report_on_rows_layout() {
        let ing = table(
            &ING_COLS,
            vec![
                ing_row("Plant A", "Apr", 10.0),
                ing_row("Plant A", "May", 10.0),
                ing_row("Plant C", "Apr", 1.0),
            ],
        );
        let report = generate_report(&raw_table(), &ing, &ComparisonConfig::default());

        assert_eq!(report.schema, SchemaKind::MonthlyRows);
        assert_eq!(report.resource, ResourceKind::GhgEmissions);

        let facilities = report.facilities.completed().unwrap();
        assert_eq!(facilities.missing_in_raw, vec!["Plant C"]);
        assert_eq!(facilities.missing_in_ingestion, vec!["Plant B"]);

        let outcome = report.resource_comparison.as_ref().unwrap().completed().unwrap();
        let summary = outcome.summary().unwrap();
        assert_eq!(summary.matched_rows, 2);
        assert_eq!(summary.quantity_matches, 1);
        assert_eq!(summary.quantity_mismatches, 1);
        assert_eq!(summary.unmatched_rows, 1);

        assert!(report.quality.completed().unwrap().issues.is_empty());
        assert!(report.has_discrepancies());
    }

    #[test]
    fn unknown_schema_skips_matching() {
        let ing = table(&["Facility", "Scope"], vec![vec!["Plant A".into(), "Scope 1".into()]]);
        let report = generate_report(&raw_table(), &ing, &ComparisonConfig::default());
        assert_eq!(report.schema, SchemaKind::Unknown);
        assert_eq!(report.resource, ResourceKind::GhgEmissions);
        assert!(report.resource_comparison.is_none());
        assert!(report.quality.completed().is_some());
    }

    #[test]
    fn columns_layout_reports_not_implemented() {
        let ing = table(
            &["Facility Name", "Scope", "Activity Type", "Resource", "Units", "Apr-24", "May-24", "Jun-24"],
            vec![],
        );
        let report = generate_report(&raw_table(), &ing, &ComparisonConfig::default());
        let outcome = report.resource_comparison.unwrap();
        assert!(matches!(outcome, Section::Completed(MatchOutcome::NotImplemented { .. })));
    }

    #[test]
    fn section_failures_do_not_abort_the_report() {
        let raw = table(&["Site"], vec![vec!["Plant A".into()]]);
        let ing = table(&ING_COLS, vec![ing_row("Plant A", "Apr", 1.0)]);
        let report = generate_report(&raw, &ing, &ComparisonConfig::default());

        let err = report.facilities.error().unwrap();
        assert_eq!(err.kind, ErrorKind::Schema);
        assert_eq!(err.message, "Facility Name column not found in raw data file");
        assert!(report.resource_comparison.unwrap().is_failed());
        assert!(report.quality.completed().is_some());
        assert_eq!(report.basic.raw_rows, 1);
    }

    #[test]
    fn empty_ingestion_is_clean() {
        let ing = table(&ING_COLS, vec![]);
        let report = generate_report(&raw_table(), &ing, &ComparisonConfig::default());
        assert_eq!(report.basic.ingestion_rows, 0);
        assert_eq!(report.basic.missing_rows_in_ingestion, 3);
        let quality = report.quality.completed().unwrap();
        assert!(quality.issues.is_empty());
        assert!(quality.duplicate_rows.is_none());
        let summary = report.resource_comparison.unwrap().completed().unwrap().summary().cloned().unwrap();
        assert_eq!(summary.total_ingestion_rows, 0);
    }

    #[test]
    fn report_is_idempotent() {
        let ing = table(&ING_COLS, vec![ing_row("Plant A", "Apr", 10.0), ing_row("Plant A", "Apr", 10.0)]);
        let config = ComparisonConfig::default();
        let a = generate_report(&raw_table(), &ing, &config);
        let b = generate_report(&raw_table(), &ing, &config);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
