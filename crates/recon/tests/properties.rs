// Property-based tests for the comparison engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use ingestcheck_recon::config::ColumnNames;
use ingestcheck_recon::model::MatchStatus;
use ingestcheck_recon::{
    classify_schema, compare_facilities, generate_report, match_records, CellValue,
    ComparisonConfig, MatchOutcome, SchemaKind, SchemaRules, Table,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const RAW_COLS: [&str; 5] = ["Facility Name", "Resource Name", "Month", "Year", "Quantity"];
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

/// Column names the default detectors look at, plus noise.
const CANDIDATE_COLS: [&str; 16] = [
    "Facility Name",
    "Facility",
    "Scope",
    "Activity Type",
    "Month",
    "Year",
    "Quantity",
    "Unit",
    "Resource Name",
    "Resource",
    "Units",
    "Apr-24",
    "May-24",
    "Jun-24",
    "Notes",
    "Region",
];

/// Small alphabets so keys collide often.
fn arb_facility() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![
        8 => prop::sample::select(vec!["Plant A", "Plant B", "Plant C", "Plant D"]).prop_map(Some),
        1 => Just(None),
    ]
}

fn arb_key() -> impl Strategy<Value = (Option<&'static str>, &'static str, &'static str, i64)> {
    (
        arb_facility(),
        prop::sample::select(vec!["Diesel", "Electricity"]),
        prop::sample::select(vec!["Apr", "May"]),
        2023i64..2025,
    )
}

/// Quantities are small integers or missing; never text.
fn arb_quantity() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.9, (0u8..4).prop_map(f64::from))
}

fn arb_raw(max_rows: usize) -> impl Strategy<Value = Table> {
    prop::collection::vec((arb_key(), arb_quantity()), 0..=max_rows).prop_map(|rows| {
        let rows = rows
            .into_iter()
            .map(|((f, r, m, y), q)| vec![f.into(), r.into(), m.into(), y.into(), q.into()])
            .collect();
        Table::new(RAW_COLS.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    })
}

fn arb_ingestion(max_rows: usize) -> impl Strategy<Value = Table> {
    prop::collection::vec((arb_key(), arb_quantity()), 0..=max_rows).prop_map(|rows| {
        let rows = rows
            .into_iter()
            .map(|((f, r, m, y), q)| {
                vec![
                    f.into(),
                    "Scope 1".into(),
                    "Stationary".into(),
                    m.into(),
                    y.into(),
                    q.into(),
                    "L".into(),
                    r.into(),
                ]
            })
            .collect();
        Table::new(ING_COLS.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    })
}

fn header_only(cols: &[&str]) -> Table {
    Table::new(cols.iter().map(|s| s.to_string()).collect(), vec![]).unwrap()
}

fn key_of(row: &[CellValue], cols: [usize; 4]) -> Option<[&CellValue; 4]> {
    let key = cols.map(|i| &row[i]);
    if key.iter().any(|v| v.is_missing()) {
        None
    } else {
        Some(key)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn classification_ignores_column_order(
        (cols, shuffled) in prop::sample::subsequence(CANDIDATE_COLS.to_vec(), 0..=CANDIDATE_COLS.len())
            .prop_flat_map(|cols| (Just(cols.clone()), Just(cols).prop_shuffle())),
    ) {
        let rules = SchemaRules::default();
        prop_assert_eq!(
            classify_schema(&header_only(&cols), &rules),
            classify_schema(&header_only(&shuffled), &rules)
        );
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn unrelated_column_does_not_change_classification(
        cols in prop::sample::subsequence(CANDIDATE_COLS.to_vec(), 0..=CANDIDATE_COLS.len()),
    ) {
        let rules = SchemaRules::default();
        let mut extended = cols.clone();
        extended.push("Remarks (free text)");
        prop_assert_eq!(
            classify_schema(&header_only(&cols), &rules),
            classify_schema(&header_only(&extended), &rules)
        );
    }
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn facility_count_identities(raw in arb_raw(12), ingestion in arb_ingestion(12)) {
        let cmp = compare_facilities(&raw, &ingestion, &ColumnNames::default()).unwrap();

        prop_assert_eq!(cmp.common_facilities_count + cmp.missing_in_raw_count, cmp.ingestion_facilities_count);
        prop_assert_eq!(cmp.common_facilities_count + cmp.missing_in_ingestion_count, cmp.raw_facilities_count);
        prop_assert_eq!(cmp.missing_in_raw.len(), cmp.missing_in_raw_count);
        prop_assert_eq!(cmp.missing_in_ingestion.len(), cmp.missing_in_ingestion_count);

        let in_raw: BTreeSet<&String> = cmp.missing_in_raw.iter().collect();
        let in_ing: BTreeSet<&String> = cmp.missing_in_ingestion.iter().collect();
        prop_assert!(in_raw.is_disjoint(&in_ing));

        let mut sorted = cmp.missing_in_raw.clone();
        sorted.sort();
        prop_assert_eq!(sorted, cmp.missing_in_raw.clone());
    }
}

// ---------------------------------------------------------------------------
// Record matching
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn match_summary_invariants(raw in arb_raw(12), ingestion in arb_ingestion(12)) {
        let outcome = match_records(&raw, &ingestion, SchemaKind::MonthlyRows, &ColumnNames::default()).unwrap();
        let MatchOutcome::Completed { summary, records, .. } = outcome else {
            return Err(TestCaseError::fail("rows layout must complete"));
        };

        prop_assert_eq!(summary.total_ingestion_rows, ingestion.row_count());
        prop_assert_eq!(records.len(), ingestion.row_count());
        prop_assert_eq!(summary.matched_rows + summary.unmatched_rows, summary.total_ingestion_rows);
        prop_assert_eq!(summary.quantity_matches + summary.quantity_mismatches, summary.matched_rows);

        for (i, rec) in records.iter().enumerate() {
            prop_assert_eq!(rec.ingestion_row, i);
            if rec.status == MatchStatus::NoMatchInRaw {
                prop_assert!(rec.raw_quantity.is_none());
                prop_assert!(rec.difference.is_none());
            }
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn indexed_join_agrees_with_linear_scan(raw in arb_raw(12), ingestion in arb_ingestion(12)) {
        let outcome = match_records(&raw, &ingestion, SchemaKind::MonthlyRows, &ColumnNames::default()).unwrap();

        // Raw: Facility Name, Resource Name, Month, Year, Quantity.
        // Ingestion: Facility, .., Month(3), Year(4), Quantity(5), .., Resource Name(7).
        for (row, rec) in ingestion.rows().iter().zip(outcome.records()) {
            let first_raw = key_of(row, [0, 7, 3, 4]).and_then(|key| {
                raw.rows().iter().find(|r| key_of(r, [0, 1, 2, 3]) == Some(key))
            });
            match first_raw {
                None => prop_assert_eq!(rec.status, MatchStatus::NoMatchInRaw),
                Some(r) => {
                    prop_assert_eq!(rec.raw_quantity.as_ref(), Some(&r[4]));
                    let expected = if !r[4].is_missing() && r[4] == row[5] {
                        MatchStatus::Match
                    } else {
                        MatchStatus::Mismatch
                    };
                    prop_assert_eq!(rec.status, expected);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn report_is_deterministic(raw in arb_raw(10), ingestion in arb_ingestion(10)) {
        let config = ComparisonConfig::default();
        let r1 = generate_report(&raw, &ingestion, &config);
        let r2 = generate_report(&raw, &ingestion, &config);
        prop_assert_eq!(
            serde_json::to_string(&r1).unwrap(),
            serde_json::to_string(&r2).unwrap()
        );
        prop_assert_eq!(r1, r2);
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn duplicate_rows_come_in_groups(ingestion in arb_ingestion(12)) {
        let report = generate_report(&ingestion, &ingestion, &ComparisonConfig::default());
        let quality = report.quality.completed().unwrap();

        prop_assert!(quality.duplicate_row_count >= 2 * quality.duplicate_group_count);
        match &quality.duplicate_rows {
            Some(t) => prop_assert_eq!(t.row_count(), quality.duplicate_row_count),
            None => prop_assert_eq!(quality.duplicate_row_count, 0),
        }
    }
}
