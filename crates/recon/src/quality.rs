use std::collections::HashMap;

use crate::classify::SchemaRules;
use crate::config::ColumnNames;
use crate::error::ReconError;
use crate::model::{IssueKind, QualityIssue, QualityReport, SchemaKind};
use crate::table::{CellValue, Table};

/// Null and duplicate checks over the identifying columns of `ingestion`.
///
/// Which columns identify a row depends on `schema`: the quantity column is
/// a measure under `MonthlyRows`, every month-token column is a measure
/// under `MonthlyColumns`, and nothing is excluded for `Unknown`.
/// A recognized `schema` the table does not satisfy is an error, so an
/// empty issue list always means the checks ran and found nothing.
pub fn analyze_quality(
    ingestion: &Table,
    schema: SchemaKind,
    rules: &SchemaRules,
    columns: &ColumnNames,
) -> Result<QualityReport, ReconError> {
    if schema != SchemaKind::Unknown && !rules.admits(ingestion.columns(), schema) {
        return Err(ReconError::SchemaMismatch { expected: schema });
    }

    let is_excluded = |name: &str| match schema {
        SchemaKind::MonthlyRows => name == columns.quantity,
        SchemaKind::MonthlyColumns => rules.is_month_column(name),
        SchemaKind::Unknown => false,
    };

    let mut excluded_columns = Vec::new();
    let mut identifying = Vec::new();
    for (idx, name) in ingestion.columns().iter().enumerate() {
        if is_excluded(name) {
            excluded_columns.push(name.clone());
        } else {
            identifying.push(idx);
        }
    }

    let mut issues = Vec::new();

    // Nulls
    for &idx in &identifying {
        let nulls = ingestion.column_values(idx).filter(|v| v.is_missing()).count();
        if nulls > 0 {
            let column = ingestion.columns()[idx].clone();
            issues.push(QualityIssue {
                kind: IssueKind::NullValues,
                message: format!("Ingestion data has {nulls} null values in '{column}' column"),
                column: Some(column),
                count: nulls,
            });
        }
    }

    // Duplicates
    let groups = duplicate_groups(ingestion, &identifying);
    let mut duplicate_indices: Vec<usize> = groups.iter().flatten().copied().collect();
    duplicate_indices.sort_unstable();

    let duplicate_rows = if duplicate_indices.is_empty() {
        None
    } else {
        let count = duplicate_indices.len();
        let message = match schema {
            SchemaKind::MonthlyRows => format!(
                "Ingestion data has {count} duplicate rows (same values in all columns except {})",
                columns.quantity
            ),
            SchemaKind::MonthlyColumns => format!(
                "Ingestion data has {count} duplicate rows (same values in all columns except month columns)"
            ),
            SchemaKind::Unknown => format!("Ingestion data has {count} completely duplicate rows"),
        };
        issues.push(QualityIssue {
            kind: IssueKind::DuplicateRows,
            column: None,
            count,
            message,
        });
        Some(ingestion.select_rows(&duplicate_indices))
    };

    log::info!(
        "quality: {} issue(s), {} duplicate row(s) in {} group(s), {} column(s) excluded",
        issues.len(),
        duplicate_indices.len(),
        groups.len(),
        excluded_columns.len(),
    );

    Ok(QualityReport {
        schema,
        excluded_columns,
        issues,
        duplicate_row_count: duplicate_indices.len(),
        duplicate_group_count: groups.len(),
        duplicate_rows,
    })
}

/// Row-index groups of size >= 2 sharing the same projection onto `identifying`.
fn duplicate_groups(table: &Table, identifying: &[usize]) -> Vec<Vec<usize>> {
    if identifying.is_empty() {
        log::debug!("quality: no identifying columns, duplicate check skipped");
        return Vec::new();
    }

    let mut groups: HashMap<Vec<&CellValue>, Vec<usize>> = HashMap::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let key: Vec<&CellValue> = identifying.iter().map(|&i| &row[i]).collect();
        groups.entry(key).or_default().push(row_idx);
    }

    let mut dups: Vec<Vec<usize>> = groups.into_values().filter(|g| g.len() >= 2).collect();
    dups.sort_unstable_by_key(|g| g[0]);
    dups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cols: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::new(cols.iter().map(|s| s.to_string()).collect(), rows).unwrap()
    }

    const ROWS_LAYOUT: [&str; 8] = [
        "Facility",
        "Scope",
        "Activity Type",
        "Month",
        "Year",
        "Quantity",
        "Unit",
        "Resource Name",
    ];

    fn rows_record(facility: &str, month: &str, qty: f64) -> Vec<CellValue> {
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

    fn analyze(t: &Table, schema: SchemaKind) -> QualityReport {
        analyze_quality(t, schema, &SchemaRules::default(), &ColumnNames::default()).unwrap()
    }

    #[test]
    fn identical_rows_are_both_reported() {
        let t = table(
            &ROWS_LAYOUT,
            vec![rows_record("Plant A", "Apr", 5.0), rows_record("Plant A", "Apr", 5.0)],
        );
        let report = analyze(&t, SchemaKind::MonthlyRows);
        assert_eq!(report.excluded_columns, vec!["Quantity"]);
        assert_eq!(report.duplicate_row_count, 2);
        assert_eq!(report.duplicate_group_count, 1);
        assert_eq!(
            report.messages(),
            vec!["Ingestion data has 2 duplicate rows (same values in all columns except Quantity)"]
        );
        assert_eq!(report.duplicate_rows.unwrap().row_count(), 2);
    }

    #[test]
    fn quantity_does_not_break_duplicates() {
        let t = table(
            &ROWS_LAYOUT,
            vec![
                rows_record("Plant A", "Apr", 5.0),
                rows_record("Plant B", "Apr", 1.0),
                rows_record("Plant A", "Apr", 7.0),
            ],
        );
        let report = analyze(&t, SchemaKind::MonthlyRows);
        let dups = report.duplicate_rows.unwrap();
        assert_eq!(dups.rows(), &[t.rows()[0].clone(), t.rows()[2].clone()]);
    }

    #[test]
    fn nulls_in_excluded_columns_are_ignored() {
        let mut r = rows_record("Plant A", "Apr", 0.0);
        r[5] = CellValue::Missing;
        r[1] = CellValue::Missing;
        let t = table(&ROWS_LAYOUT, vec![r]);
        let report = analyze(&t, SchemaKind::MonthlyRows);
        assert_eq!(report.messages(), vec!["Ingestion data has 1 null values in 'Scope' column"]);
        assert_eq!(report.issues[0].column.as_deref(), Some("Scope"));
        assert!(report.duplicate_rows.is_none());
    }

    #[test]
    fn month_columns_are_measures() {
        let cols = [
            "Facility Name", "Scope", "Activity Type", "Resource", "Units", "Apr-24", "May-24",
            "Jun-24",
        ];
        let row = |apr: Option<f64>| -> Vec<CellValue> {
            vec![
                "Plant A".into(),
                "Scope 2".into(),
                "Purchased".into(),
                "Electricity".into(),
                "kWh".into(),
                apr.into(),
                2.0.into(),
                3.0.into(),
            ]
        };
        let t = table(&cols, vec![row(Some(1.0)), row(None)]);
        let report = analyze(&t, SchemaKind::MonthlyColumns);
        assert_eq!(report.excluded_columns, vec!["Apr-24", "May-24", "Jun-24"]);
        assert_eq!(
            report.messages(),
            vec!["Ingestion data has 2 duplicate rows (same values in all columns except month columns)"]
        );
    }

    #[test]
    fn unknown_schema_checks_every_column() {
        let t = table(
            &["A", "B"],
            vec![
                vec!["x".into(), CellValue::Missing],
                vec!["x".into(), CellValue::Missing],
                vec!["x".into(), 1.0.into()],
            ],
        );
        let report = analyze(&t, SchemaKind::Unknown);
        assert!(report.excluded_columns.is_empty());
        assert_eq!(
            report.messages(),
            vec![
                "Ingestion data has 2 null values in 'B' column",
                "Ingestion data has 2 completely duplicate rows",
            ]
        );
    }

    #[test]
    fn three_copies_form_one_group() {
        let t = table(&["A"], vec![vec!["x".into()], vec!["x".into()], vec!["x".into()]]);
        let report = analyze(&t, SchemaKind::Unknown);
        assert_eq!(report.duplicate_row_count, 3);
        assert_eq!(report.duplicate_group_count, 1);
    }

    #[test]
    fn empty_table_has_no_issues() {
        let t = table(&ROWS_LAYOUT, vec![]);
        let report = analyze(&t, SchemaKind::MonthlyRows);
        assert!(report.issues.is_empty());
        assert!(report.duplicate_rows.is_none());
        assert_eq!(report.duplicate_row_count, 0);
    }

    #[test]
    fn schema_that_does_not_fit_is_an_error() {
        let t = table(&["A", "B"], vec![]);
        let err = analyze_quality(
            &t,
            SchemaKind::MonthlyRows,
            &SchemaRules::default(),
            &ColumnNames::default(),
        )
        .unwrap_err();
        assert_eq!(err, ReconError::SchemaMismatch { expected: SchemaKind::MonthlyRows });
    }
}
