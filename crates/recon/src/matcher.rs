use std::collections::HashMap;

use crate::config::ColumnNames;
use crate::error::ReconError;
use crate::model::{MatchOutcome, MatchRecord, MatchStatus, MatchSummary, SchemaKind};
use crate::table::{CellValue, Table, TableRole};

/// Composite join key: (facility, resource name, month, year).
type RecordKey<'a> = [&'a CellValue; 4];

/// Column positions needed for matching in one table.
struct KeyColumns {
    facility: usize,
    resource_name: usize,
    month: usize,
    year: usize,
    quantity: usize,
}

impl KeyColumns {
    fn resolve(
        table: &Table,
        role: TableRole,
        facility: usize,
        columns: &ColumnNames,
    ) -> Result<Self, ReconError> {
        Ok(Self {
            facility,
            resource_name: table.require_column(role, &columns.resource_name)?,
            month: table.require_column(role, &columns.month)?,
            year: table.require_column(role, &columns.year)?,
            quantity: table.require_column(role, &columns.quantity)?,
        })
    }

    /// None when any key component is missing; such rows never join.
    fn key<'a>(&self, row: &'a [CellValue]) -> Option<RecordKey<'a>> {
        let key = [
            &row[self.facility],
            &row[self.resource_name],
            &row[self.month],
            &row[self.year],
        ];
        if key.iter().any(|v| v.is_missing()) {
            None
        } else {
            Some(key)
        }
    }
}

/// Join ingestion rows to raw rows and compare quantities.
///
/// Only the rows layout has a matching strategy; the columns layout yields
/// `MatchOutcome::NotImplemented` and an unrecognized layout is an error.
pub fn match_records(
    raw: &Table,
    ingestion: &Table,
    schema: SchemaKind,
    columns: &ColumnNames,
) -> Result<MatchOutcome, ReconError> {
    match schema {
        SchemaKind::MonthlyRows => match_monthly_rows(raw, ingestion, columns),
        SchemaKind::MonthlyColumns => Ok(MatchOutcome::NotImplemented {
            schema,
            message: format!("record matching for '{schema}' is not implemented yet"),
        }),
        SchemaKind::Unknown => Err(ReconError::UnknownSchema),
    }
}

fn match_monthly_rows(
    raw: &Table,
    ingestion: &Table,
    columns: &ColumnNames,
) -> Result<MatchOutcome, ReconError> {
    let raw_facility = raw.require_column(TableRole::Raw, &columns.raw_facility)?;
    let raw_cols = KeyColumns::resolve(raw, TableRole::Raw, raw_facility, columns)?;

    let (_, ingestion_facility) =
        ingestion.first_present(TableRole::Ingestion, &columns.ingestion_facility)?;
    let ing_cols = KeyColumns::resolve(ingestion, TableRole::Ingestion, ingestion_facility, columns)?;

    let index = index_raw(raw, &raw_cols);

    let mut summary = MatchSummary {
        total_ingestion_rows: ingestion.row_count(),
        ..MatchSummary::default()
    };
    let mut records = Vec::with_capacity(ingestion.row_count());

    for (row_idx, row) in ingestion.rows().iter().enumerate() {
        let ingestion_quantity = &row[ing_cols.quantity];
        let raw_row = ing_cols.key(row).and_then(|k| index.get(&k)).copied();

        let (raw_quantity, difference, status) = match raw_row {
            None => {
                summary.unmatched_rows += 1;
                (None, None, MatchStatus::NoMatchInRaw)
            }
            Some(raw_idx) => {
                summary.matched_rows += 1;
                let raw_quantity = &raw.rows()[raw_idx][raw_cols.quantity];
                let difference = quantity_difference(
                    (raw_idx, raw_quantity),
                    (row_idx, ingestion_quantity),
                    &columns.quantity,
                )?;
                let status = if difference.is_some() && raw_quantity == ingestion_quantity {
                    summary.quantity_matches += 1;
                    MatchStatus::Match
                } else {
                    summary.quantity_mismatches += 1;
                    MatchStatus::Mismatch
                };
                (Some(raw_quantity.clone()), difference, status)
            }
        };

        records.push(MatchRecord {
            ingestion_row: row_idx,
            facility_name: row[ing_cols.facility].clone(),
            resource_name: row[ing_cols.resource_name].clone(),
            month: row[ing_cols.month].clone(),
            year: row[ing_cols.year].clone(),
            raw_quantity,
            ingestion_quantity: ingestion_quantity.clone(),
            difference,
            status,
        });
    }

    log::info!(
        "matched {}/{} ingestion rows ({} quantity matches, {} mismatches)",
        summary.matched_rows,
        summary.total_ingestion_rows,
        summary.quantity_matches,
        summary.quantity_mismatches,
    );

    Ok(MatchOutcome::Completed {
        schema: SchemaKind::MonthlyRows,
        summary,
        records,
    })
}

/// Key -> first raw row (raw order) carrying it.
fn index_raw<'a>(raw: &'a Table, cols: &KeyColumns) -> HashMap<RecordKey<'a>, usize> {
    let mut index: HashMap<RecordKey<'a>, usize> = HashMap::with_capacity(raw.row_count());
    let mut shadowed = 0usize;
    for (idx, row) in raw.rows().iter().enumerate() {
        if let Some(key) = cols.key(row) {
            if index.contains_key(&key) {
                shadowed += 1;
            } else {
                index.insert(key, idx);
            }
        }
    }
    if shadowed > 0 {
        log::warn!("raw index: {shadowed} row(s) share a key with an earlier row and are ignored");
    }
    log::debug!("raw index: {} distinct key(s) over {} row(s)", index.len(), raw.row_count());
    index
}

/// raw - ingestion. Missing on either side gives no difference; text is an error.
fn quantity_difference(
    (raw_row, raw_value): (usize, &CellValue),
    (ingestion_row, ingestion_value): (usize, &CellValue),
    column: &str,
) -> Result<Option<f64>, ReconError> {
    let not_numeric = |table, row, value: &CellValue| ReconError::TypeConversion {
        table,
        row,
        column: column.to_string(),
        value: value.to_string(),
    };

    match (raw_value, ingestion_value) {
        (CellValue::Text(_), _) => Err(not_numeric(TableRole::Raw, raw_row, raw_value)),
        (_, CellValue::Text(_)) => {
            Err(not_numeric(TableRole::Ingestion, ingestion_row, ingestion_value))
        }
        (CellValue::Number(r), CellValue::Number(i)) => Ok(Some(r.0 - i.0)),
        _ => Ok(None),
    }
}
