use std::collections::BTreeSet;

use crate::config::ColumnNames;
use crate::error::ReconError;
use crate::model::FacilityComparison;
use crate::table::{CellValue, Table, TableRole};

/// Compare facility identifiers between raw and ingestion.
///
/// Raw must carry `columns.raw_facility`; ingestion may use any of
/// `columns.ingestion_facility` (first present wins). Missing cells are
/// dropped, duplicates collapse. Identifiers compare exactly: no trimming,
/// no case folding, and text `1001` is not the number 1001. Listed names are
/// rendered only after the set split, in cell order (numbers before text).
pub fn compare_facilities(
    raw: &Table,
    ingestion: &Table,
    columns: &ColumnNames,
) -> Result<FacilityComparison, ReconError> {
    let raw_idx = raw.require_column(TableRole::Raw, &columns.raw_facility)?;
    let (ingestion_column, ingestion_idx) =
        ingestion.first_present(TableRole::Ingestion, &columns.ingestion_facility)?;
    log::debug!("facility columns: raw '{}', ingestion '{}'", columns.raw_facility, ingestion_column);

    let raw_set = facility_set(raw, raw_idx);
    let ingestion_set = facility_set(ingestion, ingestion_idx);

    let missing_in_raw: Vec<String> =
        ingestion_set.difference(&raw_set).map(|v| v.to_string()).collect();
    let missing_in_ingestion: Vec<String> =
        raw_set.difference(&ingestion_set).map(|v| v.to_string()).collect();
    let common = raw_set.intersection(&ingestion_set).count();

    Ok(FacilityComparison {
        ingestion_column: ingestion_column.to_string(),
        raw_facilities_count: raw_set.len(),
        ingestion_facilities_count: ingestion_set.len(),
        common_facilities_count: common,
        missing_in_raw_count: missing_in_raw.len(),
        missing_in_ingestion_count: missing_in_ingestion.len(),
        missing_in_raw,
        missing_in_ingestion,
    })
}

fn facility_set(table: &Table, idx: usize) -> BTreeSet<&CellValue> {
    table.column_values(idx).filter(|v| !v.is_missing()).collect()
}
