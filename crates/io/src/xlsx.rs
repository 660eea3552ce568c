// Spreadsheet import (xlsx, xlsm, xlsb, xls, ods) into comparison tables.
//
// The first row of the used range is the header; every later row is data.
// Cells decode to text, number or missing. Nothing here knows about
// facilities or schemas.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use ingestcheck_recon::table::format_number;
use ingestcheck_recon::{CellValue, Table};
use serde::Serialize;

/// Import stops after this many cells; the rest of the sheet is dropped.
const MAX_CELLS: usize = 5_000_000;

/// What one sheet import kept and what it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub sheet: String,
    pub rows_imported: usize,
    pub blank_rows_skipped: usize,
    /// Non-blank data rows past the cell limit that were not imported.
    pub truncated_rows: usize,
}

impl ImportResult {
    pub fn truncated(&self) -> bool {
        self.truncated_rows > 0
    }

    /// Human-readable note for a truncated import.
    pub fn warning(&self) -> Option<String> {
        self.truncated().then(|| {
            format!(
                "sheet '{}' truncated: {} data rows imported, {} dropped at the {} cell limit",
                self.sheet, self.rows_imported, self.truncated_rows, MAX_CELLS
            )
        })
    }
}

/// Read one sheet (the first when `sheet` is None) of a workbook on disk.
pub fn import_sheet(path: &Path, sheet: Option<&str>) -> Result<(Table, ImportResult), String> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    log::debug!("reading {}", path.display());
    table_from_workbook(workbook, sheet, MAX_CELLS)
}

/// Same as [`import_sheet`] for an in-memory workbook.
pub fn import_sheet_from_bytes(
    bytes: &[u8],
    sheet: Option<&str>,
) -> Result<(Table, ImportResult), String> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open workbook: {}", e))?;
    table_from_workbook(workbook, sheet, MAX_CELLS)
}

/// [`import_sheet`] without the import details.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    import_sheet(path, sheet).map(|(table, _)| table)
}

/// [`import_sheet_from_bytes`] without the import details.
pub fn read_table_from_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<Table, String> {
    import_sheet_from_bytes(bytes, sheet).map(|(table, _)| table)
}

/// Sheet names in workbook order.
pub fn list_sheets(path: &Path) -> Result<Vec<String>, String> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    Ok(workbook.sheet_names().to_vec())
}

fn table_from_workbook<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    sheet: Option<&str>,
    max_cells: usize,
) -> Result<(Table, ImportResult), String> {
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(format!(
                    "Sheet '{}' not found (available: {})",
                    name,
                    sheet_names.join(", ")
                ));
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Workbook contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let mut result = ImportResult { sheet: sheet_name.clone(), ..Default::default() };

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        log::debug!("sheet '{}' is empty", sheet_name);
        let table = Table::new(Vec::new(), Vec::new()).map_err(|e| e.to_string())?;
        return Ok((table, result));
    };
    let columns = header_names(header_row);
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cells = 0usize;
    for row in rows_iter.by_ref() {
        let values: Vec<CellValue> = row.iter().map(decode_cell).collect();
        if values.iter().all(CellValue::is_missing) {
            result.blank_rows_skipped += 1;
            continue;
        }
        if cells + width > max_cells {
            result.truncated_rows = 1;
            break;
        }
        cells += width;
        rows.push(values);
    }
    if result.truncated() {
        result.truncated_rows += rows_iter.filter(|row| !is_blank_row(row)).count();
    }
    result.rows_imported = rows.len();

    if let Some(warning) = result.warning() {
        log::warn!("{warning}");
    }
    log::info!(
        "sheet '{}': {} columns, {} data rows ({} blank rows skipped)",
        sheet_name,
        width,
        result.rows_imported,
        result.blank_rows_skipped
    );
    let table =
        Table::new(columns, rows).map_err(|e| format!("Sheet '{}': {}", sheet_name, e))?;
    Ok((table, result))
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| decode_cell(cell).is_missing())
}

/// Decode one cell. Empty strings and error cells are missing; dates keep
/// their serial number.
fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Missing,
        Data::String(s) if s.is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(n) => CellValue::number(*n),
        Data::Int(n) => CellValue::number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => CellValue::number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Header cells as unique column names. Blank headers become `Unnamed: {i}`,
/// repeats get a `.1`, `.2`, ... suffix.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(row.len());
    let mut names = Vec::with_capacity(row.len());
    for (idx, cell) in row.iter().enumerate() {
        let base = match decode_cell(cell) {
            CellValue::Missing => format!("Unnamed: {idx}"),
            CellValue::Number(n) => format_number(n.0),
            CellValue::Text(s) => s,
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}
