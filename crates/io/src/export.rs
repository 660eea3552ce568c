// Downloadable xlsx reports, built in memory.
//
// Each function writes one sheet: a formatted header row, then one row per
// entry. Numbers stay numbers, missing cells stay blank.

use ingestcheck_recon::model::MatchRecord;
use ingestcheck_recon::{CellValue, Table};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

const MISSING_FACILITIES_FILL: u32 = 0xD7E4BC;
const DUPLICATE_ROWS_FILL: u32 = 0xFFE6E6;
const COMPARISON_FILL: u32 = 0xDDEBF7;

pub const MISSING_FACILITY_STATUS: &str = "Not Found in Raw Data";

fn header_format(fill: u32) -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(fill))
        .set_border(FormatBorder::Thin)
}

fn xlsx_err(e: XlsxError) -> String {
    format!("Failed to build XLSX: {}", e)
}

fn write_header(worksheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<(), XlsxError> {
    match value {
        CellValue::Missing => {}
        CellValue::Number(n) => {
            worksheet.write_number(row, col, n.0)?;
        }
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Sheet `Missing Facilities`: one row per facility absent from raw data.
pub fn missing_facilities_xlsx(facilities: &[String]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name("Missing Facilities")
        .map_err(xlsx_err)?;

    write_header(
        worksheet,
        &["Missing Facilities", "Status"],
        &header_format(MISSING_FACILITIES_FILL),
    )
    .map_err(xlsx_err)?;

    for (i, facility) in facilities.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, facility).map_err(xlsx_err)?;
        worksheet
            .write_string(row, 1, MISSING_FACILITY_STATUS)
            .map_err(xlsx_err)?;
    }

    worksheet.set_column_width(0, 30).map_err(xlsx_err)?;
    worksheet.set_column_width(1, 20).map_err(xlsx_err)?;

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Sheet `Duplicate Rows`: the table as-is under its own column names.
pub fn duplicate_rows_xlsx(table: &Table) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name("Duplicate Rows")
        .map_err(xlsx_err)?;

    let headers: Vec<&str> = table.columns().iter().map(String::as_str).collect();
    write_header(worksheet, &headers, &header_format(DUPLICATE_ROWS_FILL)).map_err(xlsx_err)?;

    for (i, row) in table.rows().iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            write_cell(worksheet, i as u32 + 1, col as u16, value).map_err(xlsx_err)?;
        }
    }
    for col in 0..table.column_count() {
        worksheet.set_column_width(col as u16, 20).map_err(xlsx_err)?;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

pub const COMPARISON_HEADERS: [&str; 8] = [
    "Facility Name",
    "Resource Name",
    "Month",
    "Year",
    "Raw Quantity",
    "Ingestion Quantity",
    "Difference",
    "Match Status",
];

/// Sheet `Comparison Results`: one row per matched ingestion record.
pub fn match_records_xlsx(records: &[MatchRecord]) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name("Comparison Results")
        .map_err(xlsx_err)?;

    write_header(worksheet, &COMPARISON_HEADERS, &header_format(COMPARISON_FILL)).map_err(xlsx_err)?;

    let blank = CellValue::Missing;
    for (i, rec) in records.iter().enumerate() {
        let row = i as u32 + 1;
        let cells = [
            &rec.facility_name,
            &rec.resource_name,
            &rec.month,
            &rec.year,
            rec.raw_quantity.as_ref().unwrap_or(&blank),
            &rec.ingestion_quantity,
        ];
        for (col, value) in cells.into_iter().enumerate() {
            write_cell(worksheet, row, col as u16, value).map_err(xlsx_err)?;
        }
        if let Some(diff) = rec.difference {
            worksheet.write_number(row, 6, diff).map_err(xlsx_err)?;
        }
        worksheet
            .write_string(row, 7, rec.status.label())
            .map_err(xlsx_err)?;
    }

    for col in 0..COMPARISON_HEADERS.len() {
        worksheet.set_column_width(col as u16, 20).map_err(xlsx_err)?;
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
