// File I/O: spreadsheet tables in, spreadsheet reports out

pub mod export;
pub mod roles;
pub mod xlsx;

pub use export::{duplicate_rows_xlsx, match_records_xlsx, missing_facilities_xlsx};
pub use roles::{identify_roles, select_raw_sheet, RoleAssignment};
pub use xlsx::{
    import_sheet, import_sheet_from_bytes, list_sheets, read_table, read_table_from_bytes,
    ImportResult,
};
