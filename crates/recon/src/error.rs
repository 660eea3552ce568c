use std::fmt;

use serde::Serialize;

use crate::model::SchemaKind;
use crate::table::TableRole;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// A required column is absent.
    MissingColumn { table: TableRole, column: String },
    /// None of several alternative columns is present.
    MissingAnyColumn { table: TableRole, columns: Vec<String> },
    /// Two columns share a name, so lookups by name would be ambiguous.
    DuplicateColumn { column: String },
    /// A row does not have one cell per column.
    RaggedRow { row: usize, expected: usize, found: usize },
    /// Caller passed a recognized schema the table does not satisfy.
    SchemaMismatch { expected: SchemaKind },
    /// Record matching requested for a table whose layout was not recognized.
    UnknownSchema,
    /// A quantity that must be subtracted is not a number.
    TypeConversion { table: TableRole, row: usize, column: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty alias list, bad month window, ...).
    ConfigValidation(String),
}

/// Coarse error category carried into report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Schema,
    InvalidTable,
    TypeConversion,
    Config,
}

impl ReconError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingColumn { .. }
            | Self::MissingAnyColumn { .. }
            | Self::SchemaMismatch { .. }
            | Self::UnknownSchema => ErrorKind::Schema,
            Self::DuplicateColumn { .. } | Self::RaggedRow { .. } => ErrorKind::InvalidTable,
            Self::TypeConversion { .. } => ErrorKind::TypeConversion,
            Self::ConfigParse(_) | Self::ConfigValidation(_) => ErrorKind::Config,
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { table, column } => {
                write!(f, "{column} column not found in {table} file")
            }
            Self::MissingAnyColumn { table, columns } => {
                let names: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
                write!(f, "none of the columns {} found in {table} file", names.join(", "))
            }
            Self::DuplicateColumn { column } => write!(f, "duplicate column name '{column}'"),
            Self::RaggedRow { row, expected, found } => {
                write!(f, "row {row} has {found} cell(s), expected {expected}")
            }
            Self::SchemaMismatch { expected } => {
                write!(f, "ingestion table does not have the '{expected}' layout")
            }
            Self::UnknownSchema => write!(f, "unknown ingestion file type"),
            Self::TypeConversion { table, row, column, value } => {
                write!(f, "{table} row {row}: '{column}' value '{value}' is not numeric")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
