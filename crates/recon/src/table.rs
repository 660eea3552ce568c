use std::collections::HashSet;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single decoded cell.
///
/// Equality is exact and type-sensitive: `Text("10")` never equals
/// `Number(10.0)`. `Missing` equals `Missing`, which is what duplicate
/// grouping wants; joins and facility sets skip missing values explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Missing,
    Number(OrderedFloat<f64>),
    Text(String),
}

impl CellValue {
    pub fn number(n: f64) -> Self {
        Self::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n.0),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number(n) => f.write_str(&format_number(n.0)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Integers without decimals, everything else as-is.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Which side of the comparison a table plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Raw,
    Ingestion,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw data"),
            Self::Ingestion => write!(f, "ingestion"),
        }
    }
}

/// Named columns over rows of cells. Always rectangular, column names unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, ReconError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ReconError::DuplicateColumn { column: name.clone() });
            }
        }

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ReconError::RaggedRow {
                    row: idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a `MissingColumn` error attributed to `role`.
    pub fn require_column(&self, role: TableRole, name: &str) -> Result<usize, ReconError> {
        self.column_index(name).ok_or_else(|| ReconError::MissingColumn {
            table: role,
            column: name.to_string(),
        })
    }

    /// First of `candidates` present in the table, in preference order.
    pub fn first_present<'a>(
        &self,
        role: TableRole,
        candidates: &'a [String],
    ) -> Result<(&'a str, usize), ReconError> {
        candidates
            .iter()
            .find_map(|c| self.column_index(c).map(|idx| (c.as_str(), idx)))
            .ok_or_else(|| ReconError::MissingAnyColumn {
                table: role,
                columns: candidates.to_vec(),
            })
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// New table with the same columns holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
