//! `ingestcheck-recon`: compares a raw data table against the table an
//! ingestion pipeline produced from it.
//!
//! Pure engine crate: receives decoded tables, returns a report.
//! No CLI or IO dependencies.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod facility;
pub mod matcher;
pub mod model;
pub mod quality;
pub mod table;

pub use classify::{classify_resource, classify_schema, SchemaRules};
pub use config::ComparisonConfig;
pub use engine::generate_report;
pub use error::ReconError;
pub use facility::compare_facilities;
pub use matcher::match_records;
pub use model::{ComparisonReport, MatchOutcome, ResourceKind, SchemaKind, Section};
pub use quality::analyze_quality;
pub use table::{CellValue, Table, TableRole};
