//! CSV Table Importer - load a directory of CSV files into a database
//!
//! Provides:
//! - File discovery (top-level or recursive)
//! - Table name derivation from file paths
//! - Header-driven CREATE TABLE generation with all-text columns
//! - Row insertion through prepared statements
//! - A single transaction per run: every table is imported, or none is

pub mod database;
pub mod discovery;
pub mod error;
pub mod importer;
pub mod naming;
pub mod reader;
pub mod settings;
pub mod sql;
pub mod validation;

// Re-export commonly used types
pub use database::{ImportDb, ImportTransaction};
pub use discovery::{DiscoveredFile, discover_csv_files};
pub use error::{ErrorCategory, ImportError, ImportResult};
pub use importer::{
    CancellationToken, CsvImporter, ImportPlan, ImportReport, RunState, TablePlan, TableReport,
};
pub use naming::{MAX_IDENTIFIER_LENGTH, derive_table_name};
pub use reader::{Row, RowReader, read_headers};
pub use settings::{ImportSettings, ImportSettingsBuilder};
pub use sql::{CreateTable, InsertStatement, StatementError};

/// Run an import with the given settings.
///
/// Shorthand for `CsvImporter::new(settings).run()`.
pub fn run_import(settings: ImportSettings) -> ImportResult<ImportReport> {
    CsvImporter::new(settings).run()
}
