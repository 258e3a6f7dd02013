//! Import orchestration: discovery, table creation and row insertion inside
//! one transaction per run

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::database::{ImportDb, ImportTransaction, RowInserter};
use crate::discovery::{DiscoveredFile, discover_csv_files};
use crate::error::{ImportError, ImportResult};
use crate::naming::derive_table_name;
use crate::reader::{RowReader, read_headers};
use crate::settings::ImportSettings;
use crate::sql::{CreateTable, InsertStatement, StatementError};

/// Lifecycle of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Nothing has been written yet
    Idle,
    /// The transaction is open
    Running,
    /// Every file was imported and committed
    Committed,
    /// A failure rolled everything back
    RolledBack,
}

/// Shared flag for cancelling a run from another thread.
///
/// Checked before each file and before each row.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome for one imported file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub path: PathBuf,
    pub table: String,
    pub columns: usize,
    pub rows: usize,
}

/// Summary of a committed run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ImportReport {
    pub fn files_processed(&self) -> usize {
        self.tables.len()
    }

    pub fn rows_inserted(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let secs = self.duration.as_secs();
        if secs < 60 {
            format!("{}.{:03}s", secs, self.duration.subsec_millis())
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

/// Planned table for one file, computed without touching the database
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub path: PathBuf,
    pub table: String,
    pub headers: Vec<String>,
    /// The CREATE TABLE statement, or why it cannot be built
    pub statement: Result<CreateTable, StatementError>,
}

/// Tables a run would create
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    pub tables: Vec<TablePlan>,
}

impl ImportPlan {
    /// Plans whose statement could not be built
    pub fn problems(&self) -> impl Iterator<Item = &TablePlan> {
        self.tables.iter().filter(|t| t.statement.is_err())
    }
}

/// Where created tables and rows go: a live transaction or a SQL script
trait TableSink {
    fn create_table(&mut self, ddl: &CreateTable) -> Result<(), SinkError>;
    fn insert_row(&mut self, insert: &InsertStatement, values: &[String]) -> Result<(), SinkError>;
}

enum SinkError {
    Database(duckdb::Error),
    Statement(StatementError),
    Output(std::io::Error),
}

impl SinkError {
    /// Attach file context; output failures keep their own category
    fn with_context(self, context: impl FnOnce(String) -> ImportError) -> ImportError {
        match self {
            SinkError::Database(e) => context(e.to_string()),
            SinkError::Statement(e) => context(e.to_string()),
            SinkError::Output(e) => ImportError::Output(e),
        }
    }
}

struct TransactionSink<'a, 'conn> {
    tx: &'a ImportTransaction<'conn>,
    inserter: Option<RowInserter<'a>>,
}

impl TableSink for TransactionSink<'_, '_> {
    fn create_table(&mut self, ddl: &CreateTable) -> Result<(), SinkError> {
        // Release the previous file's statement before creating the next table.
        self.inserter = None;
        self.tx.create_table(ddl).map_err(SinkError::Database)?;
        self.inserter = Some(
            self.tx
                .prepare_insert(&ddl.insert())
                .map_err(SinkError::Database)?,
        );
        Ok(())
    }

    fn insert_row(
        &mut self,
        _insert: &InsertStatement,
        values: &[String],
    ) -> Result<(), SinkError> {
        match self.inserter.as_mut() {
            Some(inserter) => inserter.insert(values).map_err(SinkError::Database),
            None => Err(SinkError::Statement(StatementError::NoColumns)),
        }
    }
}

struct ScriptSink<W: Write> {
    out: W,
}

impl<W: Write> TableSink for ScriptSink<W> {
    fn create_table(&mut self, ddl: &CreateTable) -> Result<(), SinkError> {
        writeln!(self.out, "{};", ddl.to_sql()).map_err(SinkError::Output)
    }

    fn insert_row(
        &mut self,
        insert: &InsertStatement,
        values: &[String],
    ) -> Result<(), SinkError> {
        let sql = insert.to_literal_sql(values).map_err(SinkError::Statement)?;
        writeln!(self.out, "{sql};").map_err(SinkError::Output)
    }
}

/// Imports every CSV file of a directory, one table per file, in a single
/// transaction
pub struct CsvImporter {
    settings: ImportSettings,
    state: RunState,
    cancellation: Option<CancellationToken>,
}

impl CsvImporter {
    pub fn new(settings: ImportSettings) -> Self {
        Self {
            settings,
            state: RunState::Idle,
            cancellation: None,
        }
    }

    /// Honor a cancellation token at file and row boundaries
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Validate the settings and list the files a run would import
    pub fn discover(&self) -> ImportResult<Vec<DiscoveredFile>> {
        self.settings.validate()?;
        discover_csv_files(&self.settings.source_directory, self.settings.recursive)
    }

    /// Run the import against the configured connection target.
    ///
    /// Either every discovered file ends up as a populated table, or the
    /// transaction is rolled back and the first error is returned.
    pub fn run(&mut self) -> ImportResult<ImportReport> {
        let files = self.discover()?;
        let mut db = ImportDb::open(&self.settings.connection_target)?;
        self.run_files(&mut db, &files)
    }

    /// Run the import against an already open database
    pub fn run_with(&mut self, db: &mut ImportDb) -> ImportResult<ImportReport> {
        let files = self.discover()?;
        self.run_files(db, &files)
    }

    fn run_files(
        &mut self,
        db: &mut ImportDb,
        files: &[DiscoveredFile],
    ) -> ImportResult<ImportReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("csv_import", run_id = %run_id).entered();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            source = %self.settings.source_directory.display(),
            target = db.target(),
            files = files.len(),
            "Starting import"
        );

        let tx = db.begin()?;
        self.state = RunState::Running;

        let result = {
            let mut sink = TransactionSink {
                tx: &tx,
                inserter: None,
            };
            self.import_files(&mut sink, files)
        };

        match result {
            Ok(tables) => {
                if let Err(e) = tx.commit() {
                    error!(error = %e, "Commit failed");
                    self.state = RunState::RolledBack;
                    return Err(e);
                }
                self.state = RunState::Committed;

                let report = ImportReport {
                    run_id,
                    started_at,
                    tables,
                    duration: start.elapsed(),
                };
                info!(
                    tables = report.files_processed(),
                    rows = report.rows_inserted(),
                    duration_ms = report.duration.as_millis() as u64,
                    "Import committed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Import failed, rolling back");
                if let Err(rollback_error) = tx.rollback() {
                    warn!(error = %rollback_error, "Rollback failed");
                }
                self.state = RunState::RolledBack;
                Err(e)
            }
        }
    }

    /// Write the run as a SQL script instead of executing it.
    ///
    /// The script is wrapped in one transaction and uses literal values with
    /// single quotes doubled. Validation and the arity check are the same as
    /// for [`CsvImporter::run`].
    pub fn write_sql_script<W: Write>(&self, out: W) -> ImportResult<ImportReport> {
        let files = self.discover()?;
        let started_at = Utc::now();
        let start = Instant::now();

        let mut sink = ScriptSink { out };
        writeln!(sink.out, "BEGIN TRANSACTION;").map_err(ImportError::Output)?;
        let tables = self.import_files(&mut sink, &files)?;
        writeln!(sink.out, "COMMIT;").map_err(ImportError::Output)?;
        sink.out.flush().map_err(ImportError::Output)?;

        Ok(ImportReport {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            tables,
            duration: start.elapsed(),
        })
    }

    /// Write the SQL script to `path`.
    ///
    /// The script goes to a sibling `.partial` file that is renamed into place
    /// once complete, so a failed run never leaves a truncated script behind.
    pub fn write_sql_file(&self, path: &Path) -> ImportResult<ImportReport> {
        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        let file = File::create(&partial).map_err(|e| ImportError::io(&partial, e))?;
        let result = self.write_sql_script(BufWriter::new(file));

        match result {
            Ok(report) => {
                fs::rename(&partial, path).map_err(|e| ImportError::io(path, e))?;
                info!(
                    path = %path.display(),
                    tables = report.files_processed(),
                    "Wrote SQL script"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(remove_error) = fs::remove_file(&partial) {
                    warn!(
                        path = %partial.display(),
                        error = %remove_error,
                        "Cannot remove partial script"
                    );
                }
                Err(e)
            }
        }
    }

    /// Derive table names and DDL for every file without opening a database
    pub fn plan(&self) -> ImportResult<ImportPlan> {
        let files = self.discover()?;
        let mut plan = ImportPlan::default();

        for file in files {
            let table = self.table_name(&file.path);
            let headers = read_headers(&file.path)?;
            let statement = CreateTable::new(&table, &headers);
            plan.tables.push(TablePlan {
                path: file.path,
                table,
                headers,
                statement,
            });
        }

        Ok(plan)
    }

    fn table_name(&self, path: &Path) -> String {
        derive_table_name(
            path,
            &self.settings.source_directory,
            self.settings.include_directory_in_table_name,
        )
    }

    fn check_cancelled(&self) -> ImportResult<()> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(ImportError::Cancelled),
            _ => Ok(()),
        }
    }

    fn import_files<S: TableSink>(
        &self,
        sink: &mut S,
        files: &[DiscoveredFile],
    ) -> ImportResult<Vec<TableReport>> {
        let mut tables = Vec::with_capacity(files.len());
        for file in files {
            self.check_cancelled()?;
            tables.push(self.import_file(sink, file)?);
        }
        Ok(tables)
    }

    fn import_file<S: TableSink>(
        &self,
        sink: &mut S,
        file: &DiscoveredFile,
    ) -> ImportResult<TableReport> {
        let path = &file.path;
        let table = self.table_name(path);
        let schema_error = |reason: String| ImportError::Schema {
            path: path.clone(),
            table: table.clone(),
            reason,
        };

        let headers = read_headers(path)?;
        let ddl = CreateTable::new(&table, &headers).map_err(|e| schema_error(e.to_string()))?;

        debug!(path = %path.display(), sql = %ddl.to_sql(), "Creating table");
        sink.create_table(&ddl).map_err(|e| e.with_context(&schema_error))?;

        let insert = ddl.insert();
        let mut rows = 0;
        for row in RowReader::open(path)? {
            self.check_cancelled()?;
            let row = row?;
            let data_error = |reason: String| ImportError::Data {
                path: path.clone(),
                table: table.clone(),
                line: row.line,
                reason,
            };

            insert
                .check_arity(&row.values)
                .map_err(|e| data_error(e.to_string()))?;
            sink.insert_row(&insert, &row.values)
                .map_err(|e| e.with_context(&data_error))?;
            rows += 1;
        }

        info!(
            path = %path.display(),
            table = %table,
            columns = headers.len(),
            rows,
            bytes = file.size,
            "Imported file"
        );

        Ok(TableReport {
            path: path.clone(),
            table,
            columns: headers.len(),
            rows,
        })
    }
}
