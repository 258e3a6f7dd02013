//! DuckDB connection and transaction handling for imports

use duckdb::{Connection, Statement, Transaction, params_from_iter};

use crate::error::ImportResult;
use crate::settings::IN_MEMORY_TARGET;
use crate::sql::{CreateTable, InsertStatement};
use crate::validation::quote_identifier;

/// Target database for an import run
pub struct ImportDb {
    conn: Connection,
    target: String,
}

impl ImportDb {
    /// Open the database named by a connection target.
    ///
    /// `:memory:` opens an in-memory database, anything else is a file path.
    pub fn open(target: &str) -> ImportResult<Self> {
        let conn = if target == IN_MEMORY_TARGET {
            Connection::open_in_memory()?
        } else {
            Connection::open(target)?
        };
        Ok(Self {
            conn,
            target: target.to_string(),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn memory() -> ImportResult<Self> {
        Self::open(IN_MEMORY_TARGET)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Begin the transaction that spans a run.
    ///
    /// Dropping the returned transaction without committing rolls it back.
    pub fn begin(&mut self) -> ImportResult<ImportTransaction<'_>> {
        Ok(ImportTransaction {
            tx: self.conn.transaction()?,
        })
    }

    /// Names of the tables in the main schema, sorted
    pub fn table_names(&self) -> ImportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = 'main'
             ORDER BY table_name",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Column names and types of a table, in declaration order
    pub fn columns(&self, table: &str) -> ImportResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_schema = 'main' AND table_name = ?1
             ORDER BY ordinal_position",
        )?;
        let rows = stmt.query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &str) -> ImportResult<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All rows of a table as text, in insertion order
    pub fn fetch_rows(&self, table: &str) -> ImportResult<Vec<Vec<String>>> {
        let column_count = self.columns(table)?.len();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_identifier(table)))?;
        let mut rows = stmt.query([])?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Option<String>>(i)?.unwrap_or_default());
            }
            result.push(values);
        }
        Ok(result)
    }
}

/// The single transaction of an import run
pub struct ImportTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> ImportTransaction<'conn> {
    /// Execute a CREATE TABLE statement
    pub fn create_table(&self, ddl: &CreateTable) -> Result<(), duckdb::Error> {
        self.tx.execute_batch(&ddl.to_sql())
    }

    /// Prepare the insert for one table
    pub fn prepare_insert(
        &self,
        insert: &InsertStatement,
    ) -> Result<RowInserter<'_>, duckdb::Error> {
        let stmt = self.tx.prepare(&insert.to_prepared_sql())?;
        Ok(RowInserter { stmt })
    }

    pub fn commit(self) -> ImportResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> ImportResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

/// Prepared single-row insert, reused for every row of a file
pub struct RowInserter<'tx> {
    stmt: Statement<'tx>,
}

impl RowInserter<'_> {
    /// Insert one row, one round trip per call
    pub fn insert(&mut self, values: &[String]) -> Result<(), duckdb::Error> {
        self.stmt.execute(params_from_iter(values.iter()))?;
        Ok(())
    }
}
