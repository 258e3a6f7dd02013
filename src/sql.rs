//! CREATE TABLE and INSERT statement generation.
//!
//! # Security
//!
//! Identifiers are validated against the allow-list in [`crate::validation`]
//! and then quoted. Values are executed as bound parameters; the literal
//! rendering used for SQL scripts doubles single quotes.

use thiserror::Error;

use crate::validation::{IdentifierError, quote_identifier, quote_literal, validate_identifier};

/// Column type used for every imported column (unbounded text)
pub const TEXT_COLUMN_TYPE: &str = "VARCHAR";

/// Errors raised while building a statement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("no columns: the header line is empty")]
    NoColumns,

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("expected {expected} values, found {found}")]
    Arity { expected: usize, found: usize },
}

/// A validated CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    table: String,
    columns: Vec<String>,
}

impl CreateTable {
    /// Build the statement for a table whose columns are the file's headers
    pub fn new(table: &str, headers: &[String]) -> Result<Self, StatementError> {
        validate_identifier("table name", table)?;
        if headers.is_empty() {
            return Err(StatementError::NoColumns);
        }
        for header in headers {
            validate_identifier("column name", header)?;
        }

        Ok(Self {
            table: table.to_string(),
            columns: headers.to_vec(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Render the statement, without a trailing semicolon.
    ///
    /// ```
    /// use csv_table_importer::sql::CreateTable;
    ///
    /// let ddl = CreateTable::new("sales", &["id".to_string(), "unit price".to_string()]).unwrap();
    /// assert_eq!(
    ///     ddl.to_sql(),
    ///     r#"CREATE TABLE "sales" ("id" VARCHAR, "unit price" VARCHAR)"#
    /// );
    /// ```
    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {TEXT_COLUMN_TYPE}", quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({columns})", quote_identifier(&self.table))
    }

    /// The matching single-row insert for this table
    pub fn insert(&self) -> InsertStatement {
        InsertStatement {
            table: self.table.clone(),
            column_count: self.columns.len(),
        }
    }
}

/// Single-row INSERT for a table created by [`CreateTable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    column_count: usize,
}

impl InsertStatement {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Reject rows whose field count differs from the column count
    pub fn check_arity(&self, values: &[String]) -> Result<(), StatementError> {
        if values.len() != self.column_count {
            return Err(StatementError::Arity {
                expected: self.column_count,
                found: values.len(),
            });
        }
        Ok(())
    }

    /// Parameterised form, one `?` per column
    pub fn to_prepared_sql(&self) -> String {
        let placeholders = vec!["?"; self.column_count].join(", ");
        format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_identifier(&self.table)
        )
    }

    /// Literal form with every value quoted, without a trailing semicolon
    pub fn to_literal_sql(&self, values: &[String]) -> Result<String, StatementError> {
        self.check_arity(values)?;
        let literals = values
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "INSERT INTO {} VALUES ({literals})",
            quote_identifier(&self.table)
        ))
    }
}
