//! Relational sink the loader writes into.
//!
//! Statements are built by plain text substitution; identifiers and values are expected to be
//! sanitized and rendered before they get here.

use crate::database::column::ColumnSchema;
use crate::error::LoaderError;
use duckdb::params;
use duckdb::Connection;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Empty identifier in '{0}'")]
    EmptyIdentifier(String),

    #[error("Statement rejected: {0}")]
    Rejected(String),
}

/// Table management and insert operations of the target database.
pub trait Sink {
    fn table_exists(&mut self, schema: &str, table: &str) -> Result<bool, LoaderError>;

    fn create_table(&mut self, schema: &str, table: &str, columns: &ColumnSchema) -> Result<(), LoaderError>;

    fn truncate_table(&mut self, schema: &str, table: &str) -> Result<(), LoaderError>;

    /// Inserts a rendered `VALUES` list, returning the number of inserted rows.
    fn insert_rows(&mut self, schema: &str, table: &str, field_names: &str, values: &str) -> Result<usize, LoaderError>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn table_exists(&mut self, schema: &str, table: &str) -> Result<bool, LoaderError> {
        (**self).table_exists(schema, table)
    }

    fn create_table(&mut self, schema: &str, table: &str, columns: &ColumnSchema) -> Result<(), LoaderError> {
        (**self).create_table(schema, table, columns)
    }

    fn truncate_table(&mut self, schema: &str, table: &str) -> Result<(), LoaderError> {
        (**self).truncate_table(schema, table)
    }

    fn insert_rows(&mut self, schema: &str, table: &str, field_names: &str, values: &str) -> Result<usize, LoaderError> {
        (**self).insert_rows(schema, table, field_names, values)
    }
}

/// `schema.table`, rejecting empty parts.
pub fn qualified_name(schema: &str, table: &str) -> Result<String, DatabaseError> {
    if schema.is_empty() || table.is_empty() {
        return Err(DatabaseError::EmptyIdentifier(format!("{schema}.{table}")));
    }
    Ok(format!("{schema}.{table}"))
}

pub fn create_table_statement(schema: &str, table: &str, columns: &ColumnSchema) -> Result<String, DatabaseError> {
    Ok(format!("CREATE TABLE {} ({})", qualified_name(schema, table)?, columns.definitions()))
}

pub fn truncate_table_statement(schema: &str, table: &str) -> Result<String, DatabaseError> {
    Ok(format!("TRUNCATE TABLE {}", qualified_name(schema, table)?))
}

pub fn insert_statement(schema: &str, table: &str, field_names: &str, values: &str) -> Result<String, DatabaseError> {
    Ok(format!("INSERT INTO {} ({}) VALUES {}", qualified_name(schema, table)?, field_names, values))
}

/// Sink backed by a DuckDB database file or an in-memory database.
pub struct DuckDbSink {
    connection: Connection,
}

impl DuckDbSink {
    /// Opens a database file, or an in-memory database when no path is given.
    pub fn open(path: Option<&Path>) -> Result<DuckDbSink, LoaderError> {
        let connection = match path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Ok(DuckDbSink { connection })
    }

    pub fn new(connection: Connection) -> Self {
        DuckDbSink { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Sink for DuckDbSink {
    fn table_exists(&mut self, schema: &str, table: &str) -> Result<bool, LoaderError> {
        let count: i64 = self.connection.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?)",
            [schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_table(&mut self, schema: &str, table: &str, columns: &ColumnSchema) -> Result<(), LoaderError> {
        let statement = create_table_statement(schema, table, columns)?;
        debug!(%statement, "creating table");
        self.connection.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}; {statement}"))?;
        Ok(())
    }

    fn truncate_table(&mut self, schema: &str, table: &str) -> Result<(), LoaderError> {
        let statement = truncate_table_statement(schema, table)?;
        debug!(%statement, "truncating table");
        self.connection.execute_batch(&statement)?;
        Ok(())
    }

    fn insert_rows(&mut self, schema: &str, table: &str, field_names: &str, values: &str) -> Result<usize, LoaderError> {
        let statement = insert_statement(schema, table, field_names, values)?;
        debug!(table = %table, bytes = statement.len(), "inserting rows");
        Ok(self.connection.execute(&statement, params![])?)
    }
}
