//! Result containers returned by the execution modes.
//!
//! - [`PlainResult`]: counters only, from [`Connection::execute`]
//! - [`RowSet`]: every row materialized, from [`Connection::query_set`]
//! - [`RowReader`]: an open cursor, from [`Connection::query_reader`]
//!
//! A `RowSet` no longer depends on its connection. A `RowReader` holds the
//! connection's mutable borrow until it is dropped, so no other statement can
//! be issued while its cursor is open.

use std::sync::Arc;

use sqlsession_core::{
    ColumnInfo, Error, FieldMetadata, NativeFailure, NativeSession, QueryError, Result, Row,
};

use crate::connection::Connection;
use crate::mapper;

/// Counters reported by the native layer after a successful statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainResult {
    rows_affected: u64,
    insert_id: u64,
    connection_id: u64,
}

impl PlainResult {
    pub(crate) fn new(rows_affected: u64, insert_id: u64, connection_id: u64) -> Self {
        Self {
            rows_affected,
            insert_id,
            connection_id,
        }
    }

    /// Rows changed by the statement, or rows returned for a buffered query.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Identifier generated by the statement, 0 when none was.
    pub fn insert_id(&self) -> u64 {
        self.insert_id
    }

    /// Session identifier of the connection that produced this result.
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

/// A fully materialized result.
#[derive(Debug, Clone)]
pub struct RowSet {
    result: PlainResult,
    rows: Vec<Row>,
    fields: Option<FieldMetadata>,
}

impl RowSet {
    pub(crate) fn new(result: PlainResult, rows: Vec<Row>, fields: Option<FieldMetadata>) -> Self {
        Self {
            result,
            rows,
            fields,
        }
    }

    pub fn result(&self) -> &PlainResult {
        &self.result
    }

    pub fn rows_affected(&self) -> u64 {
        self.result.rows_affected
    }

    pub fn insert_id(&self) -> u64 {
        self.result.insert_id
    }

    /// Column descriptors, when requested and the statement produced columns.
    pub fn fields(&self) -> Option<&FieldMetadata> {
        self.fields.as_ref()
    }

    /// Rows in server order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A streaming result bound to an open native cursor.
///
/// Rows are pulled one at a time with [`next_row`](RowReader::next_row) (or
/// through `Iterator`). Each pull blocks until the server delivers a row, the
/// cursor is exhausted, or the native layer fails. The cursor is released on
/// exhaustion, on error, on [`close`](RowReader::close), or on drop.
pub struct RowReader<'conn, S: NativeSession> {
    conn: &'conn mut Connection<S>,
    cursor: Option<S::Cursor>,
    sql: String,
    result: PlainResult,
    fields: Option<FieldMetadata>,
    columns: Arc<ColumnInfo>,
    max_rows: usize,
    rows_read: usize,
}

impl<'conn, S: NativeSession> RowReader<'conn, S> {
    pub(crate) fn new(
        conn: &'conn mut Connection<S>,
        cursor: Option<S::Cursor>,
        sql: &str,
        result: PlainResult,
        fields: Option<FieldMetadata>,
        max_rows: usize,
    ) -> Self {
        let columns = Arc::new(column_info(fields.as_ref()));
        Self {
            conn,
            cursor,
            sql: sql.to_string(),
            result,
            fields,
            columns,
            max_rows,
            rows_read: 0,
        }
    }

    /// Pull the next row; `Ok(None)` once the rows are exhausted.
    ///
    /// After exhaustion, an error, or `close`, every further call returns
    /// `Ok(None)` without reaching the native layer.
    #[allow(clippy::result_large_err)]
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };

        match self.conn.session_mut().fetch_row(cursor) {
            Ok(Some(values)) => {
                if self.max_rows > 0 && self.rows_read >= self.max_rows {
                    tracing::warn!(
                        limit = self.max_rows,
                        sql = %self.sql,
                        "streaming result exceeded row limit"
                    );
                    self.release();
                    return Err(Error::Query(QueryError::row_limit_exceeded(
                        self.max_rows,
                        self.sql.as_str(),
                    )));
                }
                self.rows_read += 1;
                tracing::trace!(row = self.rows_read, "fetched row");
                Ok(Some(Row::with_columns(Arc::clone(&self.columns), values)))
            }
            Ok(None) => {
                tracing::debug!(rows = self.rows_read, "streaming result exhausted");
                self.release();
                Ok(None)
            }
            Err(NativeFailure) => {
                let err = mapper::statement_error(self.conn.session(), &self.sql);
                self.release();
                Err(err)
            }
        }
    }

    /// Release the cursor early. Safe to call more than once.
    pub fn close(&mut self) {
        self.release();
    }

    /// Has the cursor been released?
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn result(&self) -> &PlainResult {
        &self.result
    }

    pub fn rows_affected(&self) -> u64 {
        self.result.rows_affected
    }

    pub fn insert_id(&self) -> u64 {
        self.result.insert_id
    }

    /// Column descriptors, available before the first row is pulled.
    pub fn fields(&self) -> Option<&FieldMetadata> {
        self.fields.as_ref()
    }

    /// Rows returned so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn release(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.conn.session_mut().close_cursor(cursor);
        }
    }
}

impl<S: NativeSession> Iterator for RowReader<'_, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<S: NativeSession> Drop for RowReader<'_, S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S: NativeSession> std::fmt::Debug for RowReader<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("sql", &self.sql)
            .field("result", &self.result)
            .field("fields", &self.fields)
            .field("rows_read", &self.rows_read)
            .field("open", &self.cursor.is_some())
            .finish_non_exhaustive()
    }
}

/// Row-level column names; empty when metadata was not requested.
pub(crate) fn column_info(fields: Option<&FieldMetadata>) -> ColumnInfo {
    fields.map_or_else(ColumnInfo::default, |f| ColumnInfo::new(f.names()))
}
