//! Connection lifecycle and statement execution.
//!
//! A [`Connection`] owns exactly one native session. It is created only by a
//! successful connect, moves from open to closed exactly once, and refuses
//! every statement after that without touching the native handle again.
//!
//! All three execution modes share one guarded path:
//!
//! 1. fail with the "connection closed" error if closed
//! 2. run the statement through the native execute primitive
//! 3. map a failure signal into a structured error carrying the statement
//! 4. read the affected-row and insert-id counters into a [`PlainResult`]
//!
//! Query modes then check the column count, the optional row ceiling and
//! the optional field metadata before either draining the cursor
//! ([`Connection::query_set`]) or handing it to the caller
//! ([`Connection::query_reader`]).

use std::fmt;
use std::sync::Arc;

use sqlsession_core::{
    ConnectionError, Error, FieldMetadata, NativeFailure, NativeSession, QueryError, Result,
    ResultMode, Row, SessionParameters,
};

use crate::mapper;
use crate::result::{PlainResult, RowReader, RowSet, column_info};

/// A session with a database server.
///
/// Not safe for overlapping use: every execution call takes `&mut self`, and
/// a [`RowReader`] keeps the connection borrowed until its cursor is gone.
pub struct Connection<S: NativeSession> {
    session: S,
    closed: bool,
}

/// Outcome of query dispatch.
enum Dispatch<C> {
    /// The statement produced no columns; its cursor is already released.
    NoRows(PlainResult),
    /// The statement produced columns and its cursor is still open.
    Rows {
        cursor: C,
        result: PlainResult,
        fields: Option<FieldMetadata>,
    },
}

impl<S: NativeSession> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<S: NativeSession + Default> Connection<S> {
    /// Connect using a fresh native session.
    #[allow(clippy::result_large_err)]
    pub fn connect(params: &SessionParameters) -> Result<Self> {
        Self::connect_with(S::default(), params)
    }
}

impl<S: NativeSession> Connection<S> {
    /// Connect using the given, not yet connected, native session.
    ///
    /// On failure the session is closed before the error is returned, so no
    /// partially built handle survives.
    #[allow(clippy::result_large_err)]
    pub fn connect_with(mut session: S, params: &SessionParameters) -> Result<Self> {
        S::library_init();

        tracing::debug!(
            host = %params.host,
            port = params.port,
            user = %params.user,
            database = %params.database,
            socket = ?params.unix_socket,
            flags = params.flags,
            "connecting"
        );

        if session.connect(params).is_err() {
            let err = mapper::connect_error(&session);
            tracing::warn!(
                host = %params.host,
                port = params.port,
                code = err.code(),
                error = %err,
                "connect failed"
            );
            session.close();
            return Err(err);
        }

        let conn = Self {
            session,
            closed: false,
        };
        tracing::info!(session_id = conn.session.session_id(), "session established");
        Ok(conn)
    }

    /// Server-assigned identifier of this session; 0 once closed.
    pub fn id(&self) -> u64 {
        if self.closed {
            0
        } else {
            self.session.session_id()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the native session. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!(session_id = self.session.session_id(), "closing session");
        self.session.close();
        self.closed = true;
    }

    /// Run a statement that is not expected to return rows.
    #[allow(clippy::result_large_err)]
    pub fn execute(&mut self, sql: &str) -> Result<PlainResult> {
        let (cursor, result) = self.run(sql, ResultMode::None)?;
        self.session.close_cursor(cursor);
        Ok(result)
    }

    /// Run a query and materialize every row before returning.
    ///
    /// `max_rows > 0` fails the query with a row-limit error instead of
    /// returning more than `max_rows` rows. `want_fields` requests column
    /// descriptors. The connection is free for the next statement as soon as
    /// this returns.
    #[allow(clippy::result_large_err)]
    pub fn query_set(&mut self, sql: &str, max_rows: usize, want_fields: bool) -> Result<RowSet> {
        let (mut cursor, result, fields) =
            match self.query(sql, ResultMode::Buffered, max_rows, want_fields)? {
                Dispatch::NoRows(result) => return Ok(RowSet::new(result, Vec::new(), None)),
                Dispatch::Rows {
                    cursor,
                    result,
                    fields,
                } => (cursor, result, fields),
            };
        let columns = Arc::new(column_info(fields.as_ref()));
        let mut rows = Vec::new();

        loop {
            match self.session.fetch_row(&mut cursor) {
                Ok(Some(values)) => {
                    if max_rows > 0 && rows.len() >= max_rows {
                        self.session.close_cursor(cursor);
                        tracing::warn!(limit = max_rows, sql, "buffered result exceeded row limit");
                        return Err(Error::Query(QueryError::row_limit_exceeded(max_rows, sql)));
                    }
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                Ok(None) => break,
                Err(NativeFailure) => {
                    let err = mapper::statement_error(&self.session, sql);
                    self.session.close_cursor(cursor);
                    return Err(err);
                }
            }
        }

        self.session.close_cursor(cursor);
        tracing::debug!(rows = rows.len(), "buffered result complete");
        Ok(RowSet::new(result, rows, fields))
    }

    /// Run a query and return an open cursor over its rows.
    ///
    /// The returned reader borrows the connection until it is dropped; drain
    /// it or [`close`](RowReader::close) it to release the cursor early.
    /// `max_rows` and `want_fields` behave as in [`Connection::query_set`].
    #[allow(clippy::result_large_err)]
    pub fn query_reader(
        &mut self,
        sql: &str,
        max_rows: usize,
        want_fields: bool,
    ) -> Result<RowReader<'_, S>> {
        match self.query(sql, ResultMode::Streaming, max_rows, want_fields)? {
            Dispatch::NoRows(result) => Ok(RowReader::new(self, None, sql, result, None, max_rows)),
            Dispatch::Rows {
                cursor,
                result,
                fields,
            } => Ok(RowReader::new(
                self,
                Some(cursor),
                sql,
                result,
                fields,
                max_rows,
            )),
        }
    }

    pub(crate) fn session(&self) -> &S {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Query dispatch shared by the buffered and streaming modes.
    ///
    /// On error the cursor has already been released.
    #[allow(clippy::result_large_err)]
    fn query(
        &mut self,
        sql: &str,
        mode: ResultMode,
        max_rows: usize,
        want_fields: bool,
    ) -> Result<Dispatch<S::Cursor>> {
        let (cursor, result) = self.run(sql, mode)?;

        let field_count = self.session.field_count(&cursor);
        if field_count == 0 {
            self.session.close_cursor(cursor);
            return Ok(Dispatch::NoRows(result));
        }

        if max_rows > 0 && result.rows_affected() > max_rows as u64 {
            self.session.close_cursor(cursor);
            tracing::warn!(
                limit = max_rows,
                reported = result.rows_affected(),
                sql,
                "result exceeds row limit"
            );
            return Err(Error::Query(QueryError::row_limit_exceeded(max_rows, sql)));
        }

        let fields = want_fields.then(|| {
            FieldMetadata::new(
                (0..field_count)
                    .map(|i| self.session.fetch_field(&cursor, i))
                    .collect(),
            )
        });

        Ok(Dispatch::Rows {
            cursor,
            result,
            fields,
        })
    }

    /// The guarded execution path every mode goes through.
    #[allow(clippy::result_large_err)]
    fn run(&mut self, sql: &str, mode: ResultMode) -> Result<(S::Cursor, PlainResult)> {
        if self.closed {
            return Err(Error::Connection(ConnectionError::closed()));
        }

        tracing::debug!(%mode, sql, "executing statement");

        let cursor = match self.session.execute(sql, mode) {
            Ok(cursor) => cursor,
            Err(NativeFailure) => {
                let err = mapper::statement_error(&self.session, sql);
                tracing::debug!(code = err.code(), error = %err, "statement failed");
                return Err(err);
            }
        };

        let result = PlainResult::new(
            self.session.affected_rows(),
            self.session.insert_id(),
            self.session.session_id(),
        );
        Ok((cursor, result))
    }
}

impl<S: NativeSession> Drop for Connection<S> {
    fn drop(&mut self) {
        self.close();
    }
}
