//! Embedded SQLite session.
//!
//! The database path comes from [`SessionParameters::database`]; an empty
//! database name opens a private in-memory database. Host, port, user,
//! password and charset have no meaning for an embedded engine and are
//! ignored.
//!
//! Result modes map onto SQLite as follows:
//!
//! - `None`: the statement is stepped to completion; counters come from
//!   `sqlite3_changes` and `sqlite3_last_insert_rowid`, and are 0 when the
//!   statement changed no rows
//! - `Buffered`: every row is read before `execute` returns and the
//!   affected-row counter reports the number of rows read
//! - `Streaming`: the prepared statement stays open and each fetch steps it
//!   once
//!
//! A statement text holding more than one statement is rejected unless the
//! multi-statements capability flag is set, in which case plain execution
//! runs the whole text through `sqlite3_exec`.

use std::collections::VecDeque;
use std::ffi::{CString, c_char, c_int};
use std::ptr;
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

use sqlsession_core::{
    ColumnDescriptor, FieldType, NativeFailure, NativeSession, ResultMode, SessionParameters,
    Value,
};

use crate::ffi;

/// Path used when no database name is given.
pub const MEMORY_PATH: &str = ":memory:";

static LIBRARY_INIT: Once = Once::new();
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A native session backed by an embedded SQLite database.
#[derive(Debug)]
pub struct SqliteSession {
    db: *mut ffi::sqlite3,
    id: u64,
    path: String,
    multi_statements: bool,
    errno: u32,
    error: String,
    affected: u64,
    insert_id: u64,
}

// SAFETY: the bundled library is built in serialized threading mode, and a
// session is never shared: every primitive takes it by exclusive or shared
// reference from the single thread that currently owns it.
unsafe impl Send for SqliteSession {}

impl Default for SqliteSession {
    fn default() -> Self {
        Self {
            db: ptr::null_mut(),
            id: 0,
            path: String::new(),
            multi_statements: false,
            errno: 0,
            error: String::new(),
            affected: 0,
            insert_id: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Counters {
    total_changes: c_int,
    rowid: i64,
}

/// Result handle of one statement.
#[derive(Debug)]
pub struct SqliteCursor {
    stmt: *mut ffi::sqlite3_stmt,
    columns: Vec<ColumnDescriptor>,
    buffered: Option<VecDeque<Vec<Value>>>,
}

// SAFETY: see `SqliteSession`; a cursor is only used through its session.
unsafe impl Send for SqliteCursor {}

impl SqliteCursor {
    fn empty() -> Self {
        Self {
            stmt: ptr::null_mut(),
            columns: Vec::new(),
            buffered: None,
        }
    }

    fn finalize(&mut self) {
        if !self.stmt.is_null() {
            // SAFETY: stmt was produced by sqlite3_prepare_v2 and is finalized once
            unsafe {
                ffi::sqlite3_finalize(self.stmt);
            }
            self.stmt = ptr::null_mut();
        }
    }
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl SqliteSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the open database, empty before connect.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        !self.db.is_null()
    }

    fn clear_status(&mut self) {
        self.errno = 0;
        self.error.clear();
    }

    fn fail(&mut self, code: c_int, message: impl Into<String>) -> NativeFailure {
        self.errno = code.unsigned_abs();
        self.error = message.into();
        tracing::debug!(code = self.errno, error = %self.error, "sqlite failure");
        NativeFailure
    }

    /// Record the handle's current error.
    fn fail_from_db(&mut self) -> NativeFailure {
        // SAFETY: only called while db is open
        let (code, message) = unsafe { (ffi::sqlite3_errcode(self.db), ffi::errmsg(self.db)) };
        self.fail(code, message)
    }

    /// Counters as they stand before a statement runs.
    fn snapshot(&self) -> Counters {
        // SAFETY: db is open
        unsafe {
            Counters {
                total_changes: ffi::sqlite3_total_changes(self.db),
                rowid: ffi::sqlite3_last_insert_rowid(self.db),
            }
        }
    }

    /// Record the counters of the statement that ran since `before`.
    ///
    /// `sqlite3_changes` and `sqlite3_last_insert_rowid` keep their values
    /// across statements that change nothing, so both are reported only when
    /// the statement moved them.
    fn record_changes(&mut self, before: Counters) {
        let after = self.snapshot();
        if after.total_changes == before.total_changes {
            self.affected = 0;
            self.insert_id = 0;
            return;
        }

        // SAFETY: db is open
        let changes = unsafe { ffi::sqlite3_changes(self.db) };
        self.affected = u64::from(changes.unsigned_abs());
        self.insert_id = if self.affected > 0 && after.rowid != before.rowid {
            u64::try_from(after.rowid).unwrap_or(0)
        } else {
            0
        };
    }

    /// Run the whole text, every statement in it, discarding rows.
    fn exec_batch(&mut self, sql: &str, before: Counters) -> Result<SqliteCursor, NativeFailure> {
        let c_sql = CString::new(sql)
            .map_err(|_| self.fail(ffi::SQLITE_MISUSE, "Statement contains a null byte"))?;
        let mut errmsg: *mut c_char = ptr::null_mut();

        // SAFETY: db is open, c_sql outlives the call, errmsg is freed below
        let rc = unsafe { ffi::sqlite3_exec(self.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg) };

        if rc != ffi::SQLITE_OK {
            // SAFETY: errmsg is null or a string allocated by sqlite3_exec
            let message = unsafe {
                let message = ffi::owned_string(errmsg);
                ffi::sqlite3_free(errmsg.cast());
                message
            };
            let message = if message.is_empty() {
                ffi::error_string(rc).to_string()
            } else {
                message
            };
            return Err(self.fail(rc, message));
        }

        self.record_changes(before);
        Ok(SqliteCursor::empty())
    }

    /// Prepare the first statement of `sql`, rejecting any further statement.
    fn prepare(&mut self, sql: &str) -> Result<SqliteCursor, NativeFailure> {
        let len = c_int::try_from(sql.len())
            .map_err(|_| self.fail(ffi::SQLITE_MISUSE, "Statement is too long"))?;
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();

        // SAFETY: db is open; sql is valid for len bytes and outlives the call
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(self.db, sql.as_ptr().cast(), len, &mut stmt, &mut tail)
        };
        if rc != ffi::SQLITE_OK {
            return Err(self.fail_from_db());
        }

        let mut cursor = SqliteCursor::empty();
        cursor.stmt = stmt;

        let consumed = if tail.is_null() {
            sql.len()
        } else {
            (tail as usize).saturating_sub(sql.as_ptr() as usize)
        };
        let rest = sql.get(consumed..).unwrap_or_default();
        if self.has_statement(rest) {
            let message = if self.multi_statements {
                "Multiple statements cannot return a result set"
            } else {
                "Multiple statements require the multi-statements capability"
            };
            return Err(self.fail(ffi::SQLITE_ERROR, message));
        }

        if !stmt.is_null() {
            // SAFETY: stmt is a live prepared statement
            let count = unsafe { ffi::sqlite3_column_count(stmt) };
            cursor.columns = (0..count)
                .map(|i| {
                    // SAFETY: i is a valid column index of stmt
                    unsafe { ColumnDescriptor::new(ffi::column_name(stmt, i), ffi::column_type(stmt, i)) }
                })
                .collect();
        }

        Ok(cursor)
    }

    /// Does `rest` hold anything other than whitespace, separators and comments?
    fn has_statement(&self, rest: &str) -> bool {
        let trimmed = rest.trim_matches(|c: char| c.is_whitespace() || c == ';');
        if trimmed.is_empty() {
            return false;
        }
        let Ok(len) = c_int::try_from(trimmed.len()) else {
            return true;
        };
        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        // SAFETY: db is open; trimmed is valid for len bytes
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(self.db, trimmed.as_ptr().cast(), len, &mut stmt, ptr::null_mut())
        };
        let found = rc != ffi::SQLITE_OK || !stmt.is_null();
        if !stmt.is_null() {
            // SAFETY: stmt was just prepared
            unsafe {
                ffi::sqlite3_finalize(stmt);
            }
        }
        found
    }

    /// Step once. `Ok(None)` when the statement is done.
    fn step(&mut self, cursor: &mut SqliteCursor) -> Result<Option<Vec<Value>>, NativeFailure> {
        if cursor.stmt.is_null() {
            return Ok(None);
        }

        // SAFETY: stmt is a live prepared statement
        let rc = unsafe { ffi::sqlite3_step(cursor.stmt) };
        match rc {
            ffi::SQLITE_ROW => {
                let count = cursor.columns.len();
                let values = (0..count)
                    .map(|i| {
                        // SAFETY: the statement just returned a row; i < column count
                        unsafe { ffi::read_column(cursor.stmt, i as c_int) }
                    })
                    .collect();
                Ok(Some(values))
            }
            ffi::SQLITE_DONE => {
                cursor.finalize();
                Ok(None)
            }
            _ => {
                let failure = self.fail_from_db();
                cursor.finalize();
                Err(failure)
            }
        }
    }

    /// Step to completion, discarding rows.
    fn drain(&mut self, cursor: &mut SqliteCursor) -> Result<(), NativeFailure> {
        while self.step(cursor)?.is_some() {}
        Ok(())
    }
}

impl NativeSession for SqliteSession {
    type Cursor = SqliteCursor;

    fn library_init() {
        LIBRARY_INIT.call_once(|| {
            // SAFETY: sqlite3_initialize may be called at any time
            let rc = unsafe { ffi::sqlite3_initialize() };
            if rc == ffi::SQLITE_OK {
                tracing::debug!(version = ffi::version(), "sqlite initialized");
            } else {
                tracing::warn!(code = rc, error = ffi::error_string(rc), "sqlite initialization failed");
            }
        });
    }

    fn connect(&mut self, params: &SessionParameters) -> Result<(), NativeFailure> {
        self.clear_status();
        let path = if params.database.is_empty() {
            MEMORY_PATH.to_string()
        } else {
            params.database.clone()
        };
        let c_path = CString::new(path.as_str())
            .map_err(|_| self.fail(ffi::SQLITE_MISUSE, "Invalid path: contains null byte"))?;

        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let message = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is a handle returned by the failed open and is closed once
                unsafe {
                    let message = ffi::errmsg(db);
                    ffi::sqlite3_close(db);
                    message
                }
            };
            return Err(self.fail(rc, message));
        }

        self.db = db;
        self.path = path;
        self.multi_statements = params.multi_statements_enabled();
        self.id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(path = %self.path, session_id = self.id, "sqlite database opened");
        Ok(())
    }

    fn execute(&mut self, sql: &str, mode: ResultMode) -> Result<SqliteCursor, NativeFailure> {
        self.clear_status();
        self.affected = 0;
        self.insert_id = 0;
        if self.db.is_null() {
            return Err(self.fail(ffi::SQLITE_MISUSE, "Database is not open"));
        }

        let before = self.snapshot();
        if mode == ResultMode::None && self.multi_statements {
            return self.exec_batch(sql, before);
        }

        let mut cursor = self.prepare(sql)?;

        if mode == ResultMode::None || cursor.columns.is_empty() {
            self.drain(&mut cursor)?;
            self.record_changes(before);
            return Ok(cursor);
        }

        if mode == ResultMode::Buffered {
            let mut rows = VecDeque::new();
            while let Some(row) = self.step(&mut cursor)? {
                rows.push_back(row);
            }
            self.affected = rows.len() as u64;
            cursor.buffered = Some(rows);
        }

        Ok(cursor)
    }

    fn last_error(&self) -> &str {
        &self.error
    }

    fn last_errno(&self) -> u32 {
        self.errno
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn insert_id(&self) -> u64 {
        self.insert_id
    }

    fn session_id(&self) -> u64 {
        self.id
    }

    fn field_count(&self, cursor: &SqliteCursor) -> usize {
        cursor.columns.len()
    }

    fn fetch_field(&self, cursor: &SqliteCursor, index: usize) -> ColumnDescriptor {
        cursor
            .columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| ColumnDescriptor::new(format!("col{}", index), FieldType::Null))
    }

    fn fetch_row(&mut self, cursor: &mut SqliteCursor) -> Result<Option<Vec<Value>>, NativeFailure> {
        if let Some(rows) = cursor.buffered.as_mut() {
            return Ok(rows.pop_front());
        }
        self.step(cursor)
    }

    fn close_cursor(&mut self, cursor: SqliteCursor) {
        drop(cursor);
    }

    fn close(&mut self) {
        if self.db.is_null() {
            return;
        }
        // SAFETY: db is open and is closed at most once
        let rc = unsafe { ffi::sqlite3_close(self.db) };
        if rc != ffi::SQLITE_OK {
            // An unfinalized statement keeps the handle busy; it stays
            // allocated rather than being freed under that statement.
            tracing::warn!(
                code = rc,
                error = ffi::error_string(rc),
                session_id = self.id,
                "sqlite database not closed cleanly"
            );
        }
        self.db = ptr::null_mut();
        tracing::debug!(path = %self.path, session_id = self.id, "sqlite database closed");
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> SqliteSession {
        SqliteSession::library_init();
        let mut session = SqliteSession::new();
        session.connect(&SessionParameters::new()).unwrap();
        session
    }

    #[test]
    fn test_connect_memory() {
        let session = open();
        assert!(session.is_open());
        assert_eq!(session.path(), MEMORY_PATH);
        assert!(session.session_id() > 0);
        assert_eq!(session.last_error(), "");
    }

    #[test]
    fn test_session_ids_are_distinct() {
        let a = open();
        let b = open();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_connect_failure_reports_cantopen() {
        let mut session = SqliteSession::new();
        let params = SessionParameters::new().database("/nonexistent-dir/sub/db.sqlite");
        assert!(session.connect(&params).is_err());
        assert_eq!(session.last_errno(), 14);
        assert!(!session.last_error().is_empty());
        assert!(!session.is_open());
    }

    #[test]
    fn test_execute_counters() {
        let mut session = open();
        let cursor = session
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", ResultMode::None)
            .unwrap();
        session.close_cursor(cursor);

        let cursor = session
            .execute("INSERT INTO t (name) VALUES ('a')", ResultMode::None)
            .unwrap();
        session.close_cursor(cursor);
        assert_eq!(session.affected_rows(), 1);
        assert_eq!(session.insert_id(), 1);
    }

    #[test]
    fn test_counters_reset_when_nothing_changes() {
        let mut session = open();
        for sql in [
            "CREATE TABLE t (id INTEGER PRIMARY KEY, x INTEGER)",
            "INSERT INTO t (x) VALUES (0)",
            "INSERT INTO t (x) VALUES (0)",
            "INSERT INTO t (x) VALUES (0)",
        ] {
            let cursor = session.execute(sql, ResultMode::None).unwrap();
            session.close_cursor(cursor);
        }
        assert_eq!(session.insert_id(), 3);

        let cursor = session.execute("UPDATE t SET x = 1", ResultMode::None).unwrap();
        session.close_cursor(cursor);
        assert_eq!(session.affected_rows(), 3);
        assert_eq!(session.insert_id(), 0);

        let cursor = session.execute("CREATE TABLE u (y INT)", ResultMode::None).unwrap();
        session.close_cursor(cursor);
        assert_eq!(session.affected_rows(), 0);
        assert_eq!(session.insert_id(), 0);

        let cursor = session.execute("DELETE FROM t WHERE id > 100", ResultMode::None).unwrap();
        session.close_cursor(cursor);
        assert_eq!(session.affected_rows(), 0);
        assert_eq!(session.insert_id(), 0);
    }

    #[test]
    fn test_buffered_reports_row_count() {
        let mut session = open();
        let cursor = session
            .execute("SELECT 1 AS a UNION ALL SELECT 2", ResultMode::Buffered)
            .unwrap();
        assert_eq!(session.affected_rows(), 2);
        assert_eq!(session.field_count(&cursor), 1);
        assert_eq!(session.fetch_field(&cursor, 0).name, "a");
        session.close_cursor(cursor);
    }

    #[test]
    fn test_streaming_steps_lazily() {
        let mut session = open();
        let mut cursor = session
            .execute("SELECT 1 UNION ALL SELECT 2", ResultMode::Streaming)
            .unwrap();
        assert_eq!(session.affected_rows(), 0);
        assert_eq!(session.fetch_row(&mut cursor).unwrap(), Some(vec![Value::BigInt(1)]));
        assert_eq!(session.fetch_row(&mut cursor).unwrap(), Some(vec![Value::BigInt(2)]));
        assert_eq!(session.fetch_row(&mut cursor).unwrap(), None);
        assert_eq!(session.fetch_row(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_syntax_error_is_recorded() {
        let mut session = open();
        assert!(session.execute("SELEC 1", ResultMode::None).is_err());
        assert_eq!(session.last_errno(), 1);
        assert!(session.last_error().contains("syntax error"));

        session.execute("SELECT 1", ResultMode::None).unwrap();
        assert_eq!(session.last_error(), "");
        assert_eq!(session.last_errno(), 0);
    }

    #[test]
    fn test_multiple_statements_need_flag() {
        let mut session = open();
        assert!(
            session
                .execute("CREATE TABLE a (x); CREATE TABLE b (y)", ResultMode::None)
                .is_err()
        );
        assert!(session.last_error().contains("multi-statements"));

        let cursor = session.execute("SELECT 1;  ; ", ResultMode::Buffered).unwrap();
        session.close_cursor(cursor);
    }

    #[test]
    fn test_multiple_statements_with_flag() {
        SqliteSession::library_init();
        let mut params = SessionParameters::new();
        params.enable_multi_statements();
        let mut session = SqliteSession::new();
        session.connect(&params).unwrap();

        let cursor = session
            .execute(
                "CREATE TABLE a (x); INSERT INTO a VALUES (1); INSERT INTO a VALUES (2)",
                ResultMode::None,
            )
            .unwrap();
        session.close_cursor(cursor);
        assert_eq!(session.insert_id(), 2);

        let mut cursor = session
            .execute("SELECT COUNT(*) FROM a", ResultMode::Buffered)
            .unwrap();
        assert_eq!(session.fetch_row(&mut cursor).unwrap(), Some(vec![Value::BigInt(2)]));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = open();
        session.close();
        session.close();
        assert!(!session.is_open());
        assert!(session.execute("SELECT 1", ResultMode::None).is_err());
    }
}
