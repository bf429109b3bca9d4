//! Scripted in-memory native session for driving `Connection` in tests.
//!
//! Every primitive call is appended to a shared log so tests can assert on
//! exactly which native calls happened and in what order.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use sqlsession::{
    ColumnDescriptor, FieldType, NativeFailure, NativeSession, ResultMode, SessionParameters,
    Value,
};

/// Shared record of primitive invocations.
pub type CallLog = Rc<RefCell<Vec<&'static str>>>;

/// What the stub reports for the next statement.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Value>>,
    /// Overrides the affected-row counter; defaults to the row count for
    /// buffered queries and 0 otherwise.
    pub affected: Option<u64>,
    pub insert_id: u64,
    pub connect_error: Option<(u32, String)>,
    pub execute_error: Option<(u32, String)>,
    /// Fail the fetch that would return the row at this index.
    pub fetch_error_at: Option<(usize, u32, String)>,
}

impl Script {
    pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|name| ColumnDescriptor::new(*name, FieldType::VarString))
                .collect(),
            rows,
            ..Self::default()
        }
    }

    pub fn counters(affected: u64, insert_id: u64) -> Self {
        Self {
            affected: Some(affected),
            insert_id,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct StubCursor {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<Vec<Value>>,
    pulled: usize,
    fetch_error_at: Option<(usize, u32, String)>,
}

#[derive(Debug)]
pub struct StubSession {
    pub script: Script,
    pub log: CallLog,
    pub session_id: u64,
    errno: u32,
    error: String,
    affected: u64,
    insert_id: u64,
}

impl StubSession {
    pub fn new(script: Script) -> (Self, CallLog) {
        let log = CallLog::default();
        let session = Self {
            script,
            log: Rc::clone(&log),
            session_id: 42,
            errno: 0,
            error: String::new(),
            affected: 0,
            insert_id: 0,
        };
        (session, log)
    }

    fn record(&self, call: &'static str) {
        self.log.borrow_mut().push(call);
    }

    fn fail(&mut self, errno: u32, error: &str) -> NativeFailure {
        self.errno = errno;
        self.error = error.to_string();
        NativeFailure
    }
}

impl NativeSession for StubSession {
    type Cursor = StubCursor;

    fn connect(&mut self, _params: &SessionParameters) -> Result<(), NativeFailure> {
        self.record("connect");
        match self.script.connect_error.clone() {
            Some((errno, error)) => Err(self.fail(errno, &error)),
            None => Ok(()),
        }
    }

    fn execute(&mut self, _sql: &str, mode: ResultMode) -> Result<StubCursor, NativeFailure> {
        self.record("execute");
        self.errno = 0;
        self.error.clear();
        if let Some((errno, error)) = self.script.execute_error.clone() {
            return Err(self.fail(errno, &error));
        }

        self.affected = self.script.affected.unwrap_or(match mode {
            ResultMode::Buffered => self.script.rows.len() as u64,
            ResultMode::None | ResultMode::Streaming => 0,
        });
        self.insert_id = self.script.insert_id;

        Ok(StubCursor {
            columns: self.script.columns.clone(),
            rows: self.script.rows.clone().into(),
            pulled: 0,
            fetch_error_at: self.script.fetch_error_at.clone(),
        })
    }

    fn last_error(&self) -> &str {
        self.record("last_error");
        &self.error
    }

    fn last_errno(&self) -> u32 {
        self.record("last_errno");
        self.errno
    }

    fn affected_rows(&self) -> u64 {
        self.record("affected_rows");
        self.affected
    }

    fn insert_id(&self) -> u64 {
        self.record("insert_id");
        self.insert_id
    }

    fn session_id(&self) -> u64 {
        self.record("session_id");
        self.session_id
    }

    fn field_count(&self, cursor: &StubCursor) -> usize {
        self.record("field_count");
        cursor.columns.len()
    }

    fn fetch_field(&self, cursor: &StubCursor, index: usize) -> ColumnDescriptor {
        self.record("fetch_field");
        cursor.columns[index].clone()
    }

    fn fetch_row(&mut self, cursor: &mut StubCursor) -> Result<Option<Vec<Value>>, NativeFailure> {
        self.record("fetch_row");
        if let Some((at, errno, error)) = cursor.fetch_error_at.clone() {
            if cursor.pulled == at {
                return Err(self.fail(errno, &error));
            }
        }
        let row = cursor.rows.pop_front();
        if row.is_some() {
            cursor.pulled += 1;
        }
        Ok(row)
    }

    fn close_cursor(&mut self, _cursor: StubCursor) {
        self.record("close_cursor");
    }

    fn close(&mut self) {
        self.record("close");
    }
}

pub fn params() -> SessionParameters {
    SessionParameters::new()
        .host("db.internal")
        .user("app")
        .password("s3cret")
        .database("orders")
}

pub fn count(log: &CallLog, call: &str) -> usize {
    log.borrow().iter().filter(|c| **c == call).count()
}

pub fn text_rows(values: &[(i64, &str)]) -> Vec<Vec<Value>> {
    values
        .iter()
        .map(|(id, name)| vec![Value::BigInt(*id), Value::Text((*name).to_string())])
        .collect()
}
