//! The boundary with the native transport.
//!
//! A [`NativeSession`] wraps one session handle of some lower layer (a wire
//! protocol client, an embedded engine, a test stub) and exposes the
//! primitives the connection core is built from. Every primitive may block.
//! Failures are signalled with [`NativeFailure`]; the details are read back
//! afterwards through [`NativeSession::last_error`] and
//! [`NativeSession::last_errno`].

use std::fmt;

use crate::field::ColumnDescriptor;
use crate::params::SessionParameters;
use crate::value::Value;

/// How the native layer should deliver the result of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    /// No result rows are expected
    None,
    /// The whole result is transferred before execute returns
    Buffered,
    /// Rows are transferred one at a time as they are fetched
    Streaming,
}

impl ResultMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResultMode::None => "none",
            ResultMode::Buffered => "buffered",
            ResultMode::Streaming => "streaming",
        }
    }
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A native primitive reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeFailure;

/// Primitives of one native session handle.
///
/// Implementations own the handle. They are driven from a single thread at a
/// time and never see a call after [`close`](NativeSession::close), nor a
/// statement while one of their cursors is still open.
pub trait NativeSession {
    /// Result handle produced by [`execute`](NativeSession::execute).
    type Cursor;

    /// Process-wide library setup. Called before every connect attempt;
    /// implementations must make repeated calls a no-op.
    fn library_init()
    where
        Self: Sized,
    {
    }

    /// Establish the session. Strings in `params` must not be retained.
    fn connect(&mut self, params: &SessionParameters) -> Result<(), NativeFailure>;

    /// Run one statement text under `mode`.
    fn execute(&mut self, sql: &str, mode: ResultMode) -> Result<Self::Cursor, NativeFailure>;

    /// Text of the pending error, empty when there is none.
    fn last_error(&self) -> &str;

    /// Code paired with [`last_error`](NativeSession::last_error).
    fn last_errno(&self) -> u32;

    /// Rows affected (or, for buffered results, rows returned) by the last statement.
    fn affected_rows(&self) -> u64;

    /// Identifier generated by the last statement.
    fn insert_id(&self) -> u64;

    /// Server-assigned session identifier.
    fn session_id(&self) -> u64;

    /// Number of columns in the cursor's result; zero for statements without rows.
    fn field_count(&self, cursor: &Self::Cursor) -> usize;

    /// Descriptor of column `index` (`index < field_count`).
    fn fetch_field(&self, cursor: &Self::Cursor, index: usize) -> ColumnDescriptor;

    /// Next row, or `None` once the cursor is exhausted.
    fn fetch_row(&mut self, cursor: &mut Self::Cursor) -> Result<Option<Vec<Value>>, NativeFailure>;

    /// Release a cursor. Failures are not reported.
    fn close_cursor(&mut self, cursor: Self::Cursor);

    /// Release the session handle. Failures are not reported.
    fn close(&mut self);
}
