//! Synchronous database sessions with buffered and streaming result modes.
//!
//! A [`Connection`] owns one native session (any [`NativeSession`]
//! implementation) and offers three ways to run a statement:
//!
//! - [`Connection::execute`]: no rows expected, returns a [`PlainResult`]
//! - [`Connection::query_set`]: every row materialized into a [`RowSet`]
//! - [`Connection::query_reader`]: rows streamed through a [`RowReader`]
//!
//! Every call blocks the calling thread for the duration of the native
//! round trip. There is no internal locking, cancellation or timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlsession::{Connection, SessionParameters};
//! use sqlsession_sqlite::SqliteSession;
//!
//! let params = SessionParameters::new().database(":memory:");
//! let mut conn = Connection::<SqliteSession>::connect(&params)?;
//!
//! conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?;
//! let inserted = conn.execute("INSERT INTO t (name) VALUES ('a')")?;
//! assert_eq!(inserted.insert_id(), 1);
//!
//! let set = conn.query_set("SELECT id, name FROM t", 100, true)?;
//! for row in &set {
//!     println!("{:?}", row.get_named::<String>("name")?);
//! }
//!
//! let mut reader = conn.query_reader("SELECT name FROM t", 0, false)?;
//! while let Some(row) = reader.next_row()? {
//!     println!("{:?}", row.get(0));
//! }
//! ```

pub mod connection;
mod mapper;
pub mod result;

pub use connection::Connection;
pub use result::{PlainResult, RowReader, RowSet};

pub use sqlsession_core::{
    ColumnDescriptor, ColumnInfo, ConnectionError, ConnectionErrorKind, Error, FieldMetadata,
    FieldType, FromValue, NativeFailure, NativeSession, QueryError, QueryErrorKind, Result,
    ResultMode, Row, SessionParameters, Value, capabilities,
};
