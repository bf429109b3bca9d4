//! Embedded SQLite native session for sqlsession.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! [`SqliteSession`] implements every `NativeSession` primitive on top of the
//! bundled SQLite library, so a `sqlsession::Connection` can be used without
//! a database server.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlsession::{Connection, SessionParameters};
//! use sqlsession_sqlite::SqliteSession;
//!
//! let params = SessionParameters::new().database("app.db");
//! let mut conn = Connection::<SqliteSession>::connect(&params)?;
//! conn.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! ```
//!
//! # Type Mapping
//!
//! | SQLite storage class | `Value` |
//! |----------------------|---------|
//! | INTEGER | `BigInt` |
//! | REAL | `Double` |
//! | TEXT | `Text` |
//! | BLOB | `Bytes` |
//! | NULL | `Null` |
//!
//! Column type tags are derived from the declared column type using SQLite's
//! affinity rules; expression columns report `FieldType::Null`.

pub mod ffi;
pub mod session;

pub use session::{MEMORY_PATH, SqliteCursor, SqliteSession};

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
