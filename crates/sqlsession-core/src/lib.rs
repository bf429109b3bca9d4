//! Core types for sqlsession.
//!
//! This crate provides the data model shared by the connection core and the
//! native collaborators that back it:
//!
//! - `SessionParameters` for describing how to reach a server
//! - `Error` for the structured error taxonomy
//! - `Value`, `Row` and `FieldMetadata` for result data
//! - `NativeSession` for the primitive boundary a native layer implements

pub mod error;
pub mod field;
pub mod native;
pub mod params;
pub mod row;
pub mod value;

pub use error::{
    CR_SERVER_GONE_ERROR, ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, TypeError, UNKNOWN_ERROR_CODE,
};
pub use field::{ColumnDescriptor, FieldMetadata, FieldType};
pub use native::{NativeFailure, NativeSession, ResultMode};
pub use params::{REDACTED_PASSWORD, SessionParameters, capabilities};
pub use row::{ColumnInfo, FromValue, Row};
pub use value::Value;
