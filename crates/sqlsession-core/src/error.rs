//! Error types for session operations.
//!
//! Every failure that reaches a caller is a structured value carrying a
//! numeric code and a message. Failures raised while a statement was in
//! flight also carry the statement text so logs can be correlated.

use std::fmt;

/// Code reported when the native layer signalled failure without an error.
pub const UNKNOWN_ERROR_CODE: u32 = 0;

/// Client error code used for statements issued on a closed connection.
///
/// Mirrors the server's own "MySQL server has gone away" code.
pub const CR_SERVER_GONE_ERROR: u32 = 2006;

/// Placeholder message for failures the native layer did not describe.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown";

/// The primary error type for all session operations.
#[derive(Debug)]
pub enum Error {
    /// Connection lifecycle errors (connect failure, closed connection)
    Connection(ConnectionError),
    /// Statement execution errors
    Query(QueryError),
    /// Typed column access errors
    Type(TypeError),
    /// Configuration errors
    Config(ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub code: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// The connect primitive failed
    Connect,
    /// A statement was issued after `close()`
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub code: u32,
    pub message: String,
    pub sql: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Code and message reported by the server or transport
    Server,
    /// The native layer failed but left no error text behind
    Unknown,
    /// The result exceeded the caller-supplied row ceiling
    RowLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
}

impl ConnectionError {
    /// Error returned by every execution call once the connection is closed.
    pub fn closed() -> Self {
        Self {
            kind: ConnectionErrorKind::Closed,
            code: CR_SERVER_GONE_ERROR,
            message: "Connection is closed".to_string(),
        }
    }
}

impl QueryError {
    /// Error for a native failure that reported no error text.
    pub fn unknown(sql: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Unknown,
            code: UNKNOWN_ERROR_CODE,
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
            sql: non_empty(sql.into()),
        }
    }

    /// Error for a result that would exceed `limit` rows.
    pub fn row_limit_exceeded(limit: usize, sql: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::RowLimitExceeded,
            code: UNKNOWN_ERROR_CODE,
            message: format!("Row count exceeded {}", limit),
            sql: non_empty(sql.into()),
        }
    }
}

fn non_empty(sql: String) -> Option<String> {
    if sql.is_empty() { None } else { Some(sql) }
}

impl Error {
    /// Numeric error code. `0` means the failure was not mapped to a code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Connection(e) => e.code,
            Error::Query(e) => e.code,
            Error::Type(_) | Error::Config(_) => UNKNOWN_ERROR_CODE,
        }
    }

    /// Human-readable message without the code or statement decoration.
    pub fn message(&self) -> String {
        match self {
            Error::Connection(e) => e.message.clone(),
            Error::Query(e) => e.message.clone(),
            Error::Type(e) => e.to_string(),
            Error::Config(e) => e.message.clone(),
        }
    }

    /// The statement that was in flight, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// Was a statement issued on a closed connection?
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Error::Connection(c) if c.kind == ConnectionErrorKind::Closed)
    }

    /// Did the connect primitive fail?
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Error::Connection(c) if c.kind == ConnectionErrorKind::Connect)
    }

    /// Did a result exceed the caller's row ceiling?
    pub fn is_row_limit_exceeded(&self) -> bool {
        matches!(self, Error::Query(q) if q.kind == QueryErrorKind::RowLimitExceeded)
    }

    /// Did the native layer fail without describing the failure?
    pub fn is_unknown(&self) -> bool {
        matches!(self, Error::Query(q) if q.kind == QueryErrorKind::Unknown)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "{}", e),
            Error::Query(e) => write!(f, "{}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", self.message, self.code)
    }
}

impl std::error::Error for ConnectionError {}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sql.as_deref() {
            Some(sql) if !sql.is_empty() => write!(
                f,
                "{} (errno {}) during query: {}",
                self.message, self.code, sql
            ),
            _ => write!(f, "{} (errno {})", self.message, self.code),
        }
    }
}

impl std::error::Error for QueryError {}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
