//! Turns native failure signals into structured errors.
//!
//! The native layer only says "failed"; the code and text are read back from
//! the session handle. When the handle holds no error text the failure is
//! reported with code 0 and a placeholder message, but under its own
//! `Unknown` kind so callers can tell it apart from a real server error.

use sqlsession_core::error::UNKNOWN_ERROR_MESSAGE;
use sqlsession_core::{
    ConnectionError, ConnectionErrorKind, Error, NativeSession, QueryError, QueryErrorKind,
    UNKNOWN_ERROR_CODE,
};

/// Error for a failed statement, with `sql` attached.
pub(crate) fn statement_error<S: NativeSession>(session: &S, sql: &str) -> Error {
    let message = session.last_error();
    if message.is_empty() {
        return Error::Query(QueryError::unknown(sql));
    }

    Error::Query(QueryError {
        kind: QueryErrorKind::Server,
        code: session.last_errno(),
        message: message.to_string(),
        sql: if sql.is_empty() {
            None
        } else {
            Some(sql.to_string())
        },
    })
}

/// Error for a failed connect attempt.
pub(crate) fn connect_error<S: NativeSession>(session: &S) -> Error {
    let message = session.last_error();
    let (code, message) = if message.is_empty() {
        (UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_MESSAGE.to_string())
    } else {
        (session.last_errno(), message.to_string())
    };

    Error::Connection(ConnectionError {
        kind: ConnectionErrorKind::Connect,
        code,
        message,
    })
}
