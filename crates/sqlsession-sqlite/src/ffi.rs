//! Thin helpers over the `libsqlite3-sys` bindings.
//!
//! Only the entry points the session needs are re-exported here, together
//! with the handful of string and column readers that would otherwise repeat
//! the same pointer handling at every call site.

use std::ffi::{CStr, c_char, c_int};

use sqlsession_core::{FieldType, Value};

pub use libsqlite3_sys::{
    SQLITE_BLOB, SQLITE_DONE, SQLITE_ERROR, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_MISUSE,
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI,
    SQLITE_ROW, SQLITE_TEXT, sqlite3, sqlite3_changes, sqlite3_close, sqlite3_column_blob,
    sqlite3_column_bytes, sqlite3_column_count, sqlite3_column_decltype, sqlite3_column_double,
    sqlite3_column_int64, sqlite3_column_name, sqlite3_column_text, sqlite3_column_type,
    sqlite3_errcode, sqlite3_errmsg, sqlite3_errstr, sqlite3_exec, sqlite3_finalize,
    sqlite3_free, sqlite3_initialize, sqlite3_last_insert_rowid, sqlite3_libversion,
    sqlite3_libversion_number, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt,
    sqlite3_total_changes,
};

/// Get the SQLite library version as a string.
pub fn version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static string
    unsafe {
        let ptr = sqlite3_libversion();
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
    }
}

/// Get the SQLite library version as a number.
pub fn version_number() -> i32 {
    // SAFETY: sqlite3_libversion_number is always safe to call
    unsafe { sqlite3_libversion_number() }
}

/// English text for a result code.
pub fn error_string(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a static string for every code
    unsafe {
        let ptr = sqlite3_errstr(code);
        if ptr.is_null() {
            return "unknown error";
        }
        CStr::from_ptr(ptr).to_str().unwrap_or("unknown error")
    }
}

/// Copy a C string owned by SQLite, empty for null.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for the call.
pub unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        // SAFETY: guaranteed by the caller
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned()
    }
}

/// Current error text of a database handle.
///
/// # Safety
/// `db` must be a live handle returned by `sqlite3_open_v2`.
pub unsafe fn errmsg(db: *mut sqlite3) -> String {
    // SAFETY: db is live, errmsg returns a string owned by the handle
    unsafe { owned_string(sqlite3_errmsg(db)) }
}

/// Name of a result column.
///
/// # Safety
/// `stmt` must be a live prepared statement and `index` a valid column.
pub unsafe fn column_name(stmt: *mut sqlite3_stmt, index: c_int) -> String {
    // SAFETY: guaranteed by the caller
    let name = unsafe { owned_string(sqlite3_column_name(stmt, index)) };
    if name.is_empty() {
        format!("col{}", index)
    } else {
        name
    }
}

/// Column type derived from the declared type, following SQLite's
/// affinity rules. Expression columns have no declared type.
///
/// # Safety
/// `stmt` must be a live prepared statement and `index` a valid column.
pub unsafe fn column_type(stmt: *mut sqlite3_stmt, index: c_int) -> FieldType {
    // SAFETY: guaranteed by the caller
    let decl = unsafe { owned_string(sqlite3_column_decltype(stmt, index)) };
    declared_type(&decl)
}

/// Map a declared column type to a field type tag.
pub fn declared_type(decl: &str) -> FieldType {
    let decl = decl.to_ascii_uppercase();
    if decl.is_empty() {
        FieldType::Null
    } else if decl.contains("INT") {
        FieldType::LongLong
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        FieldType::VarString
    } else if decl.contains("BLOB") {
        FieldType::Blob
    } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
        FieldType::Double
    } else if decl.contains("BOOL") {
        FieldType::Tiny
    } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
        FieldType::DateTime
    } else if decl.contains("DATE") {
        FieldType::Date
    } else if decl.contains("TIME") {
        FieldType::Time
    } else if decl.contains("JSON") {
        FieldType::Json
    } else {
        FieldType::NewDecimal
    }
}

/// Read a column value from the current row.
///
/// # Safety
/// `stmt` must have just returned `SQLITE_ROW` and `index` must be a valid
/// 0-based column index.
pub unsafe fn read_column(stmt: *mut sqlite3_stmt, index: c_int) -> Value {
    // SAFETY: guaranteed by the caller for every call below
    unsafe {
        match sqlite3_column_type(stmt, index) {
            SQLITE_INTEGER => Value::BigInt(sqlite3_column_int64(stmt, index)),
            SQLITE_FLOAT => Value::Double(sqlite3_column_double(stmt, index)),
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(stmt, index);
                let len = sqlite3_column_bytes(stmt, index);
                if ptr.is_null() {
                    Value::Null
                } else {
                    let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
                    Value::Text(String::from_utf8_lossy(slice).into_owned())
                }
            }
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(stmt, index);
                let len = sqlite3_column_bytes(stmt, index);
                if ptr.is_null() || len == 0 {
                    Value::Bytes(Vec::new())
                } else {
                    let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
                    Value::Bytes(slice.to_vec())
                }
            }
            _ => Value::Null,
        }
    }
}
