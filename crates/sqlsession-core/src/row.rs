//! Result row representation.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column names shared across all rows of one result.
///
/// Wrapped in `Arc` so every row from the same cursor shares it. Empty when
/// the caller did not ask for field metadata; rows then only support
/// index-based access.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    ///
    /// A repeated name resolves to its first position.
    pub fn new(names: Vec<String>) -> Self {
        let mut name_to_index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            name_to_index.entry(name.clone()).or_insert(i);
        }
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the name of a column by index.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row pulled from a native cursor, in server column order.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Create a row that carries no column names.
    pub fn anonymous(values: Vec<Value>) -> Self {
        Self {
            values,
            columns: Arc::new(ColumnInfo::default()),
        }
    }

    /// Get the shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name. Always `None` for anonymous rows.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a typed value by column index.
    #[allow(clippy::result_large_err)]
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.get(index).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!(
                    "index {} out of bounds (row has {} columns)",
                    index,
                    self.len()
                ),
                column: None,
            })
        })?;
        T::from_value(value)
    }

    /// Get a typed value by column name.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Conversion from a borrowed `Value` into a typed value.
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
    })
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let v = value.as_i64().ok_or_else(|| mismatch("i32", value))?;
        i32::try_from(v).map_err(|_| {
            Error::Type(TypeError {
                expected: "i32",
                actual: format!("value {} out of range", v),
                column: None,
            })
        })
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_u64().ok_or_else(|| mismatch("u64", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("Vec<u8>", value))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                Error::Type(TypeError {
                    expected: "JSON",
                    actual: format!("invalid JSON text: {}", e),
                    column: None,
                })
            }),
            _ => Err(mismatch("JSON", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ColumnDescriptor, FieldMetadata, FieldType};

    fn sample() -> Row {
        let columns = Arc::new(ColumnInfo::new(vec!["id".into(), "name".into()]));
        Row::with_columns(columns, vec![Value::BigInt(7), Value::Null])
    }

    #[test]
    fn name_and_index_access() {
        let row = sample();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_as::<i64>(0).unwrap(), 7);
        assert_eq!(row.get_named::<Option<String>>("name").unwrap(), None);
        assert!(row.get_by_name("missing").is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_first_column() {
        let names = vec!["id".to_string(), "id".to_string(), "name".to_string()];
        let fields = FieldMetadata::new(
            names
                .iter()
                .map(|n| ColumnDescriptor::new(n.clone(), FieldType::LongLong))
                .collect(),
        );
        let info = ColumnInfo::new(names);
        assert_eq!(info.index_of("id"), Some(0));
        assert_eq!(info.index_of("id"), fields.index_of("id"));

        let row = Row::with_columns(Arc::new(info), vec![Value::BigInt(1), Value::BigInt(2), Value::Null]);
        assert_eq!(row.get_named::<i64>("id").unwrap(), 1);
    }

    #[test]
    fn typed_errors_name_the_column() {
        let row = sample();
        match row.get_named::<String>("id") {
            Err(Error::Type(te)) => {
                assert_eq!(te.column.as_deref(), Some("id"));
                assert_eq!(te.actual, "BIGINT");
            }
            other => panic!("expected type error, got {:?}", other),
        }
        assert!(row.get_as::<i64>(5).is_err());
    }

    #[test]
    fn anonymous_rows_only_support_index_access() {
        let row = Row::anonymous(vec![Value::Text("a".into())]);
        assert!(row.column_info().is_empty());
        assert!(row.get_by_name("a").is_none());
        assert_eq!(row.get_as::<String>(0).unwrap(), "a");
    }

    #[test]
    fn json_from_text() {
        let row = Row::anonymous(vec![Value::Text(r#"{"k":[1,2]}"#.into())]);
        let doc: serde_json::Value = row.get_as(0).unwrap();
        assert_eq!(doc["k"][1], 2);
    }
}
