//! SQL values, rows and filter operands.
//!
//! Values are always bound as parameters when a statement is compiled; the
//! inline rendering only exists for debugging output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A SQL value that can be used as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

/// A result row or a mutation payload: column name to value, in column order.
pub type Row = IndexMap<String, SqlValue>;

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer using parameterized queries instead.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a float, converting integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as plain text, for building LIKE patterns.
    #[must_use]
    pub fn to_pattern_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::from(self)
    }
}

/// Builds a [`Row`] from `"column" => value` pairs.
///
/// ```rust
/// use oxide_query_core::{row, SqlValue};
///
/// let payload = row! { "name" => "Alice", "age" => 30 };
/// assert_eq!(payload["age"], SqlValue::Int(30));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::value::Row::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::value::Row::new();
        $(
            row.insert(
                ::std::string::String::from($key),
                $crate::value::ToSqlValue::to_sql_value($value),
            );
        )+
        row
    }};
}

/// The right-hand side of a filter entry.
///
/// `Null` entries are skipped by the filter DSL; `List` feeds the set and
/// range operators.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Absent value; the filter entry is ignored.
    Null,
    /// A single value.
    Scalar(SqlValue),
    /// A sequence of values.
    List(Vec<SqlValue>),
}

impl FilterValue {
    /// Returns the values as a list, wrapping a scalar into a singleton.
    #[must_use]
    pub fn into_list(self) -> Vec<SqlValue> {
        match self {
            Self::Null => Vec::new(),
            Self::Scalar(v) => vec![v],
            Self::List(values) => values,
        }
    }
}

impl From<SqlValue> for FilterValue {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            other => Self::Scalar(other),
        }
    }
}

macro_rules! impl_filter_value_scalar {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self::from(value.to_sql_value())
                }
            }
        )+
    };
}

impl_filter_value_scalar!(bool, i64, i32, i16, u32, u16, f64, f32, String, &str, &String);

impl<T: ToSqlValue> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        Self::from(value.to_sql_value())
    }
}

impl<T: ToSqlValue> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

impl<T: ToSqlValue, const N: usize> From<[T; N]> for FilterValue {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

/// JSON documents, as received from query strings or request bodies: arrays
/// become lists and `null` is skipped.
impl From<serde_json::Value> for FilterValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(SqlValue::from).collect())
            }
            other => Self::Scalar(SqlValue::from(other)),
        }
    }
}
