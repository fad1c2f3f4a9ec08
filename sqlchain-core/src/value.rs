//! Value types for SQL parameters

use serde::{Deserialize, Serialize};
use std::fmt;

/// A SQL value that can be bound to a placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether a predicate on this value should be left out of the WHERE
    /// clause. Booleans and numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.iter().all(|c| c.is_ascii_whitespace()),
            Value::Bool(_) | Value::I64(_) | Value::F64(_) => false,
        }
    }

    /// Booleans are stored as the strings `"true"` / `"false"` (enum-like
    /// columns); every other value passes through untouched.
    pub fn literalize_bool(self) -> Self {
        match self {
            Value::Bool(b) => Value::String(if b { "true" } else { "false" }.to_string()),
            other => other,
        }
    }

    /// Textual content of the value. Bytes are read as UTF-8, with invalid
    /// sequences replaced.
    pub fn into_text(self) -> String {
        match self {
            Value::String(s) => s,
            Value::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            other => other.literalize_bool().to_string(),
        }
    }

    /// Get the string form of textual values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I64(i) => write!(f, "{i}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Declared type of a bound parameter, handed to the driver alongside the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParamType {
    #[default]
    Str,
    Int,
    Bool,
    Null,
    Lob,
}

impl ParamType {
    /// Default declared type for a value bound without an explicit one
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::I64(_) => ParamType::Int,
            Value::Null => ParamType::Null,
            Value::Bytes(_) => ParamType::Lob,
            Value::Bool(_) | Value::F64(_) | Value::String(_) => ParamType::Str,
        }
    }
}

/// A value together with its declared type
#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    pub value: Value,
    pub ty: ParamType,
}

/// Bind `value` with an explicit declared type instead of the inferred one.
///
/// ```
/// use sqlchain_core::{select, typed, ParamType};
///
/// let query = select("Users").eq("age", typed("42", ParamType::Int));
/// assert_eq!(query.parameters()[0].ty, ParamType::Int);
/// ```
pub fn typed(value: impl Into<Value>, ty: ParamType) -> Bind {
    Bind {
        value: value.into(),
        ty,
    }
}

/// Conversion accepted by every value-binding builder method
pub trait IntoBind {
    fn into_bind(self) -> Bind;
}

impl IntoBind for Bind {
    fn into_bind(self) -> Bind {
        self
    }
}

impl<T> IntoBind for Option<T>
where
    T: Into<Value>,
{
    fn into_bind(self) -> Bind {
        let value: Value = self.into();
        let ty = ParamType::infer(&value);
        Bind { value, ty }
    }
}

macro_rules! into_bind_inferred {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoBind for $ty {
                fn into_bind(self) -> Bind {
                    let value: Value = self.into();
                    let ty = ParamType::infer(&value);
                    Bind { value, ty }
                }
            }
        )*
    };
}

into_bind_inferred!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, &String, Vec<u8>,
);

#[cfg(feature = "datetime-support")]
into_bind_inferred!(
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
);

#[cfg(feature = "decimal-support")]
into_bind_inferred!(rust_decimal::Decimal);

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Self {
                    Value::I64(i64::from(val))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F64(f64::from(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.format("%Y-%m-%d").to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::String(val.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}
