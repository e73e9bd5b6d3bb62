//! SQL values and parameter handling.
//!
//! Every bound parameter and every result cell travels as a [`SqlValue`].
//! [`ToSqlValue`] and [`FromSqlValue`] convert between it and Rust types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A SQL value that can be used as a parameter or read from a result row.
#[derive(Debug, Clone, PartialEq)]
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
    /// UUID value.
    Uuid(Uuid),
    /// Timestamp with time zone, normalized to UTC.
    Timestamp(DateTime<Utc>),
    /// JSON or JSONB document.
    Json(serde_json::Value),
    /// Array value carrying its element type.
    Array(SqlArray),
}

/// An array parameter.
///
/// The element type travels with the items so that an empty array can still
/// be bound with the right SQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlArray {
    pub element_type: &'static str,
    pub items: Vec<SqlValue>,
}

impl SqlValue {
    /// Short name of the variant, used in decode errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::Json(_) => "json",
            Self::Array(_) => "array",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Quotes a string as a SQL literal, doubling embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A PostgreSQL interval in its textual form, e.g. `5 minutes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval(pub String);

/// A JSONB document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Jsonb(pub serde_json::Value);

/// A PostGIS geometry in EWKT form, e.g. `SRID=4326;POINT(-118 34)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry(pub String);

impl Geometry {
    /// Builds a WGS84 point.
    #[must_use]
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self(format!("SRID=4326;POINT({longitude} {latitude})"))
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Trait for types that can be read back from SQL values.
pub trait FromSqlValue: Sized {
    /// Converts a `SqlValue` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the value has the wrong shape.
    fn from_sql_value(value: SqlValue) -> Result<Self>;
}

/// Element types allowed inside a SQL array parameter.
pub trait ArrayElement: ToSqlValue + FromSqlValue {
    /// SQL name of the element type.
    const SQL_TYPE: &'static str;
}

fn mismatch<T>(value: &SqlValue) -> Error {
    Error::Decode {
        expected: std::any::type_name::<T>(),
        found: value.kind(),
    }
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        Ok(value)
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
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

macro_rules! from_int {
    ($($t:ty),*) => {$(
        impl FromSqlValue for $t {
            fn from_sql_value(value: SqlValue) -> Result<Self> {
                match value {
                    SqlValue::Int(n) => {
                        <$t>::try_from(n).map_err(|_| mismatch::<Self>(&SqlValue::Int(n)))
                    }
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

from_int!(i16, i32, i64);

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

impl FromSqlValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as Self),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        f64::from_sql_value(value).map(|f| f as Self)
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

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ToSqlValue for Uuid {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Uuid(self)
    }
}

impl FromSqlValue for Uuid {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Uuid(u) => Ok(u),
            SqlValue::Text(s) => {
                Self::parse_str(&s).map_err(|_| mismatch::<Self>(&SqlValue::Text(s)))
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Timestamp(t) => Ok(t),
            SqlValue::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| mismatch::<Self>(&SqlValue::Text(s))),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl FromSqlValue for serde_json::Value {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Json(j) => Ok(j),
            SqlValue::Text(s) => {
                serde_json::from_str(&s).map_err(|_| mismatch::<Self>(&SqlValue::Text(s)))
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl ToSqlValue for Jsonb {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self.0)
    }
}

impl FromSqlValue for Jsonb {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        serde_json::Value::from_sql_value(value).map(Self)
    }
}

impl ToSqlValue for Geometry {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.0)
    }
}

impl FromSqlValue for Geometry {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        String::from_sql_value(value).map(Self)
    }
}

impl ToSqlValue for Interval {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.0)
    }
}

impl FromSqlValue for Interval {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        String::from_sql_value(value).map(Self)
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

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

macro_rules! array_element {
    ($($t:ty => $sql:literal),* $(,)?) => {$(
        impl ArrayElement for $t {
            const SQL_TYPE: &'static str = $sql;
        }

        impl ToSqlValue for Vec<$t> {
            fn to_sql_value(self) -> SqlValue {
                SqlValue::Array(SqlArray {
                    element_type: <$t as ArrayElement>::SQL_TYPE,
                    items: self.into_iter().map(ToSqlValue::to_sql_value).collect(),
                })
            }
        }

        impl FromSqlValue for Vec<$t> {
            fn from_sql_value(value: SqlValue) -> Result<Self> {
                match value {
                    SqlValue::Array(array) => array
                        .items
                        .into_iter()
                        .map(<$t>::from_sql_value)
                        .collect(),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

array_element!(
    bool => "bool",
    i16 => "int2",
    i32 => "int4",
    i64 => "int8",
    f32 => "float4",
    f64 => "float8",
    String => "text",
    Uuid => "uuid",
    DateTime<Utc> => "timestamptz",
);
