//! Operand conversion and type-class markers.
//!
//! Operators on a `TypedExpr<R>` accept anything implementing
//! [`IntoOperand<R>`]: a plain Rust value of type `R` (bound as a parameter),
//! a non-null value where `R` is `Option<_>`, another typed expression, or a
//! typed column. The marker traits restrict operators to the types PostgreSQL
//! accepts them for.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::TypedExpr;
use crate::ast::Expr;
use crate::schema::{Entity, TypedColumn};
use crate::value::{Geometry, Interval, Jsonb, SqlValue, ToSqlValue};

/// Converts a Rust value or typed expression into an operand of type `R`.
pub trait IntoOperand<R> {
    fn into_operand(self) -> Expr;
}

/// Types with a total order in SQL.
pub trait SqlComparable {}

/// Types supporting arithmetic.
pub trait Numeric {}

/// Text types supporting pattern matching.
pub trait Textual {}

/// Timestamp types.
pub trait Temporal {}

/// PostgreSQL arrays.
pub trait SqlCollection {}

/// JSON and JSONB documents.
pub trait JsonDocument {}

/// PostGIS geometries.
pub trait Spatial {}

macro_rules! marker {
    ($marker:ident: $($t:ty),* $(,)?) => {
        impl<T: $marker> $marker for Option<T> {}
        $(impl $marker for $t {})*
    };
}

marker!(SqlComparable: bool, i16, i32, i64, f32, f64, String, Uuid, DateTime<Utc>, Interval);
marker!(Numeric: i16, i32, i64, f32, f64);
marker!(Textual: String);
marker!(Temporal: DateTime<Utc>);
marker!(JsonDocument: Jsonb, serde_json::Value);
marker!(Spatial: Geometry);

impl<T: SqlCollection> SqlCollection for Option<T> {}

macro_rules! scalar_operand {
    ($($t:ty),* $(,)?) => {$(
        impl IntoOperand<$t> for $t {
            fn into_operand(self) -> Expr {
                Expr::Value(self.to_sql_value())
            }
        }

        impl IntoOperand<Option<$t>> for $t {
            fn into_operand(self) -> Expr {
                Expr::Value(self.to_sql_value())
            }
        }
    )*};
}

scalar_operand!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    Uuid,
    DateTime<Utc>,
    Interval,
    Jsonb,
    Geometry,
    serde_json::Value,
);

macro_rules! array_operand {
    ($($t:ty),* $(,)?) => {$(
        impl SqlCollection for Vec<$t> {}

        impl IntoOperand<Vec<$t>> for Vec<$t> {
            fn into_operand(self) -> Expr {
                Expr::value(self.to_sql_value())
            }
        }

        impl IntoOperand<Option<Vec<$t>>> for Vec<$t> {
            fn into_operand(self) -> Expr {
                Expr::Nullable(Box::new(Expr::value(self.to_sql_value())))
            }
        }
    )*};
}

array_operand!(bool, i16, i32, i64, f32, f64, String, Uuid, DateTime<Utc>);

/// A present-or-absent value of any bindable type, `None` binding `NULL`.
impl<T> IntoOperand<Option<T>> for Option<T>
where
    T: IntoOperand<T> + ToSqlValue,
{
    fn into_operand(self) -> Expr {
        Expr::value(self.to_sql_value())
    }
}

impl IntoOperand<String> for &str {
    fn into_operand(self) -> Expr {
        Expr::Value(self.to_sql_value())
    }
}

impl IntoOperand<Option<String>> for &str {
    fn into_operand(self) -> Expr {
        Expr::Value(self.to_sql_value())
    }
}

impl IntoOperand<Option<String>> for Option<&str> {
    fn into_operand(self) -> Expr {
        Expr::Value(self.map_or(SqlValue::Null, ToSqlValue::to_sql_value))
    }
}

/// An untyped value fits any operand position.
impl<R> IntoOperand<R> for SqlValue {
    fn into_operand(self) -> Expr {
        Expr::value(self)
    }
}

impl<R> IntoOperand<R> for TypedExpr<R> {
    fn into_operand(self) -> Expr {
        self.into_expr()
    }
}

impl<E: Entity, R> IntoOperand<R> for TypedColumn<E, R> {
    fn into_operand(self) -> Expr {
        Expr::Column(self.column_ref())
    }
}
