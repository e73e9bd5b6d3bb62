//! JSONB construction helpers.

use serde_json::Value;

use super::expr::{ExprOps, TypedExpr};
use super::operand::Spatial;
use crate::ast::Expr;
use crate::schema::{Entity, Table};
use crate::value::{Jsonb, SqlArray, SqlValue, ToSqlValue};

/// `row_to_json("alias")`, or `row_to_json("table")` for an unaliased table.
#[must_use]
pub fn row_to_json<E: Entity>(table: &Table<E>) -> TypedExpr<Value> {
    let target = table.alias().map_or_else(
        || Expr::TableLiteral(table.table_ref()),
        |alias| Expr::AliasLiteral(alias.to_string()),
    );
    TypedExpr::from_expr(Expr::function("row_to_json", vec![target]))
}

/// `row_to_json("table")`
#[must_use]
pub fn row_to_json_table<E: Entity>() -> TypedExpr<Value> {
    TypedExpr::from_expr(Expr::function(
        "row_to_json",
        vec![Expr::TableLiteral(E::table().table_ref())],
    ))
}

/// `jsonb_build_object('key', value, ...)`
#[must_use]
pub fn jsonb_build_object<K, I>(pairs: I) -> TypedExpr<Jsonb>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Expr)>,
{
    TypedExpr::from_expr(Expr::BuildJsonb(
        pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    ))
}

/// `ST_AsGeoJson(geometry)`
#[must_use]
pub fn as_geo_json<R: Spatial, X: ExprOps<R>>(geometry: X) -> TypedExpr<Value> {
    TypedExpr::from_expr(Expr::function(
        "ST_AsGeoJson",
        vec![geometry.into_typed().into_expr()],
    ))
}

/// Turns a JSON value into a bindable operand.
///
/// Arrays become SQL arrays typed by their first element: strings give
/// `text[]`, numbers `float8[]`, anything else `jsonb[]`. An empty array is
/// `text[]`.
#[must_use]
pub fn jsonb_literal(value: Value) -> Expr {
    match value {
        Value::Array(items) => {
            let element_type = match items.first() {
                None | Some(Value::String(_)) => "text",
                Some(Value::Number(_)) => "float8",
                Some(_) => "jsonb",
            };
            Expr::Array(SqlArray {
                element_type,
                items: items
                    .into_iter()
                    .map(|item| array_item(element_type, item))
                    .collect(),
            })
        }
        Value::Null => Expr::Value(SqlValue::Null),
        Value::Bool(b) => Expr::Value(b.to_sql_value()),
        Value::Number(n) => Expr::Value(
            n.as_i64()
                .map(SqlValue::Int)
                .or_else(|| n.as_f64().map(SqlValue::Float))
                .unwrap_or(SqlValue::Null),
        ),
        Value::String(s) => Expr::Value(SqlValue::Text(s)),
        object @ Value::Object(_) => Expr::Value(SqlValue::Json(object)),
    }
}

fn array_item(element_type: &str, item: Value) -> SqlValue {
    match (element_type, item) {
        ("text", Value::String(s)) => SqlValue::Text(s),
        ("text", other) => SqlValue::Text(other.to_string()),
        ("float8", other) => other.as_f64().map_or(SqlValue::Null, SqlValue::Float),
        (_, other) => SqlValue::Json(other),
    }
}

pub(crate) fn build_from_map(map: serde_json::Map<String, Value>) -> Expr {
    Expr::BuildJsonb(
        map.into_iter()
            .map(|(key, value)| (key, jsonb_literal(value)))
            .collect(),
    )
}
