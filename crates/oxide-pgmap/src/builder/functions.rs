//! Free-standing SQL functions and combinators.

use chrono::{DateTime, Utc};

use super::expr::{ExprOps, TypedExpr, TypedWhen};
use super::operand::IntoOperand;
use crate::ast::{Aggregate, AggregateFunction, Expr, Order, Query, WhenThen};
use crate::schema::{Entity, TypedColumn};
use crate::value::{Interval, SqlValue, ToSqlValue};

/// A bound literal typed as its Rust type.
#[must_use]
pub fn literal<T: ToSqlValue>(value: T) -> TypedExpr<T> {
    TypedExpr::from_expr(Expr::Value(value.to_sql_value()))
}

/// A bound array that keeps its element type even when empty.
#[must_use]
pub fn array<T>(items: Vec<T>) -> TypedExpr<Vec<T>>
where
    Vec<T>: ToSqlValue,
{
    TypedExpr::from_expr(Expr::value(items.to_sql_value()))
}

/// `*`
#[must_use]
pub const fn all() -> TypedExpr<SqlValue> {
    TypedExpr::from_expr(Expr::All(None))
}

/// Conjunction of the present conditions; `None` entries are skipped.
#[must_use]
pub fn and_all<I, C>(conditions: I) -> TypedExpr<bool>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<TypedExpr<bool>>>,
{
    TypedExpr::from_expr(Expr::And(present(conditions)))
}

/// Disjunction of the present conditions; `None` entries are skipped.
#[must_use]
pub fn or_all<I, C>(conditions: I) -> TypedExpr<bool>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<TypedExpr<bool>>>,
{
    TypedExpr::from_expr(Expr::Or(present(conditions)))
}

fn present<I, C>(conditions: I) -> Vec<Expr>
where
    I: IntoIterator<Item = C>,
    C: Into<Option<TypedExpr<bool>>>,
{
    conditions
        .into_iter()
        .filter_map(|c| c.into().map(TypedExpr::into_expr))
        .collect()
}

#[must_use]
pub fn not(condition: TypedExpr<bool>) -> TypedExpr<bool> {
    condition.inverse()
}

/// `CASE WHEN ... THEN ... [ELSE fallback] END`
#[must_use]
pub fn case<R, I>(branches: I, fallback: Option<TypedExpr<R>>) -> TypedExpr<R>
where
    I: IntoIterator<Item = TypedWhen<R>>,
{
    TypedExpr::from_expr(Expr::Case {
        branches: collect_branches(branches),
        fallback: fallback.map(|f| Box::new(f.into_expr())),
    })
}

/// `CASE WHEN ... THEN ... ELSE fallback END` with a bound fallback.
#[must_use]
pub fn case_or<R, I, O>(branches: I, fallback: O) -> TypedExpr<R>
where
    I: IntoIterator<Item = TypedWhen<R>>,
    O: IntoOperand<R>,
{
    TypedExpr::from_expr(Expr::Case {
        branches: collect_branches(branches),
        fallback: Some(Box::new(fallback.into_operand())),
    })
}

/// An ORDER BY term ranking rows by the first matching branch.
#[must_use]
pub fn case_order<I>(branches: I) -> Order
where
    I: IntoIterator<Item = TypedWhen<i32>>,
{
    Order::Case(collect_branches(branches))
}

fn collect_branches<R, I: IntoIterator<Item = TypedWhen<R>>>(branches: I) -> Vec<WhenThen> {
    branches.into_iter().map(TypedWhen::into_branch).collect()
}

#[must_use]
pub fn exists(query: Query) -> TypedExpr<bool> {
    exists_expr(query, None, false)
}

#[must_use]
pub fn not_exists(query: Query) -> TypedExpr<bool> {
    exists_expr(query, None, true)
}

/// `EXISTS (subquery) alias`
#[must_use]
pub fn exists_as(query: Query, alias: impl Into<String>) -> TypedExpr<bool> {
    exists_expr(query, Some(alias.into()), false)
}

fn exists_expr(query: Query, alias: Option<String>, negated: bool) -> TypedExpr<bool> {
    TypedExpr::from_expr(Expr::Exists {
        query: Box::new(query),
        alias,
        negated,
    })
}

/// `name(expression)`
#[must_use]
pub fn aggregate<R, X: ExprOps<R>>(name: &str, expression: X) -> Aggregate {
    Aggregate {
        function: AggregateFunction {
            name: name.to_string(),
            expression: expression.into_typed().into_expr(),
            arguments: vec![],
        },
        alias: None,
        unnested: false,
    }
}

/// `count(*)`
#[must_use]
pub fn count_all() -> Aggregate {
    aggregate("count", all())
}

/// `count(DISTINCT "column")`
#[must_use]
pub fn count_distinct<E: Entity, R>(column: TypedColumn<E, R>) -> Aggregate {
    aggregate::<SqlValue, _>(
        "count",
        TypedExpr::from_expr(Expr::Distinct(column.column_ref())),
    )
}

/// Calls an arbitrary SQL function.
#[must_use]
pub fn sql_function<R>(name: &str, args: Vec<Expr>) -> TypedExpr<R> {
    TypedExpr::from_expr(Expr::function(name, args))
}

#[must_use]
pub fn now() -> TypedExpr<DateTime<Utc>> {
    sql_function("now", vec![])
}

#[must_use]
pub fn coalesce<R, I: IntoIterator<Item = TypedExpr<R>>>(args: I) -> TypedExpr<R> {
    variadic("coalesce", args)
}

#[must_use]
pub fn least<R, I: IntoIterator<Item = TypedExpr<R>>>(args: I) -> TypedExpr<R> {
    variadic("least", args)
}

#[must_use]
pub fn greatest<R, I: IntoIterator<Item = TypedExpr<R>>>(args: I) -> TypedExpr<R> {
    variadic("greatest", args)
}

fn variadic<R, I: IntoIterator<Item = TypedExpr<R>>>(name: &str, args: I) -> TypedExpr<R> {
    sql_function(name, args.into_iter().map(TypedExpr::into_expr).collect())
}

/// `interval 'value'`, rendered inline rather than bound.
#[must_use]
pub fn interval(value: &str) -> TypedExpr<Interval> {
    TypedExpr::from_expr(Expr::Constructor {
        type_name: String::from("interval"),
        value: value.to_string(),
    })
}
