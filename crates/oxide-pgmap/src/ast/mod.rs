//! Abstract Syntax Tree types for queries and statements.

mod expression;
mod query;
mod statement;
pub mod visit;

pub use expression::{
    ArithmeticOp, ArrayOp, ColumnRef, ComparisonOp, DateOp, Expr, IsValue, JsonOp, PatternOp,
    TableRef, WhenThen,
};
pub use query::{
    Aggregate, AggregateFunction, From, IntoField, Join, JoinKind, NullsOrder, Order, Projection,
    Query, SubQuery,
};
pub use statement::{
    ConflictAction, Delete, Insert, InsertField, InsertSource, OnConflict, Update, UpdateField,
    UpdateFrom,
};
