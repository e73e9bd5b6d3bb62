//! SELECT query AST types.

use super::{ColumnRef, Expr, TableRef, WhenThen};
use crate::schema::EntityDescriptor;
use crate::value::SqlValue;

/// A selected expression, optionally aliased.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expression: Expr,
    pub alias: Option<String>,
}

impl Projection {
    #[must_use]
    pub const fn new(expression: Expr) -> Self {
        Self {
            expression,
            alias: None,
        }
    }
}

/// An aggregate call: `name(expression, arguments...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFunction {
    pub name: String,
    pub expression: Expr,
    /// Extra literal arguments, bound after the expression.
    pub arguments: Vec<SqlValue>,
}

/// A selected aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub alias: Option<String>,
    /// Render as `unnest(function)`.
    pub unnested: bool,
}

/// Placement of NULLs in an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Expression {
        expression: Expr,
        descending: bool,
        nulls: Option<NullsOrder>,
    },
    /// `CASE WHEN ... THEN ... END` ranking.
    Case(Vec<WhenThen>),
}

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// Designates the property that receives a joined sub-object.
#[derive(Debug, Clone, PartialEq)]
pub struct IntoField {
    /// The entity built from the joined columns.
    pub target: &'static EntityDescriptor,
    /// The outer property that receives it.
    pub column: ColumnRef,
}

/// A joined query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub query: Box<Query>,
    pub kind: JoinKind,
    pub into_field: Option<IntoField>,
    pub on: Option<Expr>,
    pub using: Option<Vec<ColumnRef>>,
    /// Alias of the joined subquery; without it the join must target a
    /// single table.
    pub alias: Option<String>,
}

/// A parenthesized query in a FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub query: Box<Query>,
    pub alias: Option<String>,
}

/// A FROM clause item.
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    Table(TableRef),
    Join(Join),
    SubQuery(SubQuery),
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub projections: Vec<Projection>,
    pub aggregates: Vec<Aggregate>,
    pub from: Vec<From>,
    pub where_clause: Option<Expr>,
    pub order: Option<Vec<Order>>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// GROUP BY the projections.
    pub grouped: bool,
    pub distinct: bool,
    /// ORDER BY RANDOM(); suppresses `order`.
    pub random: bool,
    pub distinct_on: Option<Vec<Projection>>,
}

impl Query {
    /// Joins that carry an into-field, in FROM order.
    pub fn into_joins(&self) -> impl Iterator<Item = (&Join, &IntoField)> {
        self.from.iter().filter_map(|from| match from {
            From::Join(join) => join.into_field.as_ref().map(|into| (join, into)),
            From::Table(_) | From::SubQuery(_) => None,
        })
    }
}
