//! SELECT construction: table entry points, query modifiers and joins.

use super::expr::{ExprOps, TypedExpr};
use super::functions::{count_all, count_distinct};
use crate::ast::{
    ColumnRef, Expr, From, IntoField, Join, JoinKind, Order, Projection, Query, SubQuery,
};
use crate::error::{Error, Result};
use crate::schema::{Entity, Table, TypedColumn};
use crate::value::SqlValue;

impl<E: Entity> Table<E> {
    fn from_self(&self, projections: Vec<Projection>) -> Query {
        Query {
            projections,
            from: vec![From::Table(self.table_ref())],
            ..Query::default()
        }
    }

    /// A query over this table with no projections yet.
    #[must_use]
    pub fn query(&self) -> Query {
        self.from_self(vec![])
    }

    #[must_use]
    pub fn select<I: IntoIterator<Item = Projection>>(&self, projections: I) -> Query {
        self.from_self(projections.into_iter().collect())
    }

    #[must_use]
    pub fn select_aggregates<I>(&self, aggregates: I) -> Query
    where
        I: IntoIterator<Item = crate::ast::Aggregate>,
    {
        Query {
            aggregates: aggregates.into_iter().collect(),
            ..self.query()
        }
    }

    /// `SELECT "t".* FROM ...`
    #[must_use]
    pub fn select_all(&self) -> Query {
        self.from_self(vec![self.project_all()])
    }

    /// `SELECT ? FROM ...` with the value `1`.
    #[must_use]
    pub fn select_one(&self) -> Query {
        self.from_self(vec![Projection::new(Expr::Value(SqlValue::Int(1)))])
    }

    /// Selects the columns of this table whose properties also exist, and are
    /// not transient, on `U`.
    #[must_use]
    pub fn select_all_of<U: Entity>(&self) -> Query {
        let wanted = U::descriptor();
        let table = self.table_ref();
        let projections = E::descriptor()
            .properties
            .iter()
            .filter(|p| {
                wanted
                    .properties
                    .iter()
                    .any(|w| w.name == p.name && !w.transient)
            })
            .map(|p| {
                Projection::new(Expr::Column(ColumnRef {
                    table: table.clone(),
                    property: p.name,
                }))
            })
            .collect();
        self.from_self(projections)
    }

    /// `SELECT count(*) FROM ...`
    #[must_use]
    pub fn select_count(&self) -> Query {
        self.select_aggregates([count_all()])
    }

    /// `SELECT count(DISTINCT "column") [AS alias] FROM ...`
    #[must_use]
    pub fn select_count_distinct<R>(
        &self,
        column: TypedColumn<E, R>,
        alias: Option<&str>,
    ) -> Query {
        let aggregate = count_distinct(self.col(column));
        let aggregate = match alias {
            Some(alias) => aggregate.project_as(alias),
            None => aggregate,
        };
        self.select_aggregates([aggregate])
    }

    /// `"t".*`
    #[must_use]
    pub fn all(&self) -> TypedExpr<SqlValue> {
        TypedExpr::from_expr(Expr::All(Some(self.table_ref())))
    }

    #[must_use]
    pub fn project_all(&self) -> Projection {
        self.all().project()
    }
}

impl Query {
    #[must_use]
    pub fn distinct(self) -> Self {
        Self {
            distinct: true,
            ..self
        }
    }

    /// ORDER BY RANDOM(), replacing any explicit ordering.
    #[must_use]
    pub fn random(self) -> Self {
        Self {
            random: true,
            ..self
        }
    }

    /// Sets or clears the WHERE clause.
    #[must_use]
    pub fn where_clause(self, condition: impl Into<Option<TypedExpr<bool>>>) -> Self {
        Self {
            where_clause: condition.into().map(TypedExpr::into_expr),
            ..self
        }
    }

    /// Replaces the projections and groups by them.
    #[must_use]
    pub fn group_by<I: IntoIterator<Item = Projection>>(self, projections: I) -> Self {
        Self {
            projections: projections.into_iter().collect(),
            grouped: true,
            ..self
        }
    }

    #[must_use]
    pub fn distinct_on<I: IntoIterator<Item = Projection>>(self, projections: I) -> Self {
        Self {
            distinct_on: Some(projections.into_iter().collect()),
            ..self
        }
    }

    #[must_use]
    pub fn order_by<I: IntoIterator<Item = Order>>(self, order: I) -> Self {
        Self {
            order: Some(order.into_iter().collect()),
            ..self
        }
    }

    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    /// Sets the offset to `page * limit`.
    ///
    /// # Errors
    ///
    /// Fails if no limit was set or the offset overflows.
    pub fn page(self, page: u64) -> Result<Self> {
        let limit = self
            .limit
            .ok_or_else(|| Error::construction("page requires a limit"))?;
        let offset = page
            .checked_mul(limit)
            .ok_or_else(|| Error::construction("page offset overflows"))?;
        Ok(self.offset(offset))
    }

    /// Wraps this query for use as a FROM item.
    #[must_use]
    pub fn sub_query(self, alias: impl Into<String>) -> SubQuery {
        SubQuery {
            query: Box::new(self),
            alias: Some(alias.into()),
        }
    }

    /// Adds a FROM item.
    #[must_use]
    pub fn from_item(mut self, from: From) -> Self {
        self.from.push(from);
        self
    }

    #[must_use]
    pub fn join(self, join: Join) -> Self {
        self.push_join(join, JoinKind::Inner)
    }

    #[must_use]
    pub fn left_join(self, join: Join) -> Self {
        self.push_join(join, JoinKind::Left)
    }

    #[must_use]
    pub fn right_join(self, join: Join) -> Self {
        self.push_join(join, JoinKind::Right)
    }

    #[must_use]
    pub fn full_join(self, join: Join) -> Self {
        self.push_join(join, JoinKind::Full)
    }

    fn push_join(self, join: Join, kind: JoinKind) -> Self {
        self.from_item(From::Join(Join { kind, ..join }))
    }

    fn into_join(self) -> Join {
        Join {
            query: Box::new(self),
            kind: JoinKind::Inner,
            into_field: None,
            on: None,
            using: None,
            alias: None,
        }
    }

    /// Turns this query into a join target matched `ON condition`.
    #[must_use]
    pub fn on(self, condition: TypedExpr<bool>) -> Join {
        self.into_join().on(condition)
    }

    /// Turns this query into a join against `(query) "alias"`.
    #[must_use]
    pub fn on_alias(self, condition: TypedExpr<bool>, alias: impl Into<String>) -> Join {
        Join {
            alias: Some(alias.into()),
            ..self.on(condition)
        }
    }

    /// Turns this query into a join matched `USING "c1", "c2"`.
    #[must_use]
    pub fn using<I: IntoIterator<Item = ColumnRef>>(self, columns: I) -> Join {
        self.into_join().using(columns)
    }

    /// Turns this query into a join whose rows populate `column`.
    #[must_use]
    pub fn into_field<O: Entity, T: Entity>(self, column: TypedColumn<O, Option<T>>) -> Join {
        self.into_join().into_field(column)
    }
}

impl Join {
    #[must_use]
    pub fn on(self, condition: TypedExpr<bool>) -> Self {
        Self {
            on: Some(condition.into_expr()),
            ..self
        }
    }

    #[must_use]
    pub fn using<I: IntoIterator<Item = ColumnRef>>(self, columns: I) -> Self {
        Self {
            using: Some(columns.into_iter().collect()),
            ..self
        }
    }

    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self
        }
    }

    /// Populates `column` of the outer entity with the joined `T`.
    #[must_use]
    pub fn into_field<O: Entity, T: Entity>(self, column: TypedColumn<O, Option<T>>) -> Self {
        Self {
            into_field: Some(IntoField {
                target: T::descriptor(),
                column: column.column_ref(),
            }),
            ..self
        }
    }
}
