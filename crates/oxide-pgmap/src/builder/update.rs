//! UPDATE construction.
//!
//! The builder only yields an [`Update`] once at least one column is set and
//! the WHERE clause has been decided, either with
//! [`where_clause`](UpdateBuilder::where_clause) or explicitly with
//! [`all`](UpdateBuilder::all).

use std::marker::PhantomData;

use super::expr::{ExprOps, TypedExpr};
use super::operand::IntoOperand;
use crate::ast::{Expr, IntoField, Projection, Query, TableRef, Update, UpdateField, UpdateFrom};
use crate::schema::{Entity, Table, TypedColumn};

/// Marker: no column assigned yet.
pub struct NoSet;
/// Marker: at least one column assigned.
pub struct HasSet;

/// An UPDATE under construction for entity `E`.
pub struct UpdateBuilder<E, State = NoSet> {
    table: TableRef,
    fields: Vec<UpdateField>,
    from: UpdateFrom,
    _state: PhantomData<fn() -> (E, State)>,
}

impl<E: Entity> Table<E> {
    #[must_use]
    pub fn update(&self) -> UpdateBuilder<E, NoSet> {
        UpdateBuilder {
            table: self.table_ref(),
            fields: vec![],
            from: UpdateFrom::None,
            _state: PhantomData,
        }
    }
}

impl<E: Entity, State> UpdateBuilder<E, State> {
    fn push<R, O: IntoOperand<R>>(
        mut self,
        column: TypedColumn<E, R>,
        value: O,
    ) -> UpdateBuilder<E, HasSet> {
        self.fields.push(UpdateField {
            column: column.column_ref(),
            expression: value.into_operand(),
        });
        UpdateBuilder {
            table: self.table,
            fields: self.fields,
            from: self.from,
            _state: PhantomData,
        }
    }

    /// `SET "column" = value`. A `None` value renders `NULL`.
    #[must_use]
    pub fn set<R, O: IntoOperand<R>>(
        self,
        column: TypedColumn<E, R>,
        value: O,
    ) -> UpdateBuilder<E, HasSet> {
        self.push(column, value)
    }

    /// `FROM "a", "b"` by table name.
    #[must_use]
    pub fn from_tables<I: IntoIterator<Item = TableRef>>(self, tables: I) -> Self {
        Self {
            from: UpdateFrom::Tables(tables.into_iter().collect()),
            ..self
        }
    }

    /// `FROM "a" "x", "b" "y"` keeping aliases.
    #[must_use]
    pub fn from_aliased<I: IntoIterator<Item = TableRef>>(self, tables: I) -> Self {
        Self {
            from: UpdateFrom::AliasedTables(tables.into_iter().collect()),
            ..self
        }
    }

    /// `FROM (query) "alias"`
    #[must_use]
    pub fn from_query(self, query: Query, alias: impl Into<String>) -> Self {
        Self {
            from: UpdateFrom::SubQuery {
                query: Box::new(query),
                alias: alias.into(),
            },
            ..self
        }
    }

    /// `FROM (query) "autogenerated_alias"`, correlated only through WHERE.
    #[must_use]
    pub fn from_query_ignored_alias(self, query: Query) -> Self {
        Self {
            from: UpdateFrom::SubQueryIgnoredAlias(Box::new(query)),
            ..self
        }
    }
}

impl<E: Entity> UpdateBuilder<E, HasSet> {
    /// `SET "column" = value`, skipped entirely when `value` is `None`.
    #[must_use]
    pub fn set_if_some<R, O: IntoOperand<R>>(
        self,
        column: TypedColumn<E, R>,
        value: Option<O>,
    ) -> Self {
        match value {
            Some(value) => self.push(column, value),
            None => self,
        }
    }

    /// Finishes with a WHERE clause.
    #[must_use]
    pub fn where_clause(self, condition: TypedExpr<bool>) -> Update {
        self.finish(Some(condition.into_expr()))
    }

    /// Finishes without a WHERE clause, updating every row.
    #[must_use]
    pub fn all(self) -> Update {
        self.finish(None)
    }

    fn finish(self, where_clause: Option<Expr>) -> Update {
        Update {
            table: self.table,
            fields: self.fields,
            where_clause,
            from: self.from,
            into_fields: vec![],
            projections: None,
        }
    }
}

impl Update {
    /// Appends RETURNING projections.
    #[must_use]
    pub fn returning<I: IntoIterator<Item = Projection>>(mut self, projections: I) -> Self {
        self.projections
            .get_or_insert_with(Vec::new)
            .extend(projections);
        self
    }

    /// `RETURNING *`
    #[must_use]
    pub fn returning_all(self) -> Self {
        self.returning([super::functions::all().project()])
    }

    /// Returns the joined `T` (already present in FROM) inside `column`.
    #[must_use]
    pub fn returning_into<O: Entity, T: Entity>(
        mut self,
        column: TypedColumn<O, Option<T>>,
    ) -> Self {
        self.into_fields.push(IntoField {
            target: T::descriptor(),
            column: column.column_ref(),
        });
        self.projections.get_or_insert_with(Vec::new);
        self
    }
}
