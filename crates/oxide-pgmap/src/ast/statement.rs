//! UPDATE, INSERT and DELETE statement AST types.

use super::{ColumnRef, Expr, IntoField, Projection, Query, TableRef};

/// One `"column" = expression` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateField {
    pub column: ColumnRef,
    pub expression: Expr,
}

/// The FROM clause of an UPDATE.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UpdateFrom {
    #[default]
    None,
    /// Tables rendered by name, ignoring aliases.
    Tables(Vec<TableRef>),
    /// Tables rendered with their aliases.
    AliasedTables(Vec<TableRef>),
    SubQuery {
        query: Box<Query>,
        alias: String,
    },
    /// A subquery correlated through the WHERE clause only; rendered under a
    /// fixed alias.
    SubQueryIgnoredAlias(Box<Query>),
}

impl UpdateFrom {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableRef,
    pub fields: Vec<UpdateField>,
    pub where_clause: Option<Expr>,
    pub from: UpdateFrom,
    /// Joined tables returned as nested objects.
    pub into_fields: Vec<IntoField>,
    /// RETURNING projections; `None` omits the clause.
    pub projections: Option<Vec<Projection>>,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: TableRef,
    pub where_clause: Option<Expr>,
}

/// An inserted column together with the property it is read from.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertField {
    pub column: ColumnRef,
    pub property: &'static str,
}

/// Where inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource<T> {
    Rows(Vec<T>),
    Select(Box<Query>),
}

/// What to do when an inserted row conflicts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    /// `SET "c" = EXCLUDED."c"` for each column.
    DoUpdate(Vec<ColumnRef>),
}

/// `ON CONFLICT [(targets)] action`.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub targets: Vec<ColumnRef>,
    pub action: ConflictAction,
}

/// An INSERT statement over rows of type `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert<T> {
    pub table: TableRef,
    pub fields: Vec<InsertField>,
    pub source: InsertSource<T>,
    pub conflict: Option<OnConflict>,
    pub projections: Option<Vec<Projection>>,
}
