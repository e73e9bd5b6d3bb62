use std::fmt;
use std::marker::PhantomData;

use super::Entity;
use crate::ast::{ColumnRef, TableRef};

/// A typed handle to one property of entity `E` whose values have type `R`.
///
/// Generated by `#[derive(Entity)]` as `E::field()`. Re-target it to an alias
/// with [`Table::col`].
pub struct TypedColumn<E, R> {
    property: &'static str,
    alias: Option<String>,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E, R> TypedColumn<E, R> {
    #[must_use]
    pub const fn new(property: &'static str) -> Self {
        Self {
            property,
            alias: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn property(&self) -> &'static str {
        self.property
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl<E: Entity, R> TypedColumn<E, R> {
    #[must_use]
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef {
            table: TableRef {
                entity: E::descriptor(),
                alias: self.alias.clone(),
            },
            property: self.property,
        }
    }
}

impl<E, R> Clone for TypedColumn<E, R> {
    fn clone(&self) -> Self {
        Self {
            property: self.property,
            alias: self.alias.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, R> fmt::Debug for TypedColumn<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedColumn")
            .field("property", &self.property)
            .field("alias", &self.alias)
            .finish()
    }
}

impl<E: Entity, R> From<TypedColumn<E, R>> for ColumnRef {
    fn from(column: TypedColumn<E, R>) -> Self {
        column.column_ref()
    }
}

/// A typed handle to the table of entity `E`, optionally aliased.
pub struct Table<E> {
    alias: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Table<E> {
    pub(crate) const fn new() -> Self {
        Self {
            alias: None,
            _entity: PhantomData,
        }
    }

    pub(crate) fn with_alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            entity: E::descriptor(),
            alias: self.alias.clone(),
        }
    }

    /// Re-targets `column` so it renders under this table's alias.
    #[must_use]
    pub fn col<R>(&self, column: TypedColumn<E, R>) -> TypedColumn<E, R> {
        TypedColumn {
            alias: self.alias.clone(),
            ..column
        }
    }
}

impl<E> Clone for Table<E> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Table<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("alias", &self.alias).finish()
    }
}

impl<E: Entity> From<&Table<E>> for TableRef {
    fn from(table: &Table<E>) -> Self {
        table.table_ref()
    }
}
