//! Table and column name resolution.
//!
//! Names come from `#[table(name = ...)]` / `#[column(name = ...)]` overrides
//! or, failing that, from the Rust identifier split on lowercase-to-uppercase
//! boundaries. Results are memoized for the lifetime of the resolver.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::trace;

use crate::ast::{ColumnRef, IntoField};
use crate::error::{Error, Result};
use crate::schema::EntityDescriptor;

/// Converts `camelCase` / `PascalCase` to `snake_case`.
///
/// A boundary is inserted only between an ASCII lowercase letter and an ASCII
/// uppercase letter, so runs of capitals stay together: `AA` becomes `aa`.
#[must_use]
pub fn to_underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if previous_lower && c.is_ascii_uppercase() {
            out.push('_');
        }
        previous_lower = c.is_ascii_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

/// Which join sentinel to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sentinel {
    Start,
    End,
}

impl Sentinel {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// Memoizing resolver for table names, column names and join sentinels.
///
/// Share one instance (behind an `Arc`) between the generator and the mapper.
/// Each cache is filled with a read-check, compute, write-if-absent sequence
/// so that computing a name never runs under a held lock.
#[derive(Debug, Default)]
pub struct NameResolver {
    tables: RwLock<HashMap<&'static str, String>>,
    columns: RwLock<HashMap<String, String>>,
    sentinels: RwLock<HashMap<String, String>>,
}

impl NameResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the table name of `entity`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the entity has no derivable name.
    pub fn table_name(&self, entity: &'static EntityDescriptor) -> Result<String> {
        if entity.type_name.is_empty() {
            return Err(missing_name());
        }
        if let Some(name) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity.type_name)
        {
            return Ok(name.clone());
        }
        let name = match entity.table_name {
            Some(name) => name.to_string(),
            None if entity.simple_name.is_empty() => return Err(missing_name()),
            None => to_underscore(entity.simple_name),
        };
        trace!(entity = entity.type_name, table = %name, "resolved table name");
        Ok(self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(entity.type_name)
            .or_insert(name)
            .clone())
    }

    /// Resolves the column name of `column`.
    ///
    /// A parameter override wins over a property override, which wins over
    /// the underscore convention.
    #[must_use]
    pub fn column_name(&self, column: &ColumnRef) -> String {
        let key = column_key(column);
        if let Some(name) = self
            .columns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return name.clone();
        }
        let entity = column.table.entity;
        let name = entity
            .parameter(column.property)
            .and_then(|p| p.column)
            .or_else(|| entity.property(column.property).and_then(|p| p.column))
            .map_or_else(|| to_underscore(column.property), str::to_string);
        trace!(entity = entity.type_name, column = %name, "resolved column name");
        self.columns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(name)
            .clone()
    }

    /// Label of the sentinel column opening a join's columns.
    #[must_use]
    pub fn join_start(&self, into: &IntoField) -> String {
        self.sentinel(into, Sentinel::Start)
    }

    /// Label of the sentinel column closing a join's columns.
    #[must_use]
    pub fn join_end(&self, into: &IntoField) -> String {
        self.sentinel(into, Sentinel::End)
    }

    fn sentinel(&self, into: &IntoField, which: Sentinel) -> String {
        let key = format!("{}|{}", which.prefix(), column_key(&into.column));
        if let Some(label) = self
            .sentinels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return label.clone();
        }
        let label = format!("{}:{}", which.prefix(), self.column_name(&into.column));
        self.sentinels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(label)
            .clone()
    }
}

fn column_key(column: &ColumnRef) -> String {
    format!("{}|{}", column.table.entity.type_name, column.property)
}

fn missing_name() -> Error {
    Error::configuration("Entity class must have name!")
}
