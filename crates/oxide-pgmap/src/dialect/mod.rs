//! SQL dialect support.
//!
//! A dialect lowers the statement AST into parameterized SQL text plus the
//! ordered list of values bound to its `?` placeholders. Only PostgreSQL is
//! provided.

mod postgres;
mod postgres_insert;

pub use postgres::Postgres;

use regex::Regex;

use crate::ast::{Delete, Expr, Insert, Query, Update};
use crate::error::{Error, Result};
use crate::schema::Entity;
use crate::value::SqlValue;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the parameter placeholder style.
    fn parameter_placeholder(&self) -> &'static str {
        "?"
    }

    /// Quotes an identifier.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Lowers a single expression.
    ///
    /// # Errors
    ///
    /// Fails on malformed nodes such as an empty CASE.
    fn expression(&self, expr: &Expr) -> Result<Fragment>;

    /// Lowers a SELECT query.
    ///
    /// # Errors
    ///
    /// Fails on malformed joins, CASE blocks or unresolvable names.
    fn select(&self, query: &Query) -> Result<SelectStatement>;

    /// Lowers an UPDATE statement.
    ///
    /// # Errors
    ///
    /// Fails when no column is assigned.
    fn update(&self, update: &Update) -> Result<UpdateStatement>;

    /// Lowers a DELETE statement.
    ///
    /// # Errors
    ///
    /// Fails on malformed WHERE expressions or unresolvable names.
    fn delete(&self, delete: &Delete) -> Result<DeleteStatement>;

    /// Lowers an INSERT statement.
    ///
    /// # Errors
    ///
    /// Fails when there are no rows or an empty conflict update list.
    fn insert<T: Clone>(&self, insert: &Insert<T>) -> Result<InsertStatement<T>>;
}

/// SQL text together with the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Fragment {
    #[must_use]
    pub fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// A fragment without bound values.
    #[must_use]
    pub fn literal(sql: impl Into<String>) -> Self {
        Self::new(sql, vec![])
    }

    /// Joins fragments with `separator`, concatenating their values.
    #[must_use]
    pub fn join(fragments: Vec<Self>, separator: &str) -> Self {
        let mut sql = Vec::with_capacity(fragments.len());
        let mut values = Vec::new();
        for fragment in fragments {
            sql.push(fragment.sql);
            values.extend(fragment.values);
        }
        Self::new(sql.join(separator), values)
    }

    /// Appends `other` verbatim.
    pub fn push(&mut self, other: Self) {
        self.sql.push_str(&other.sql);
        self.values.extend(other.values);
    }
}

/// A generated SELECT, carrying the query it came from for row mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
    pub query: Query,
}

/// A generated UPDATE, carrying the statement it came from for row mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
    pub update: Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// A generated INSERT.
///
/// Literal rows are referenced from the VALUES clause by placeholders of the
/// form `#<prefix><row>.<property>`; [`bind`](Self::bind) replaces them with
/// the dialect's placeholder and the property values of the matching row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement<T> {
    pub sql: String,
    /// The target table name.
    pub prefix: String,
    /// Parameter marker of the dialect that generated the statement.
    pub placeholder: &'static str,
    pub rows: Vec<T>,
    /// Values bound after the row placeholders (subquery, RETURNING).
    pub values: Vec<SqlValue>,
}

impl<T: Entity> InsertStatement<T> {
    /// Resolves row placeholders into parameter markers and their values.
    ///
    /// # Errors
    ///
    /// Fails if a placeholder names a row or property that does not exist.
    pub fn bind(&self) -> Result<Fragment> {
        let pattern = format!(r"#{}(\d+)\.(\w+)", regex::escape(&self.prefix));
        let pattern = Regex::new(&pattern).map_err(|e| Error::configuration(e.to_string()))?;
        let entity = T::descriptor().simple_name;

        let mut sql = String::with_capacity(self.sql.len());
        let mut values = Vec::new();
        let mut last = 0;
        for captures in pattern.captures_iter(&self.sql) {
            let (Some(whole), Some(index), Some(property)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            let row = index
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|i| self.rows.get(i))
                .ok_or_else(|| {
                    Error::configuration(format!("no row {} to bind", index.as_str()))
                })?;
            let value = row.property_value(property.as_str()).ok_or_else(|| {
                Error::configuration(format!("{entity} has no property {}", property.as_str()))
            })?;
            sql.push_str(&self.sql[last..whole.start()]);
            sql.push_str(self.placeholder);
            values.push(value);
            last = whole.end();
        }
        sql.push_str(&self.sql[last..]);
        values.extend(self.values.iter().cloned());
        Ok(Fragment::new(sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_join_concatenates_values() {
        let joined = Fragment::join(
            vec![
                Fragment::new("?", vec![SqlValue::Int(1)]),
                Fragment::literal("NULL"),
                Fragment::new("?", vec![SqlValue::Int(2)]),
            ],
            ", ",
        );
        assert_eq!(joined.sql, "?, NULL, ?");
        assert_eq!(joined.values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_quote_identifier_default() {
        assert_eq!(Postgres::new().quote_identifier("vehicle"), "\"vehicle\"");
    }
}
