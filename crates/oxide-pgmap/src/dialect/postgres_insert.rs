//! INSERT generation for [`Postgres`].

use super::{Dialect, Fragment, InsertStatement, Postgres};
use crate::ast::{ConflictAction, Insert, InsertField, InsertSource, OnConflict};
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// A lowered row source: SQL text, the literal rows, and bound values.
struct Source<T> {
    sql: String,
    rows: Vec<T>,
    values: Vec<SqlValue>,
}

impl Postgres {
    pub(super) fn insert_statement<T: Clone>(
        &self,
        insert: &Insert<T>,
    ) -> Result<InsertStatement<T>> {
        let prefix = self.names().table_name(insert.table.entity)?;
        let columns: Vec<String> = insert
            .fields
            .iter()
            .map(|field| self.column_name(&field.column))
            .collect();

        let source = self.insert_source(&prefix, &insert.fields, &insert.source)?;
        let mut fragment = Fragment::new(
            format!(
                "INSERT INTO {} ({}){}",
                self.table_noun(&insert.table)?,
                columns.join(", "),
                source.sql
            ),
            source.values,
        );
        if let Some(conflict) = &insert.conflict {
            fragment.sql.push(' ');
            fragment.push(self.on_conflict(conflict)?);
        }
        if let Some(projections) = &insert.projections {
            let returning = projections
                .iter()
                .map(|p| self.projection(p))
                .collect::<Result<Vec<_>>>()?;
            fragment.sql.push_str(" RETURNING ");
            fragment.push(Fragment::join(returning, ", "));
        }

        Ok(InsertStatement {
            sql: fragment.sql,
            prefix,
            placeholder: self.parameter_placeholder(),
            rows: source.rows,
            values: fragment.values,
        })
    }

    fn insert_source<T: Clone>(
        &self,
        prefix: &str,
        fields: &[InsertField],
        source: &InsertSource<T>,
    ) -> Result<Source<T>> {
        match source {
            InsertSource::Rows(rows) => {
                if rows.is_empty() {
                    return Err(Error::construction("cannot insert without values"));
                }
                let tuples: Vec<String> = (0..rows.len())
                    .map(|index| {
                        let placeholders: Vec<String> = fields
                            .iter()
                            .map(|field| format!("#{prefix}{index}.{}", field.property))
                            .collect();
                        format!("({})", placeholders.join(", "))
                    })
                    .collect();
                Ok(Source {
                    sql: format!(" VALUES {}", tuples.join(", ")),
                    rows: rows.clone(),
                    values: vec![],
                })
            }
            InsertSource::Select(query) => {
                let select = self.query(query)?;
                Ok(Source {
                    sql: format!(" ({})", select.sql),
                    rows: vec![],
                    values: select.values,
                })
            }
        }
    }

    fn on_conflict(&self, conflict: &OnConflict) -> Result<Fragment> {
        let mut sql = String::from("ON CONFLICT ");
        if !conflict.targets.is_empty() {
            let targets: Vec<String> = conflict
                .targets
                .iter()
                .map(|column| self.column_name(column))
                .collect();
            sql.push_str(&format!("({}) ", targets.join(", ")));
        }
        match &conflict.action {
            ConflictAction::DoNothing => sql.push_str("DO NOTHING"),
            ConflictAction::DoUpdate(columns) => {
                if columns.is_empty() {
                    return Err(Error::construction("Cannot update without values"));
                }
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        let name = self.column_name(column);
                        format!("{name} = EXCLUDED.{name}")
                    })
                    .collect();
                sql.push_str(&format!("DO UPDATE SET {}", assignments.join(", ")));
            }
        }
        Ok(Fragment::literal(sql))
    }
}
