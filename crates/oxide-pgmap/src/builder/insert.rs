//! INSERT construction.

use std::marker::PhantomData;

use crate::ast::{
    ColumnRef, ConflictAction, Insert, InsertField, InsertSource, OnConflict, Projection, Query,
    TableRef,
};
use crate::schema::{Entity, Table, TypedColumn};

/// Marker: no column listed yet.
pub struct NoColumns;
/// Marker: at least one column listed.
pub struct HasColumns;

/// An INSERT under construction for entity `E`.
pub struct InsertBuilder<E, State = NoColumns> {
    table: TableRef,
    fields: Vec<InsertField>,
    _state: PhantomData<fn() -> (E, State)>,
}

impl<E: Entity> Table<E> {
    #[must_use]
    pub fn insert(&self) -> InsertBuilder<E, NoColumns> {
        InsertBuilder {
            table: self.table_ref(),
            fields: vec![],
            _state: PhantomData,
        }
    }
}

impl<E: Entity, State> InsertBuilder<E, State> {
    /// Lists one column, read from the property of the same name.
    #[must_use]
    pub fn column<R>(mut self, column: TypedColumn<E, R>) -> InsertBuilder<E, HasColumns> {
        self.fields.push(InsertField {
            property: column.property(),
            column: column.column_ref(),
        });
        self.advance()
    }

    /// Lists every non-transient property in declaration order.
    #[must_use]
    pub fn all_columns(mut self) -> InsertBuilder<E, HasColumns> {
        let table = self.table.clone();
        self.fields.extend(
            E::descriptor()
                .properties
                .iter()
                .filter(|p| !p.transient)
                .map(|p| InsertField {
                    column: ColumnRef {
                        table: table.clone(),
                        property: p.name,
                    },
                    property: p.name,
                }),
        );
        self.advance()
    }

    fn advance(self) -> InsertBuilder<E, HasColumns> {
        InsertBuilder {
            table: self.table,
            fields: self.fields,
            _state: PhantomData,
        }
    }
}

impl<E: Entity> InsertBuilder<E, HasColumns> {
    /// `VALUES (...), (...)`, one tuple per row.
    #[must_use]
    pub fn values<I: IntoIterator<Item = E>>(self, rows: I) -> Insert<E> {
        self.finish(InsertSource::Rows(rows.into_iter().collect()))
    }

    /// `(SELECT ...)` as the row source.
    #[must_use]
    pub fn from_query(self, query: Query) -> Insert<E> {
        self.finish(InsertSource::Select(Box::new(query)))
    }

    fn finish(self, source: InsertSource<E>) -> Insert<E> {
        Insert {
            table: self.table,
            fields: self.fields,
            source,
            conflict: None,
            projections: None,
        }
    }
}

/// An `ON CONFLICT` clause awaiting its action.
pub struct ConflictBuilder<T> {
    insert: Insert<T>,
    targets: Vec<ColumnRef>,
}

impl<T> ConflictBuilder<T> {
    /// `DO NOTHING`
    #[must_use]
    pub fn do_nothing(self) -> Insert<T> {
        self.finish(ConflictAction::DoNothing)
    }

    /// `DO UPDATE SET "c" = EXCLUDED."c"` for each column, in order.
    #[must_use]
    pub fn do_update<I: IntoIterator<Item = ColumnRef>>(self, columns: I) -> Insert<T> {
        self.finish(ConflictAction::DoUpdate(columns.into_iter().collect()))
    }

    fn finish(self, action: ConflictAction) -> Insert<T> {
        Insert {
            conflict: Some(OnConflict {
                targets: self.targets,
                action,
            }),
            ..self.insert
        }
    }
}

impl<T> Insert<T> {
    /// `ON CONFLICT [(targets)]`; an empty target list omits the parentheses.
    #[must_use]
    pub fn on_conflict<I: IntoIterator<Item = ColumnRef>>(self, targets: I) -> ConflictBuilder<T> {
        ConflictBuilder {
            insert: self,
            targets: targets.into_iter().collect(),
        }
    }

    /// Appends RETURNING projections.
    #[must_use]
    pub fn returning<I: IntoIterator<Item = Projection>>(mut self, projections: I) -> Self {
        self.projections
            .get_or_insert_with(Vec::new)
            .extend(projections);
        self
    }
}
