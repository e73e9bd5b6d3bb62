//! DELETE construction.

use std::marker::PhantomData;

use super::expr::TypedExpr;
use crate::ast::{Delete, TableRef};
use crate::schema::{Entity, Table};

/// A DELETE awaiting its WHERE decision.
///
/// Deleting every row must be spelled out with [`all`](Self::all).
pub struct DeleteBuilder<E> {
    table: TableRef,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Table<E> {
    #[must_use]
    pub fn delete(&self) -> DeleteBuilder<E> {
        DeleteBuilder {
            table: self.table_ref(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> DeleteBuilder<E> {
    #[must_use]
    pub fn where_clause(self, condition: TypedExpr<bool>) -> Delete {
        Delete {
            table: self.table,
            where_clause: Some(condition.into_expr()),
        }
    }

    #[must_use]
    pub fn all(self) -> Delete {
        Delete {
            table: self.table,
            where_clause: None,
        }
    }
}
