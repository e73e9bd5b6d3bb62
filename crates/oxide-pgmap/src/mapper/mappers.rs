//! Per-entity mappers and the process-wide mapper cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace};

use super::codec::ColumnCodec;
use super::context::MappingContext;
use super::invoker::{Invoker, ValueProvider};
use super::invoker_builder::{self, fill_nullable, set, SlotRef};
use super::row::{ColumnLabel, ResultRow, ResultSet};
use crate::ast::{Query, Update};
use crate::dialect::{SelectStatement, UpdateStatement};
use crate::error::{Error, Result};
use crate::schema::{Entity, EntityDescriptor, ErasedEntity, Shape};

/// Turns result rows into instances of one entity type.
pub trait EntityMapper: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &'static EntityDescriptor;

    /// Plans a [`RowMapper`] for one column layout.
    ///
    /// # Errors
    ///
    /// Fails if the layout lacks columns the plan depends on, such as join
    /// sentinels.
    fn specialize(&self, columns: &[ColumnLabel], context: &MappingContext) -> Result<RowMapper>;
}

/// A plan specialized to one column layout.
#[derive(Debug)]
pub enum RowMapper {
    Record(Invoker),
    /// Decodes column 1 into an enumeration.
    Enumeration {
        descriptor: &'static EntityDescriptor,
        codec: Arc<dyn ColumnCodec>,
    },
}

impl RowMapper {
    /// Materializes one row.
    ///
    /// # Errors
    ///
    /// Fails with a mapping error naming the entity.
    pub fn map_row(&self, row: &dyn ResultRow) -> Result<ErasedEntity> {
        match self {
            Self::Record(invoker) => invoker.invoke(row),
            Self::Enumeration { descriptor, codec } => codec
                .decode(row, 1)
                .and_then(descriptor.vtable.decode)
                .map_err(|e| match e {
                    Error::Mapping { .. } | Error::Configuration(_) => e,
                    other => Error::mapping(descriptor.simple_name, other),
                }),
        }
    }
}

/// Maps non-joined results, memoizing which field each label routes to.
#[derive(Debug)]
pub struct DefaultMapper {
    descriptor: &'static EntityDescriptor,
    slots: RwLock<HashMap<String, Option<SlotRef>>>,
}

impl DefaultMapper {
    #[must_use]
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// The first parameter matching `label`, else the first mutable property.
    fn slot(&self, label: &str, context: &MappingContext) -> Option<SlotRef> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
        {
            return *slot;
        }
        let slot = self
            .descriptor
            .parameters
            .iter()
            .find(|p| !p.transient && context.matches(label, p.slot_name()))
            .map(SlotRef::Parameter)
            .or_else(|| {
                self.descriptor
                    .properties
                    .iter()
                    .find(|p| p.mutable && !p.transient && context.matches(label, p.slot_name()))
                    .map(SlotRef::Property)
            });
        *self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(label.to_string())
            .or_insert(slot)
    }
}

impl EntityMapper for DefaultMapper {
    fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    fn specialize(&self, columns: &[ColumnLabel], context: &MappingContext) -> Result<RowMapper> {
        // Joins in FROM can repeat labels; the first occurrence belongs to
        // the selected entity.
        let mut seen = Vec::with_capacity(columns.len());
        let mut parameters = Vec::new();
        let mut properties = Vec::new();
        for column in columns {
            let folded = column.label.to_lowercase();
            if seen.contains(&folded) {
                continue;
            }
            seen.push(folded);
            let Some(slot) = self.slot(&column.label, context) else {
                continue;
            };
            match slot {
                SlotRef::Parameter(parameter) => set(
                    &mut parameters,
                    parameter.name,
                    ValueProvider::Column {
                        position: column.position,
                        codec: context.codec(parameter.rust_type),
                    },
                ),
                SlotRef::Property(property) => set(
                    &mut properties,
                    property.name,
                    ValueProvider::Column {
                        position: column.position,
                        codec: context.codec(property.rust_type),
                    },
                ),
            }
        }
        fill_nullable(self.descriptor, &mut parameters);
        Ok(RowMapper::Record(Invoker::new(
            self.descriptor,
            parameters,
            properties,
        )))
    }
}

/// Maps enumerations from their single column.
#[derive(Debug)]
pub struct EnumMapper {
    descriptor: &'static EntityDescriptor,
}

impl EnumMapper {
    #[must_use]
    pub const fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self { descriptor }
    }
}

impl EntityMapper for EnumMapper {
    fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    fn specialize(&self, _columns: &[ColumnLabel], context: &MappingContext) -> Result<RowMapper> {
        Ok(RowMapper::Enumeration {
            descriptor: self.descriptor,
            codec: context.codec(self.descriptor.simple_name),
        })
    }
}

/// Maps a query whose joins fill nested fields. Never cached.
#[derive(Debug)]
pub struct JoinMapper {
    descriptor: &'static EntityDescriptor,
    query: Query,
}

impl JoinMapper {
    #[must_use]
    pub const fn new(descriptor: &'static EntityDescriptor, query: Query) -> Self {
        Self { descriptor, query }
    }
}

impl EntityMapper for JoinMapper {
    fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    fn specialize(&self, columns: &[ColumnLabel], context: &MappingContext) -> Result<RowMapper> {
        invoker_builder::for_query(context, self.descriptor, Some(&self.query), columns)
            .map(RowMapper::Record)
    }
}

/// Maps an UPDATE ... RETURNING whose into-fields fill nested fields.
#[derive(Debug)]
pub struct JoinUpdateMapper {
    descriptor: &'static EntityDescriptor,
    update: Update,
}

impl JoinUpdateMapper {
    #[must_use]
    pub const fn new(descriptor: &'static EntityDescriptor, update: Update) -> Self {
        Self { descriptor, update }
    }
}

impl EntityMapper for JoinUpdateMapper {
    fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    fn specialize(&self, columns: &[ColumnLabel], context: &MappingContext) -> Result<RowMapper> {
        invoker_builder::for_update(context, self.descriptor, Some(&self.update), columns)
            .map(RowMapper::Record)
    }
}

/// Resolves and caches mappers per entity type.
///
/// Mappers for joined queries depend on the join graph and are rebuilt on
/// every resolution.
#[derive(Debug)]
pub struct Mappers {
    context: MappingContext,
    cache: RwLock<HashMap<&'static str, Arc<dyn EntityMapper>>>,
}

impl Mappers {
    #[must_use]
    pub fn new(context: MappingContext) -> Self {
        Self {
            context,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn context(&self) -> &MappingContext {
        &self.context
    }

    /// Resolves the mapper for rows produced by `query`.
    #[must_use]
    pub fn resolve_for_query(
        &self,
        descriptor: &'static EntityDescriptor,
        query: Option<&Query>,
    ) -> Arc<dyn EntityMapper> {
        match query {
            Some(query) if query.into_joins().next().is_some() => {
                debug!(entity = descriptor.simple_name, "join mapper bypasses cache");
                Arc::new(JoinMapper::new(descriptor, query.clone()))
            }
            _ => self.resolve(descriptor),
        }
    }

    /// Resolves the mapper for rows returned by `update`.
    #[must_use]
    pub fn resolve_for_update(
        &self,
        descriptor: &'static EntityDescriptor,
        update: Option<&Update>,
    ) -> Arc<dyn EntityMapper> {
        match update {
            Some(update) if !update.from.is_none() && !update.into_fields.is_empty() => {
                debug!(entity = descriptor.simple_name, "join mapper bypasses cache");
                Arc::new(JoinUpdateMapper::new(descriptor, update.clone()))
            }
            _ => self.resolve(descriptor),
        }
    }

    fn resolve(&self, descriptor: &'static EntityDescriptor) -> Arc<dyn EntityMapper> {
        if let Some(mapper) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(descriptor.type_name)
        {
            return Arc::clone(mapper);
        }
        trace!(entity = descriptor.simple_name, "mapper cache miss");
        let mapper: Arc<dyn EntityMapper> = match descriptor.shape {
            Shape::Enumeration => Arc::new(EnumMapper::new(descriptor)),
            Shape::Record => Arc::new(DefaultMapper::new(descriptor)),
        };
        Arc::clone(
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(descriptor.type_name)
                .or_insert(mapper),
        )
    }

    /// Maps the rows of an executed SELECT.
    ///
    /// # Errors
    ///
    /// Fails if any row cannot be materialized as `T`.
    pub fn map_query<T: Entity>(
        &self,
        statement: &SelectStatement,
        results: &impl ResultSet,
    ) -> Result<Vec<T>> {
        let mapper = self.resolve_for_query(T::descriptor(), Some(&statement.query));
        self.materialize(mapper.as_ref(), results)
    }

    /// Maps the RETURNING rows of an executed UPDATE.
    ///
    /// # Errors
    ///
    /// Fails if any row cannot be materialized as `T`.
    pub fn map_update<T: Entity>(
        &self,
        statement: &UpdateStatement,
        results: &impl ResultSet,
    ) -> Result<Vec<T>> {
        let mapper = self.resolve_for_update(T::descriptor(), Some(&statement.update));
        self.materialize(mapper.as_ref(), results)
    }

    /// Maps rows with no statement to consult, such as raw SQL results.
    ///
    /// # Errors
    ///
    /// Fails if any row cannot be materialized as `T`.
    pub fn map_rows<T: Entity>(&self, results: &impl ResultSet) -> Result<Vec<T>> {
        let mapper = self.resolve_for_query(T::descriptor(), None);
        self.materialize(mapper.as_ref(), results)
    }

    fn materialize<T: Entity>(
        &self,
        mapper: &dyn EntityMapper,
        results: &impl ResultSet,
    ) -> Result<Vec<T>> {
        let entity = T::descriptor().simple_name;
        let row_mapper = mapper.specialize(&results.columns(), &self.context)?;
        results
            .rows()
            .map(|row| {
                row_mapper
                    .map_row(row)?
                    .downcast::<T>()
                    .map(|instance| *instance)
                    .map_err(|_| Error::mapping(entity, "mapped row has an unexpected type"))
            })
            .collect()
    }
}
