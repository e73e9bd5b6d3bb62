//! Materializing one entity per row from a resolved plan.

use std::sync::Arc;

use super::codec::ColumnCodec;
use super::row::ResultRow;
use crate::error::{Error, Result};
use crate::schema::{Argument, Arguments, EntityDescriptor, ErasedEntity};
use crate::value::SqlValue;

/// Produces the value of one constructor parameter or property for a row.
#[derive(Debug)]
pub enum ValueProvider {
    /// Always `NULL`; fills required nullable parameters no column matched.
    Null,
    /// Reads a column through the codec for the field's type.
    Column {
        position: usize,
        codec: Arc<dyn ColumnCodec>,
    },
    /// Builds a nested entity from a join's private columns.
    Join {
        invoker: Box<Invoker>,
        /// Positions of the join's columns, sentinels excluded.
        columns: Vec<usize>,
    },
}

impl ValueProvider {
    /// Evaluates this provider against `row`.
    ///
    /// # Errors
    ///
    /// Fails if a column cannot be decoded or a nested entity cannot be built.
    pub fn provide(&self, row: &dyn ResultRow) -> Result<Argument> {
        match self {
            Self::Null => Ok(Argument::Value(SqlValue::Null)),
            Self::Column { position, codec } => codec.decode(row, *position).map(Argument::Value),
            Self::Join { invoker, columns } => {
                let vtable = &invoker.descriptor().vtable;
                let unmatched = columns
                    .iter()
                    .all(|position| row.get(*position).is_none_or(SqlValue::is_null));
                if unmatched {
                    Ok(Argument::Object((vtable.none)()))
                } else {
                    let instance = invoker.invoke(row)?;
                    (vtable.wrap_some)(instance).map(Argument::Object)
                }
            }
        }
    }
}

/// A resolved construction plan for one entity type and one column layout.
#[derive(Debug)]
pub struct Invoker {
    descriptor: &'static EntityDescriptor,
    parameters: Vec<(&'static str, ValueProvider)>,
    properties: Vec<(&'static str, ValueProvider)>,
}

impl Invoker {
    #[must_use]
    pub const fn new(
        descriptor: &'static EntityDescriptor,
        parameters: Vec<(&'static str, ValueProvider)>,
        properties: Vec<(&'static str, ValueProvider)>,
    ) -> Self {
        Self {
            descriptor,
            parameters,
            properties,
        }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    /// Names of the constructor parameters with a provider.
    pub fn parameter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters.iter().map(|(name, _)| *name)
    }

    /// Names of the properties assigned after construction.
    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|(name, _)| *name)
    }

    /// Builds the entity for `row`: constructor first, then property
    /// assignments.
    ///
    /// # Errors
    ///
    /// Any failure is reported as a mapping error naming the entity.
    pub fn invoke(&self, row: &dyn ResultRow) -> Result<ErasedEntity> {
        let entity = self.descriptor.simple_name;
        let vtable = &self.descriptor.vtable;

        let mut args = Arguments::new(entity);
        for (name, provider) in &self.parameters {
            args.insert(name, provider.provide(row).map_err(|e| attribute(entity, e))?);
        }
        let mut instance = (vtable.construct)(&mut args).map_err(|e| attribute(entity, e))?;

        for (name, provider) in &self.properties {
            let value = provider.provide(row).map_err(|e| attribute(entity, e))?;
            (vtable.assign)(instance.as_mut(), name, value).map_err(|e| attribute(entity, e))?;
        }
        Ok(instance)
    }
}

/// Keeps errors that already name an entity, wraps the rest.
fn attribute(entity: &str, error: Error) -> Error {
    match error {
        Error::Mapping { .. } | Error::Configuration(_) => error,
        other => Error::mapping(entity, other),
    }
}
