use std::any::Any;
use std::fmt;

use super::{Argument, Arguments, Entity};
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// A type-erased entity instance.
pub type ErasedEntity = Box<dyn Any + Send>;

/// How instances of an entity are produced from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Built from constructor parameters plus mutable properties.
    Record,
    /// Decoded from a single column.
    Enumeration,
}

/// A constructor parameter of a record entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    /// Explicit column name override.
    pub column: Option<&'static str>,
    /// The parameter type is `Option<_>`.
    pub nullable: bool,
    /// A default exists when no column matches.
    pub optional: bool,
    /// Never read from a column directly.
    pub transient: bool,
    pub rust_type: &'static str,
}

impl ParameterDescriptor {
    /// The name column labels are matched against.
    #[must_use]
    pub fn slot_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// A property of an entity, readable for binding and optionally assignable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub column: Option<&'static str>,
    /// Assigned after construction rather than passed to the constructor.
    pub mutable: bool,
    pub transient: bool,
    pub rust_type: &'static str,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn slot_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// Erased entry points into an entity's [`Entity`] implementation.
#[derive(Clone, Copy)]
pub struct EntityVTable {
    pub construct: fn(&mut Arguments) -> Result<ErasedEntity>,
    pub assign: fn(&mut (dyn Any + Send), &str, Argument) -> Result<()>,
    /// Wraps a constructed instance as `Some(instance)`.
    pub wrap_some: fn(ErasedEntity) -> Result<ErasedEntity>,
    /// Produces `None::<T>` for a join that matched nothing.
    pub none: fn() -> ErasedEntity,
    pub decode: fn(SqlValue) -> Result<ErasedEntity>,
}

impl EntityVTable {
    /// Builds the vtable for `T`.
    #[must_use]
    pub const fn of<T: Entity>() -> Self {
        Self {
            construct: construct_erased::<T>,
            assign: assign_erased::<T>,
            wrap_some: wrap_some_erased::<T>,
            none: none_erased::<T>,
            decode: decode_erased::<T>,
        }
    }
}

impl fmt::Debug for EntityVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityVTable").finish_non_exhaustive()
    }
}

fn construct_erased<T: Entity>(args: &mut Arguments) -> Result<ErasedEntity> {
    T::construct(args).map(|instance| Box::new(instance) as ErasedEntity)
}

fn assign_erased<T: Entity>(
    target: &mut (dyn Any + Send),
    property: &str,
    value: Argument,
) -> Result<()> {
    let name = T::descriptor().simple_name;
    target
        .downcast_mut::<T>()
        .ok_or_else(|| Error::mapping(name, "assignment target has an unexpected type"))?
        .assign(property, value)
}

fn wrap_some_erased<T: Entity>(instance: ErasedEntity) -> Result<ErasedEntity> {
    let name = T::descriptor().simple_name;
    instance
        .downcast::<T>()
        .map(|instance| Box::new(Some(*instance)) as ErasedEntity)
        .map_err(|_| Error::mapping(name, "joined instance has an unexpected type"))
}

fn none_erased<T: Entity>() -> ErasedEntity {
    Box::new(None::<T>)
}

fn decode_erased<T: Entity>(value: SqlValue) -> Result<ErasedEntity> {
    T::from_column(value).map(|instance| Box::new(instance) as ErasedEntity)
}

/// Static metadata for one entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Module-qualified type name; the memoization key.
    pub type_name: &'static str,
    pub simple_name: &'static str,
    /// Explicit table name override.
    pub table_name: Option<&'static str>,
    pub shape: Shape,
    /// Constructor parameters in declaration order.
    pub parameters: &'static [ParameterDescriptor],
    /// Properties in declaration order.
    pub properties: &'static [PropertyDescriptor],
    pub vtable: EntityVTable,
}

impl EntityDescriptor {
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&'static ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of parameters and properties that are never read from columns.
    pub fn transient_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters
            .iter()
            .filter(|p| p.transient)
            .map(|p| p.name)
            .chain(
                self.properties
                    .iter()
                    .filter(|p| p.transient)
                    .map(|p| p.name),
            )
    }
}

impl PartialEq for EntityDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for EntityDescriptor {}
