//! Static mapping descriptors for entity types.
//!
//! Every mapped type implements [`Entity`], usually through
//! `#[derive(Entity)]`. The derive emits an [`EntityDescriptor`] that lists
//! constructor parameters and properties together with an erased vtable, so
//! the row mapper can build instances from column labels without knowing the
//! concrete type.

mod arguments;
mod descriptor;
mod table;

pub use arguments::{Argument, Arguments};
pub use descriptor::{
    EntityDescriptor, EntityVTable, ErasedEntity, ParameterDescriptor, PropertyDescriptor, Shape,
};
pub use table::{Table, TypedColumn};

use crate::error::{Error, Result};
use crate::value::SqlValue;

/// A type that can be named in statements and materialized from rows.
pub trait Entity: Sized + Send + 'static {
    /// Returns the static descriptor for this type.
    fn descriptor() -> &'static EntityDescriptor;

    /// Builds an instance from resolved constructor arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing or cannot be
    /// decoded into the parameter type.
    fn construct(args: &mut Arguments) -> Result<Self>;

    /// Assigns a mutable property after construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is unknown or the value does not fit.
    fn assign(&mut self, property: &str, value: Argument) -> Result<()> {
        let _ = value;
        Err(Error::mapping(
            Self::descriptor().simple_name,
            format!("no mutable property {property}"),
        ))
    }

    /// Reads a property as a bind value. Used when binding INSERT rows.
    fn property_value(&self, property: &str) -> Option<SqlValue> {
        let _ = property;
        None
    }

    /// Decodes an enumeration from a single column value.
    ///
    /// # Errors
    ///
    /// Returns an error for record types or unknown variants.
    fn from_column(value: SqlValue) -> Result<Self> {
        let _ = value;
        Err(Error::configuration(format!(
            "{} is not an enumeration",
            Self::descriptor().simple_name
        )))
    }

    /// Returns the unaliased table handle.
    #[must_use]
    fn table() -> Table<Self> {
        Table::new()
    }

    /// Returns a table handle rendered under `alias`.
    #[must_use]
    fn aliased(alias: impl Into<String>) -> Table<Self> {
        Table::with_alias(alias)
    }

    /// Returns a table handle with the generated `autogenerated_alias_<Name>`
    /// alias.
    #[must_use]
    fn auto_aliased() -> Table<Self> {
        Table::with_alias(format!(
            "autogenerated_alias_{}",
            Self::descriptor().simple_name
        ))
    }
}
