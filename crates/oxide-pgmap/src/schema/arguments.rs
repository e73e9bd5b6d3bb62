use std::any::Any;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::{FromSqlValue, SqlValue};

/// A value handed to a constructor parameter or assigned to a property.
#[derive(Debug)]
pub enum Argument {
    /// A decoded column value.
    Value(SqlValue),
    /// A nested entity built by a join, already wrapped in `Option`.
    Object(Box<dyn Any + Send>),
}

impl Argument {
    /// Decodes a column value into `T`.
    ///
    /// # Errors
    ///
    /// Fails for joined objects and for values that do not decode as `T`.
    pub fn decode<T: FromSqlValue>(self) -> Result<T> {
        match self {
            Self::Value(value) => T::from_sql_value(value),
            Self::Object(_) => Err(Error::Decode {
                expected: std::any::type_name::<T>(),
                found: "joined object",
            }),
        }
    }

    /// Unwraps a joined object. A `NULL` value yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Fails when the object is not a `T` or the value is not `NULL`.
    pub fn into_object<T: Any + Default>(self) -> Result<T> {
        match self {
            Self::Object(object) => object.downcast::<T>().map(|b| *b).map_err(|_| {
                Error::Decode {
                    expected: std::any::type_name::<T>(),
                    found: "joined object of another type",
                }
            }),
            Self::Value(SqlValue::Null) => Ok(T::default()),
            Self::Value(other) => Err(Error::Decode {
                expected: std::any::type_name::<T>(),
                found: other.kind(),
            }),
        }
    }
}

/// Constructor arguments resolved for one row, keyed by parameter name.
#[derive(Debug)]
pub struct Arguments {
    entity: &'static str,
    values: HashMap<&'static str, Argument>,
}

impl Arguments {
    #[must_use]
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, parameter: &'static str, value: Argument) {
        self.values.insert(parameter, value);
    }

    #[must_use]
    pub fn contains(&self, parameter: &str) -> bool {
        self.values.contains_key(parameter)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes a required parameter.
    ///
    /// # Errors
    ///
    /// Fails if no value was resolved for `parameter` or it does not decode.
    pub fn take<T: FromSqlValue>(&mut self, parameter: &str) -> Result<T> {
        match self.values.remove(parameter) {
            Some(value) => value.decode(),
            None => Err(Error::mapping(
                self.entity,
                format!("missing value for parameter {parameter}"),
            )),
        }
    }

    /// Takes an optional parameter, falling back to `T::default()`.
    ///
    /// # Errors
    ///
    /// Fails if a resolved value does not decode.
    pub fn take_or_default<T: FromSqlValue + Default>(&mut self, parameter: &str) -> Result<T> {
        self.values
            .remove(parameter)
            .map_or_else(|| Ok(T::default()), Argument::decode)
    }

    /// Takes a parameter filled by a join into-field.
    ///
    /// # Errors
    ///
    /// Fails if the joined object has another type.
    pub fn take_joined<T: Any + Default>(&mut self, parameter: &str) -> Result<T> {
        self.values
            .remove(parameter)
            .map_or_else(|| Ok(T::default()), Argument::into_object)
    }
}
