//! Error types for statement generation and row mapping.

use thiserror::Error;

/// Errors raised while building SQL or materializing rows.
///
/// None of these are transient: every variant signals a malformed statement,
/// a badly declared entity, or a row that cannot become the requested type.
#[derive(Debug, Error)]
pub enum Error {
    /// The statement tree cannot be lowered to SQL.
    #[error("{0}")]
    Construction(String),

    /// An entity descriptor cannot provide a name or a constructor.
    #[error("{0}")]
    Configuration(String),

    /// Materializing an entity from a row failed.
    #[error("Error constructing {entity}: {reason}")]
    Mapping { entity: String, reason: String },

    /// A literal argument was rejected at generation time.
    #[error("{0}")]
    Validation(String),

    /// A column value does not fit the requested Rust type.
    #[error("cannot decode {found} as {expected}")]
    Decode {
        expected: &'static str,
        found: &'static str,
    },

    /// Mapper configuration could not be parsed.
    #[error("invalid mapper configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Builds a [`Error::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Builds a [`Error::Mapping`] for `entity`.
    #[must_use]
    pub fn mapping(entity: &str, reason: impl std::fmt::Display) -> Self {
        Self::Mapping {
            entity: entity.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
