//! Mapper configuration loaded from JSON.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mapper::{
    CaseInsensitiveMatcher, ColumnNameMatcher, ExactMatcher, MappingContext, SnakeCaseMatcher,
};
use crate::naming::NameResolver;

/// A column-name matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Exact,
    CaseInsensitive,
    SnakeCase,
}

impl MatcherKind {
    fn matcher(self) -> Arc<dyn ColumnNameMatcher> {
        match self {
            Self::Exact => Arc::new(ExactMatcher),
            Self::CaseInsensitive => Arc::new(CaseInsensitiveMatcher),
            Self::SnakeCase => Arc::new(SnakeCaseMatcher),
        }
    }
}

/// Settings for building a [`MappingContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Tried in order; a label matches a field if any rule accepts it.
    pub column_name_matchers: Vec<MatcherKind>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            column_name_matchers: vec![MatcherKind::CaseInsensitive, MatcherKind::SnakeCase],
        }
    }
}

impl MapperConfig {
    /// Parses a configuration document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the document is not valid JSON or
    /// names an unknown matcher.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the runtime context with the default codec set.
    #[must_use]
    pub fn context(self, names: Arc<NameResolver>) -> MappingContext {
        let matchers = self
            .column_name_matchers
            .into_iter()
            .map(MatcherKind::matcher)
            .collect();
        MappingContext::with_matchers(names, matchers)
    }
}
