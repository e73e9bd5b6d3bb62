use std::sync::Arc;

use super::codec::{ColumnCodec, ColumnCodecs};
use super::matcher::{CaseInsensitiveMatcher, ColumnNameMatcher, SnakeCaseMatcher};
use crate::naming::NameResolver;

/// Everything a mapper consults while planning: name matchers, codecs and
/// the name resolver shared with the generator.
#[derive(Debug, Clone)]
pub struct MappingContext {
    matchers: Vec<Arc<dyn ColumnNameMatcher>>,
    codecs: ColumnCodecs,
    names: Arc<NameResolver>,
}

impl MappingContext {
    /// A context with the case-insensitive and snake-case matchers.
    #[must_use]
    pub fn new(names: Arc<NameResolver>) -> Self {
        Self::with_matchers(
            names,
            vec![Arc::new(CaseInsensitiveMatcher), Arc::new(SnakeCaseMatcher)],
        )
    }

    #[must_use]
    pub fn with_matchers(
        names: Arc<NameResolver>,
        matchers: Vec<Arc<dyn ColumnNameMatcher>>,
    ) -> Self {
        Self {
            matchers,
            codecs: ColumnCodecs::default(),
            names,
        }
    }

    /// Registers a codec for fields declared with `rust_type`.
    #[must_use]
    pub fn with_codec(mut self, rust_type: impl Into<String>, codec: Arc<dyn ColumnCodec>) -> Self {
        self.codecs.register(rust_type, codec);
        self
    }

    /// True if any matcher accepts `label` for `name`.
    #[must_use]
    pub fn matches(&self, label: &str, name: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(label, name))
    }

    #[must_use]
    pub fn codec(&self, rust_type: &str) -> Arc<dyn ColumnCodec> {
        self.codecs.for_type(rust_type)
    }

    #[must_use]
    pub const fn names(&self) -> &Arc<NameResolver> {
        &self.names
    }
}
