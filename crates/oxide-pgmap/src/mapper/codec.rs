//! Column codecs: turning a raw cell into the value a field expects.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::row::ResultRow;
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// Reads one column of a row for a given Rust type.
pub trait ColumnCodec: Send + Sync + fmt::Debug {
    /// Reads the cell at the 1-based `position`.
    ///
    /// # Errors
    ///
    /// Fails if the cell is missing or has an unexpected shape.
    fn decode(&self, row: &dyn ResultRow, position: usize) -> Result<SqlValue>;

    /// Converts a value for binding.
    fn encode(&self, value: SqlValue) -> SqlValue {
        value
    }
}

/// Returns the cell unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCodec;

impl ColumnCodec for PassThroughCodec {
    fn decode(&self, row: &dyn ResultRow, position: usize) -> Result<SqlValue> {
        row.get(position).cloned().ok_or(Error::Decode {
            expected: "column",
            found: "missing column",
        })
    }
}

/// Parses text cells as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ColumnCodec for JsonCodec {
    fn decode(&self, row: &dyn ResultRow, position: usize) -> Result<SqlValue> {
        match PassThroughCodec.decode(row, position)? {
            SqlValue::Text(text) => serde_json::from_str(&text)
                .map(SqlValue::Json)
                .map_err(|_| Error::Decode {
                    expected: "json",
                    found: "text",
                }),
            other => Ok(other),
        }
    }

    fn encode(&self, value: SqlValue) -> SqlValue {
        match value {
            SqlValue::Text(text) => serde_json::from_str(&text)
                .map_or(SqlValue::Text(text), SqlValue::Json),
            other => other,
        }
    }
}

const JSON_TYPES: [&str; 4] = [
    "Jsonb",
    "Option<Jsonb>",
    "serde_json::Value",
    "Option<serde_json::Value>",
];

/// Codecs registered per Rust type name, with a pass-through fallback.
#[derive(Debug, Clone)]
pub struct ColumnCodecs {
    fallback: Arc<dyn ColumnCodec>,
    by_type: HashMap<String, Arc<dyn ColumnCodec>>,
}

impl Default for ColumnCodecs {
    fn default() -> Self {
        let mut codecs = Self {
            fallback: Arc::new(PassThroughCodec),
            by_type: HashMap::new(),
        };
        let json: Arc<dyn ColumnCodec> = Arc::new(JsonCodec);
        for rust_type in JSON_TYPES {
            codecs.register(rust_type, Arc::clone(&json));
        }
        codecs
    }
}

impl ColumnCodecs {
    /// Registers `codec` for fields declared with `rust_type`, as written in
    /// the struct without spaces (`Option<Jsonb>`).
    pub fn register(&mut self, rust_type: impl Into<String>, codec: Arc<dyn ColumnCodec>) {
        self.by_type.insert(rust_type.into(), codec);
    }

    #[must_use]
    pub fn for_type(&self, rust_type: &str) -> Arc<dyn ColumnCodec> {
        self.by_type
            .get(rust_type)
            .map_or_else(|| Arc::clone(&self.fallback), Arc::clone)
    }
}
