//! Materializing entities from result rows.
//!
//! [`Mappers`] resolves one [`EntityMapper`] per entity type. A mapper is
//! specialized to the column layout of a result into a [`RowMapper`], which
//! then builds one instance per row. Joined queries are planned from the
//! statement that produced them, using the `start:<field>`/`end:<field>`
//! sentinel columns the generator emits around every joined table.

mod codec;
mod context;
mod invoker;
mod invoker_builder;
mod mappers;
mod matcher;
mod row;

pub use codec::{ColumnCodec, ColumnCodecs, JsonCodec, PassThroughCodec};
pub use context::MappingContext;
pub use invoker::{Invoker, ValueProvider};
pub use invoker_builder::{for_query, for_update};
pub use mappers::{
    DefaultMapper, EntityMapper, EnumMapper, JoinMapper, JoinUpdateMapper, Mappers, RowMapper,
};
pub use matcher::{CaseInsensitiveMatcher, ColumnNameMatcher, ExactMatcher, SnakeCaseMatcher};
pub use row::{ColumnLabel, ResultRow, ResultSet, ResultTable};
