//! # oxide-pgmap
//!
//! A typed PostgreSQL statement builder paired with a row mapper.
//!
//! This crate provides:
//! - A statement AST and a typed, immutable builder over it
//! - A PostgreSQL generator that lowers statements to SQL text plus ordered
//!   bind values, with `?` placeholders
//! - A row mapper that builds entities from result rows, including entities
//!   nested through joins
//!
//! Entity metadata comes from `#[derive(Entity)]` in `oxide-pgmap-derive`.
//!
//! ## Generating SQL
//!
//! ```ignore
//! use oxide_pgmap::prelude::*;
//!
//! #[derive(Debug, Clone, Entity)]
//! struct Vehicle {
//!     id: i64,
//!     distance: i32,
//! }
//!
//! let postgres = Postgres::new();
//! let statement = postgres.select(
//!     &Vehicle::table()
//!         .select_all()
//!         .where_clause(Vehicle::distance().gt(100)),
//! )?;
//!
//! // SELECT "vehicle".* FROM "vehicle" WHERE ("vehicle"."distance" > ?)
//! // values = [Int(100)]
//! ```
//!
//! ## Mapping rows
//!
//! Joined tables are wrapped in `start:<field>` / `end:<field>` sentinel
//! columns, which the mapper uses to cut each joined entity's columns out of
//! the row before matching labels to fields.
//!
//! ```ignore
//! let mappers = Mappers::new(MappingContext::new(postgres.names().clone()));
//! let vehicles: Vec<Vehicle> = mappers.map_query(&statement, &rows)?;
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod mapper;
pub mod naming;
pub mod schema;
pub mod value;

#[cfg(test)]
mod testing;

pub use config::{MapperConfig, MatcherKind};
pub use dialect::{Dialect, Fragment, Postgres};
pub use error::{Error, Result};
pub use mapper::{Mappers, MappingContext, ResultTable};
pub use naming::NameResolver;
pub use schema::{Entity, Table, TypedColumn};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};

/// Everything needed to build, generate and map statements.
pub mod prelude {
    pub use crate::builder::{
        aggregate, all, and_all, array, as_geo_json, case, case_or, case_order, coalesce,
        count_all, count_distinct, exists, greatest, interval, jsonb_build_object, jsonb_literal,
        least, literal, not, not_exists, now, or_all, row_to_json, row_to_json_table,
        sql_function, ExprOps, IntoOperand, NullableType, TypedExpr,
    };
    pub use crate::dialect::{Dialect, Fragment, Postgres};
    pub use crate::error::{Error, Result};
    pub use crate::mapper::{ColumnLabel, Mappers, MappingContext, ResultSet, ResultTable};
    pub use crate::naming::NameResolver;
    pub use crate::schema::{Entity, Table, TypedColumn};
    pub use crate::value::{FromSqlValue, Geometry, Interval, Jsonb, SqlValue, ToSqlValue};
}
