//! Typed statement builder.
//!
//! Columns generated by `#[derive(Entity)]` carry their Rust type, so
//! comparing a text column with a number, or adding to a timestamp, fails to
//! compile. Every operation returns a new value and never mutates its inputs.
//!
//! ```ignore
//! use oxide_pgmap::prelude::*;
//!
//! let query = Vehicle::table()
//!     .select_all()
//!     .where_clause(Vehicle::distance().gt(100).and(Vehicle::locked().is_false()))
//!     .order_by([Vehicle::created_at().desc()])
//!     .limit(10);
//! ```

mod delete;
mod expr;
mod functions;
mod insert;
pub mod json;
mod operand;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use expr::{ExprOps, NullableType, TypedExpr, TypedWhen};
pub use functions::{
    aggregate, all, and_all, array, case, case_or, case_order, coalesce, count_all,
    count_distinct, exists, exists_as, greatest, interval, least, literal, not, not_exists, now,
    or_all, sql_function,
};
pub use insert::{ConflictBuilder, HasColumns, InsertBuilder, NoColumns};
pub use json::{as_geo_json, jsonb_build_object, jsonb_literal, row_to_json, row_to_json_table};
pub use operand::{
    IntoOperand, JsonDocument, Numeric, Spatial, SqlCollection, SqlComparable, Temporal, Textual,
};
pub use update::{HasSet, NoSet, UpdateBuilder};
