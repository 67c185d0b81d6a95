//! # sqlx-sqlite-query-builder
//!
//! A fluent builder for SQLite SELECT statements that tracks bound parameters
//! positionally, so the Nth `?` placeholder in the emitted SQL always binds to
//! the Nth value in the returned parameter list.
//!
//! ## Core Types
//!
//! - **[`QueryBuilder`]**: chainable accumulator of clauses, compiled by [`QueryBuilder::build`]
//! - **[`BuiltQuery`]**: the compiled SQL text plus its ordered parameters
//! - **[`JoinKind`]** / **[`OrderDirection`]**: closed enumerations with SQL renderings
//! - **[`Error`]**: builder-state and binding errors raised from `build()`
//!
//! Chaining methods never fail; all validation happens in `build()`, which is
//! read-only and may be called repeatedly.
//!
//! ## Usage
//!
//! ```
//! use sqlx_sqlite_query_builder::{OrderDirection, QueryBuilder};
//! use serde_json::json;
//!
//! let built = QueryBuilder::new()
//!    .select(["id", "name"])
//!    .from("users")
//!    .where_clause("age > ?", vec![json!(21)])
//!    .order_by("name", OrderDirection::Asc)
//!    .limit(10)
//!    .build()
//!    .unwrap();
//!
//! assert_eq!(
//!    built.sql,
//!    "SELECT id, name FROM users WHERE age > ? ORDER BY name ASC LIMIT 10"
//! );
//! assert_eq!(built.params, vec![json!(21)]);
//! ```

mod builder;
mod clause;
mod error;

pub use builder::{BuiltQuery, QueryBuilder, count_from, exists_in, select_from};
pub use clause::{JoinClause, JoinKind, OrderDirection, OrderTerm, Predicate};
pub use error::Error;

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
