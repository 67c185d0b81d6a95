//! High-level SQLite client combining a fluent query builder with a
//! bounded connection pool.
//!
//! The workspace splits into two engine-facing layers plus this facade:
//!
//! - [`sqlx_sqlite_query_builder`] assembles parameterized SQL text with
//!   no engine dependency.
//! - [`sqlx_sqlite_conn_pool`] manages raw SQLx SQLite connections with
//!   uniform PRAGMA configuration.
//! - [`SqliteClient`] ties them together: raw SQL execution, builder
//!   execution, map-driven CRUD helpers, transactions, and JSON row
//!   decoding.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), sqlx_sqlite_client::Error> {
//! use serde_json::json;
//! use sqlx_sqlite_client::{QueryBuilder, SqliteClient};
//!
//! let db = SqliteClient::connect("app.db", None).await?;
//!
//! db.execute(
//!     "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)"
//!         .into(),
//!     vec![],
//! ).await?;
//!
//! db.insert("users", [
//!     ("name".to_string(), json!("Alice")),
//!     ("age".to_string(), json!(30)),
//! ].into_iter().collect()).await?;
//!
//! let adults = QueryBuilder::new()
//!    .select(vec!["name"])
//!    .from("users")
//!    .where_clause("age >= ?", vec![json!(18)]);
//! let rows = db.fetch_query(&adults).await?;
//! assert_eq!(rows[0]["name"], json!("Alice"));
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod crud;
mod decode;
mod error;
mod transactions;

pub use client::{SqliteClient, WriteQueryResult};
pub use crud::SelectOptions;
pub use decode::{bind_value, to_json};
pub use error::{Error, Result};

pub use sqlx_sqlite_conn_pool::{
   ConnectionPool, ExhaustionPolicy, JournalMode, PoolConfig, PoolStatus, Synchronous, TempStore,
};
pub use sqlx_sqlite_query_builder::{
   BuiltQuery, JoinClause, JoinKind, OrderDirection, OrderTerm, Predicate, QueryBuilder,
   count_from, exists_in, select_from,
};
