//! Error types for sqlx-sqlite-conn-pool

use thiserror::Error;

/// Errors that may occur when working with sqlx-sqlite-conn-pool
#[derive(Error, Debug)]
pub enum Error {
   /// Opening or configuring a new connection failed. Carries the
   /// database path for context.
   #[error("failed to open or configure connection to `{path}`: {source}")]
   Connection {
      path: String,
      #[source]
      source: sqlx::Error,
   },

   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// Pool has been closed and cannot hand out connections
   #[error("connection pool has been closed")]
   PoolClosed,

   /// All connections are checked out and the pool is configured to
   /// reject rather than overflow
   #[error("connection pool exhausted: all {max} connections are checked out")]
   PoolExhausted { max: usize },
}
