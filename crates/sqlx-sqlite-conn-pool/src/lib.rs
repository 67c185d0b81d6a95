//! # sqlx-sqlite-conn-pool
//!
//! A bounded pool of raw SQLx SQLite connections, configured uniformly at
//! open time and recycled with health verification.
//!
//! ## Core Types
//!
//! - **[`ConnectionPool`]**: owns the idle connection list and creation counter
//! - **[`PoolConfig`]**: connection tuning (PRAGMAs) plus pool sizing and policy
//! - **[`PoolStatus`]**: point-in-time pool introspection
//! - **[`Error`]**: error type for pool operations
//!
//! ## Architecture
//!
//! - **Single bookkeeping lock**: the idle list and counters are the only
//!   shared mutable state, serialized by one mutex that is never held
//!   across an await point
//! - **I/O outside the lock**: engine opens, validation statements, and
//!   closes never run while the lock is held
//! - **Uniform configuration**: every connection receives the same ordered
//!   PRAGMA sequence derived from [`PoolConfig`]
//! - **Validated recycling**: returned connections must answer `SELECT 1`
//!   before re-entering the idle list
//! - **Configurable exhaustion**: fail-open overflow (default) or strict
//!   rejection via [`ExhaustionPolicy`]
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_conn_pool::ConnectionPool;
//!
//! # async fn example() -> sqlx_sqlite_conn_pool::Result<()> {
//! let pool = ConnectionPool::connect("example.db", None).await?;
//!
//! // Explicit checkout/return
//! let mut conn = pool.acquire().await?;
//! sqlx::query("SELECT 1").execute(&mut conn).await?;
//! pool.release(conn).await;
//!
//! // Scoped checkout: release runs on every exit path
//! pool
//!    .with_connection(|conn| {
//!       Box::pin(async move {
//!          sqlx::query("CREATE TABLE IF NOT EXISTS t (id INTEGER)")
//!             .execute(&mut *conn)
//!             .await?;
//!          Ok::<_, sqlx_sqlite_conn_pool::Error>(())
//!       })
//!    })
//!    .await?;
//!
//! pool.close_all().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod pool;

// Re-export public types
pub use config::{ExhaustionPolicy, JournalMode, PoolConfig, Synchronous, TempStore};
pub use error::Error;
pub use pool::{ConnectionPool, PoolStatus};

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
