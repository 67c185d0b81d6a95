//! Bounded connection pool over raw SQLx SQLite connections

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

use crate::Result;
use crate::config::{ExhaustionPolicy, PoolConfig};
use crate::error::Error;

/// Point-in-time pool statistics.
///
/// `total` counts every live connection the pool has created, idle and
/// checked out alike. Under [`ExhaustionPolicy::Overflow`] it may
/// temporarily exceed `max_connections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
   pub max_connections: usize,
   pub total: usize,
   pub idle: usize,
}

/// Idle list plus creation counter; the pool's only shared mutable state.
struct PoolState {
   idle: Vec<SqliteConnection>,
   total: usize,
}

/// A bounded pool of uniformly configured SQLite connections.
///
/// Bookkeeping (the idle list and the creation counter) is serialized by
/// a single mutex, held only for list and counter manipulation and never
/// across an await point. Engine I/O — opening, configuring, validating,
/// and closing connections — always happens with the lock released, so a
/// slow open never blocks other callers' checkouts.
///
/// Each checked-out connection is exclusively owned by its holder until
/// passed back through [`ConnectionPool::release`]; the pool never hands
/// the same handle to two callers.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_conn_pool::ConnectionPool;
///
/// # async fn example() -> sqlx_sqlite_conn_pool::Result<()> {
/// let pool = ConnectionPool::connect("app.db", None).await?;
///
/// let mut conn = pool.acquire().await?;
/// let (answer,): (i64,) = sqlx::query_as("SELECT 41 + 1")
///     .fetch_one(&mut conn)
///     .await?;
/// assert_eq!(answer, 42);
/// pool.release(conn).await;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionPool {
   /// Path to the database file (created if missing on first open)
   path: PathBuf,

   /// Connection tuning and pool sizing
   config: PoolConfig,

   /// Idle connections and the created-connection counter
   state: Mutex<PoolState>,

   /// Marks the pool as closed to prevent further checkouts
   closed: AtomicBool,
}

impl ConnectionPool {
   /// Open a pool against the database at `path`.
   ///
   /// Pass `None` for `custom_config` to use [`PoolConfig::default`].
   /// One connection is opened and configured eagerly so that a bad path
   /// or a failing setup statement surfaces here rather than on first
   /// use; it seeds the idle list.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<PoolConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      let path = path.as_ref();

      if path.as_os_str().is_empty() {
         return Err(Error::Connection {
            path: String::new(),
            source: sqlx::Error::Configuration("database path cannot be empty".into()),
         });
      }

      let pool = Self {
         path: path.to_path_buf(),
         config,
         state: Mutex::new(PoolState {
            idle: Vec::new(),
            total: 0,
         }),
         closed: AtomicBool::new(false),
      };

      let conn = pool.open_connection().await?;
      {
         let mut state = pool.lock_state();
         state.total = 1;
         state.idle.push(conn);
      }

      debug!(path = %pool.path.display(), "connection pool opened");
      Ok(Arc::new(pool))
   }

   /// The configuration this pool was opened with.
   pub fn config(&self) -> &PoolConfig {
      &self.config
   }

   /// Path to the underlying database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Whether [`ConnectionPool::close_all`] has run.
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::SeqCst)
   }

   /// The bookkeeping lock. Held only for list/counter manipulation;
   /// a poisoned guard is recovered since the state stays consistent
   /// under every panic-free section.
   fn lock_state(&self) -> MutexGuard<'_, PoolState> {
      self.state.lock().unwrap_or_else(PoisonError::into_inner)
   }

   /// Open a fresh connection and apply the configured setup statements.
   ///
   /// A failing setup statement fails the open: connections either carry
   /// the full configuration or are not handed out at all.
   async fn open_connection(&self) -> Result<SqliteConnection> {
      let options = SqliteConnectOptions::new()
         .filename(&self.path)
         .create_if_missing(true);

      let mut conn = options.connect().await.map_err(|source| Error::Connection {
         path: self.path.display().to_string(),
         source,
      })?;

      for statement in self.config.pragma_statements() {
         sqlx::query(&statement)
            .execute(&mut conn)
            .await
            .map_err(|source| Error::Connection {
               path: self.path.display().to_string(),
               source,
            })?;
      }

      debug!(path = %self.path.display(), "opened and configured connection");
      Ok(conn)
   }

   /// Check out a connection.
   ///
   /// Pops an idle connection when one exists; otherwise opens a new one,
   /// up to `max_connections`. At the bound, behavior follows the
   /// configured [`ExhaustionPolicy`]: overflow (default, logged) or
   /// [`Error::PoolExhausted`].
   ///
   /// The caller owns the returned handle exclusively until it is passed
   /// back via [`ConnectionPool::release`].
   pub async fn acquire(&self) -> Result<SqliteConnection> {
      if self.is_closed() {
         return Err(Error::PoolClosed);
      }

      {
         let mut state = self.lock_state();
         if let Some(conn) = state.idle.pop() {
            debug!("reusing idle connection");
            return Ok(conn);
         }

         if state.total >= self.config.max_connections {
            match self.config.exhaustion_policy {
               ExhaustionPolicy::Reject => {
                  return Err(Error::PoolExhausted {
                     max: self.config.max_connections,
                  });
               }
               ExhaustionPolicy::Overflow => {
                  warn!(
                     max = self.config.max_connections,
                     total = state.total,
                     "pool exhausted; opening overflow connection"
                  );
               }
            }
         }

         // Reserve the slot before opening so concurrent acquires see a
         // consistent count while the open runs unlocked.
         state.total += 1;
      }

      match self.open_connection().await {
         Ok(conn) => Ok(conn),
         Err(e) => {
            let mut state = self.lock_state();
            state.total = state.total.saturating_sub(1);
            Err(e)
         }
      }
   }

   /// Return a checked-out connection to the pool.
   ///
   /// The connection must answer a trivial round-trip statement before it
   /// is re-pooled; a handle that fails validation is closed and its slot
   /// freed, so a broken connection is never handed out again. A valid
   /// handle returned while the idle list is full (an overflow
   /// connection) is likewise closed, as is any handle returned after the
   /// pool has been closed.
   pub async fn release(&self, mut conn: SqliteConnection) {
      // Validation runs outside the bookkeeping lock.
      let valid = sqlx::query("SELECT 1").execute(&mut conn).await.is_ok();
      self.recycle(conn, valid).await;
   }

   /// Re-pool or discard a returned connection based on its validity.
   ///
   /// The closed flag is read again under the lock: `close_all` may have
   /// drained the idle list while the caller's validation statement ran,
   /// and a push after the drain would leak the connection.
   async fn recycle(&self, conn: SqliteConnection, valid: bool) {
      {
         let mut state = self.lock_state();
         if valid && !self.is_closed() && state.idle.len() < self.config.max_connections {
            state.idle.push(conn);
            debug!("connection returned to pool");
            return;
         }
         state.total = state.total.saturating_sub(1);
      }

      if !valid {
         debug!("returned connection failed validation; discarding");
      } else {
         debug!("closing returned connection instead of re-pooling");
      }
      close_quietly(conn).await;
   }

   /// Scoped checkout: acquire, run `op` on the connection, and release
   /// on every exit path. An `Ok` or `Err` return releases through
   /// validation; a panic in `op` drops the connection and frees its
   /// slot, so the pool's counters survive unwinding.
   ///
   /// The closure returns a boxed future borrowing the connection:
   ///
   /// ```no_run
   /// # async fn example(pool: &sqlx_sqlite_conn_pool::ConnectionPool) -> sqlx_sqlite_conn_pool::Result<()> {
   /// let count: i64 = pool
   ///    .with_connection(|conn| {
   ///       Box::pin(async move {
   ///          let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
   ///             .fetch_one(&mut *conn)
   ///             .await?;
   ///          Ok::<_, sqlx_sqlite_conn_pool::Error>(n)
   ///       })
   ///    })
   ///    .await?;
   /// # let _ = count;
   /// # Ok(())
   /// # }
   /// ```
   pub async fn with_connection<T, E, F>(&self, op: F) -> std::result::Result<T, E>
   where
      E: From<Error>,
      F: for<'c> FnOnce(
         &'c mut SqliteConnection,
      ) -> Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send + 'c>>,
   {
      let mut conn = self.acquire().await?;
      let mut guard = SlotGuard {
         pool: self,
         armed: true,
      };
      let result = op(&mut conn).await;
      guard.armed = false;
      self.release(conn).await;
      result
   }

   /// Close every idle connection and mark the pool closed.
   ///
   /// Checked-out connections are not forcibly closed; when their holders
   /// return them, [`ConnectionPool::release`] observes the closed flag
   /// and closes them instead of re-pooling.
   pub async fn close_all(&self) {
      self.closed.store(true, Ordering::SeqCst);

      let idle = {
         let mut state = self.lock_state();
         state.total = 0;
         std::mem::take(&mut state.idle)
      };

      for conn in idle {
         close_quietly(conn).await;
      }

      debug!(path = %self.path.display(), "connection pool closed");
   }

   /// Whether the pool can currently serve a trivial round-trip query.
   ///
   /// Performs a scoped checkout and a `SELECT 1`; any failure (including
   /// a closed pool) converts to `false` rather than propagating.
   pub async fn health_check(&self) -> bool {
      self
         .with_connection(|conn| {
            Box::pin(async move {
               sqlx::query("SELECT 1").execute(&mut *conn).await?;
               Ok::<_, Error>(())
            })
         })
         .await
         .is_ok()
   }

   /// Snapshot of the pool's bookkeeping counters.
   pub fn status(&self) -> PoolStatus {
      let state = self.lock_state();
      PoolStatus {
         max_connections: self.config.max_connections,
         total: state.total,
         idle: state.idle.len(),
      }
   }
}

/// Frees a checked-out connection's slot if the holder unwinds before
/// releasing. Disarmed on the normal path, where `release` does the
/// bookkeeping itself.
struct SlotGuard<'a> {
   pool: &'a ConnectionPool,
   armed: bool,
}

impl Drop for SlotGuard<'_> {
   fn drop(&mut self) {
      if self.armed {
         let mut state = self.pool.lock_state();
         state.total = state.total.saturating_sub(1);
         debug!("connection holder unwound; freeing its slot");
      }
   }
}

/// Close a connection, logging rather than propagating any error.
async fn close_quietly(conn: SqliteConnection) {
   if let Err(e) = conn.close().await {
      debug!("error closing connection: {e}");
   }
}
