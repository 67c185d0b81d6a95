//! Configuration for pooled SQLite connections

use serde::{Deserialize, Serialize};

/// SQLite journal mode (`PRAGMA journal_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalMode {
   Delete,
   Truncate,
   Persist,
   Memory,
   Wal,
   Off,
}

impl JournalMode {
   pub fn as_sql(self) -> &'static str {
      match self {
         JournalMode::Delete => "DELETE",
         JournalMode::Truncate => "TRUNCATE",
         JournalMode::Persist => "PERSIST",
         JournalMode::Memory => "MEMORY",
         JournalMode::Wal => "WAL",
         JournalMode::Off => "OFF",
      }
   }
}

/// SQLite fsync aggressiveness (`PRAGMA synchronous`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Synchronous {
   Off,
   Normal,
   Full,
   Extra,
}

impl Synchronous {
   pub fn as_sql(self) -> &'static str {
      match self {
         Synchronous::Off => "OFF",
         Synchronous::Normal => "NORMAL",
         Synchronous::Full => "FULL",
         Synchronous::Extra => "EXTRA",
      }
   }
}

/// Storage for temporary tables and indices (`PRAGMA temp_store`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempStore {
   Default,
   File,
   Memory,
}

impl TempStore {
   pub fn as_sql(self) -> &'static str {
      match self {
         TempStore::Default => "DEFAULT",
         TempStore::File => "FILE",
         TempStore::Memory => "MEMORY",
      }
   }
}

/// What `acquire()` does when `max_connections` handles are already
/// checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
   /// Open an overflow connection beyond the bound rather than failing.
   /// The overflow is logged; surplus connections are closed instead of
   /// re-pooled when returned. This favors liveness over strict bounding.
   Overflow,

   /// Fail the acquire with [`crate::Error::PoolExhausted`], keeping the
   /// bound strict.
   Reject,
}

/// Configuration for [`crate::ConnectionPool`].
///
/// Every connection the pool opens receives the same PRAGMA sequence,
/// generated by [`PoolConfig::pragma_statements`].
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_pool::PoolConfig;
///
/// // Use defaults
/// let config = PoolConfig::default();
///
/// // Override just one field
/// let config = PoolConfig {
///     max_connections: 4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
   /// Maximum wait for the engine's file lock, in seconds
   /// (`PRAGMA busy_timeout`).
   ///
   /// Default: 30
   pub busy_timeout_secs: u64,

   /// Enable referential-integrity enforcement (`PRAGMA foreign_keys`).
   ///
   /// Default: true
   pub foreign_keys: bool,

   /// Durability strategy: write-ahead log vs rollback journal.
   ///
   /// Default: WAL
   pub journal_mode: JournalMode,

   /// Fsync aggressiveness vs throughput tradeoff.
   ///
   /// Default: NORMAL
   pub synchronous: Synchronous,

   /// Page cache budget (`PRAGMA cache_size`). Negative values are KiB,
   /// positive values are pages.
   ///
   /// Default: -2000 (2 MiB)
   pub cache_size: i64,

   /// Memory vs file storage for temporary structures.
   ///
   /// Default: MEMORY
   pub temp_store: TempStore,

   /// Memory-mapped I/O window size in bytes (`PRAGMA mmap_size`).
   ///
   /// Default: 134217728 (128 MiB)
   pub mmap_size: u64,

   /// Upper bound on connections the pool creates. Soft under
   /// [`ExhaustionPolicy::Overflow`], strict under
   /// [`ExhaustionPolicy::Reject`]. Also bounds the idle list.
   ///
   /// Default: 10
   pub max_connections: usize,

   /// Behavior when the bound is reached with nothing idle.
   ///
   /// Default: Overflow
   pub exhaustion_policy: ExhaustionPolicy,
}

impl Default for PoolConfig {
   fn default() -> Self {
      Self {
         busy_timeout_secs: 30,
         foreign_keys: true,
         journal_mode: JournalMode::Wal,
         synchronous: Synchronous::Normal,
         cache_size: -2000,
         temp_store: TempStore::Memory,
         mmap_size: 134_217_728,
         max_connections: 10,
         exhaustion_policy: ExhaustionPolicy::Overflow,
      }
   }
}

impl PoolConfig {
   /// The ordered setup statements applied to each freshly opened
   /// connection.
   ///
   /// Pure: depends only on the config record, so it can be inspected
   /// and tested without touching the engine.
   pub fn pragma_statements(&self) -> Vec<String> {
      let mut statements = Vec::new();
      if self.foreign_keys {
         statements.push("PRAGMA foreign_keys = ON".to_string());
      }
      statements.push(format!(
         "PRAGMA busy_timeout = {}",
         self.busy_timeout_secs * 1000
      ));
      statements.push(format!("PRAGMA journal_mode = {}", self.journal_mode.as_sql()));
      statements.push(format!("PRAGMA synchronous = {}", self.synchronous.as_sql()));
      statements.push(format!("PRAGMA cache_size = {}", self.cache_size));
      statements.push(format!("PRAGMA temp_store = {}", self.temp_store.as_sql()));
      statements.push(format!("PRAGMA mmap_size = {}", self.mmap_size));
      statements
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_default_pragma_statements() {
      let statements = PoolConfig::default().pragma_statements();
      assert_eq!(
         statements,
         vec![
            "PRAGMA foreign_keys = ON",
            "PRAGMA busy_timeout = 30000",
            "PRAGMA journal_mode = WAL",
            "PRAGMA synchronous = NORMAL",
            "PRAGMA cache_size = -2000",
            "PRAGMA temp_store = MEMORY",
            "PRAGMA mmap_size = 134217728",
         ]
      );
   }

   #[test]
   fn test_foreign_keys_off_drops_the_pragma() {
      let config = PoolConfig {
         foreign_keys: false,
         ..Default::default()
      };
      assert!(
         config
            .pragma_statements()
            .iter()
            .all(|s| !s.contains("foreign_keys"))
      );
   }

   #[test]
   fn test_pragma_statements_track_config() {
      let config = PoolConfig {
         busy_timeout_secs: 5,
         journal_mode: JournalMode::Delete,
         synchronous: Synchronous::Full,
         cache_size: 500,
         temp_store: TempStore::File,
         mmap_size: 0,
         ..Default::default()
      };
      let statements = config.pragma_statements();
      assert!(statements.contains(&"PRAGMA busy_timeout = 5000".to_string()));
      assert!(statements.contains(&"PRAGMA journal_mode = DELETE".to_string()));
      assert!(statements.contains(&"PRAGMA synchronous = FULL".to_string()));
      assert!(statements.contains(&"PRAGMA cache_size = 500".to_string()));
      assert!(statements.contains(&"PRAGMA temp_store = FILE".to_string()));
      assert!(statements.contains(&"PRAGMA mmap_size = 0".to_string()));
   }
}
