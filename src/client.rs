use std::path::Path;
use std::sync::Arc;

use futures::TryStreamExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_pool::{ConnectionPool, PoolConfig, PoolStatus};
use sqlx_sqlite_query_builder::QueryBuilder;

use crate::decode::{bind_value, decode_rows};
use crate::{Error, Result};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   ///
   /// Only set for INSERT operations on tables with a ROWID.
   /// Tables created with `WITHOUT ROWID` will not set this value (returns 0).
   pub last_insert_id: i64,
}

/// High-level SQLite client over a bounded connection pool.
///
/// Every operation performs a scoped checkout: a connection is acquired,
/// used, and returned on every exit path. The client is a cheap handle
/// over the shared pool and can be cloned freely.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), sqlx_sqlite_client::Error> {
/// use serde_json::json;
/// use sqlx_sqlite_client::SqliteClient;
///
/// let db = SqliteClient::connect("app.db", None).await?;
///
/// db.execute(
///     "INSERT INTO users (name, age) VALUES (?, ?)".into(),
///     vec![json!("Alice"), json!(30)],
/// ).await?;
///
/// let rows = db.fetch_all(
///     "SELECT name, age FROM users WHERE age > ?".into(),
///     vec![json!(21)],
/// ).await?;
///
/// for row in &rows {
///     println!("{}: {}", row["name"], row["age"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqliteClient {
   pool: Arc<ConnectionPool>,
}

impl SqliteClient {
   /// Connect to the SQLite database at `path`.
   ///
   /// The file is created if missing. Pass `None` for `custom_config` to
   /// use [`PoolConfig::default`].
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<PoolConfig>,
   ) -> Result<Self> {
      let pool = ConnectionPool::connect(path, custom_config).await?;
      Ok(Self { pool })
   }

   /// The underlying pool, for advanced usage.
   pub fn pool(&self) -> &Arc<ConnectionPool> {
      &self.pool
   }

   /// Execute a write statement (INSERT/UPDATE/DELETE/DDL).
   pub async fn execute(&self, query: String, values: Vec<JsonValue>) -> Result<WriteQueryResult> {
      self
         .pool
         .with_connection(move |conn| {
            Box::pin(async move {
               let mut q = sqlx::query(&query);
               for value in values {
                  q = bind_value(q, value);
               }
               let result = q.execute(&mut *conn).await?;
               Ok::<_, Error>(WriteQueryResult {
                  rows_affected: result.rows_affected(),
                  last_insert_id: result.last_insert_rowid(),
               })
            })
         })
         .await
   }

   /// Execute the same statement once per parameter row, on one connection.
   ///
   /// Rows run independently; this is not a transaction. Use
   /// [`SqliteClient::execute_transaction`] for all-or-nothing batches.
   pub async fn execute_many(
      &self,
      query: String,
      rows: Vec<Vec<JsonValue>>,
   ) -> Result<Vec<WriteQueryResult>> {
      self
         .pool
         .with_connection(move |conn| {
            Box::pin(async move {
               let mut results = Vec::with_capacity(rows.len());
               for values in rows {
                  let mut q = sqlx::query(&query);
                  for value in values {
                     q = bind_value(q, value);
                  }
                  let result = q.execute(&mut *conn).await?;
                  results.push(WriteQueryResult {
                     rows_affected: result.rows_affected(),
                     last_insert_id: result.last_insert_rowid(),
                  });
               }
               Ok::<_, Error>(results)
            })
         })
         .await
   }

   /// Run a multi-statement SQL script.
   ///
   /// Statements execute in order on one connection, without parameter
   /// binding. Intended for DDL batches (schema setup, seed scripts);
   /// parameterized writes go through [`SqliteClient::execute`].
   pub async fn execute_script(&self, script: String) -> Result<()> {
      self
         .pool
         .with_connection(move |conn| {
            Box::pin(async move {
               sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&script)).await?;
               Ok::<_, Error>(())
            })
         })
         .await
   }

   /// Run a SELECT and decode every row to an ordered column map.
   pub async fn fetch_all(
      &self,
      query: String,
      values: Vec<JsonValue>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      self
         .pool
         .with_connection(move |conn| {
            Box::pin(async move {
               let mut q = sqlx::query(&query);
               for value in values {
                  q = bind_value(q, value);
               }
               let rows = q.fetch_all(&mut *conn).await?;
               decode_rows(rows)
            })
         })
         .await
   }

   /// Run a SELECT and decode at most `size` rows.
   ///
   /// The statement streams and stops after `size` rows rather than
   /// materializing the full result set. A `size` of zero fetches
   /// nothing.
   pub async fn fetch_many(
      &self,
      query: String,
      values: Vec<JsonValue>,
      size: usize,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      if size == 0 {
         return Ok(Vec::new());
      }

      self
         .pool
         .with_connection(move |conn| {
            Box::pin(async move {
               let mut q = sqlx::query(&query);
               for value in values {
                  q = bind_value(q, value);
               }

               let mut stream = q.fetch(&mut *conn);
               let mut rows = Vec::new();
               while let Some(row) = stream.try_next().await? {
                  rows.push(row);
                  if rows.len() == size {
                     break;
                  }
               }
               drop(stream);

               decode_rows(rows)
            })
         })
         .await
   }

   /// Run a SELECT expected to return zero or one row.
   ///
   /// Returns an error if the query returns more than one row.
   pub async fn fetch_one(
      &self,
      query: String,
      values: Vec<JsonValue>,
   ) -> Result<Option<IndexMap<String, JsonValue>>> {
      let mut rows = self.fetch_all(query, values).await?;
      match rows.len() {
         0 => Ok(None),
         1 => Ok(rows.pop()),
         n => Err(Error::MultipleRowsReturned(n)),
      }
   }

   /// Build and run a [`QueryBuilder`] query.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// # async fn example(db: &sqlx_sqlite_client::SqliteClient) -> Result<(), sqlx_sqlite_client::Error> {
   /// use serde_json::json;
   /// use sqlx_sqlite_client::{OrderDirection, QueryBuilder};
   ///
   /// let query = QueryBuilder::new()
   ///    .select(vec!["name", "age"])
   ///    .from("users")
   ///    .where_clause("age > ?", vec![json!(21)])
   ///    .order_by("name", OrderDirection::Asc);
   ///
   /// let rows = db.fetch_query(&query).await?;
   /// # let _ = rows;
   /// # Ok(())
   /// # }
   /// ```
   pub async fn fetch_query(
      &self,
      query: &QueryBuilder,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let built = query.build()?;
      self.fetch_all(built.sql, built.params).await
   }

   /// Whether a table with the given name exists.
   pub async fn table_exists(&self, table: &str) -> Result<bool> {
      let row = self
         .fetch_one(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?".to_string(),
            vec![JsonValue::String(table.to_string())],
         )
         .await?;
      Ok(row.is_some())
   }

   /// Column metadata for a table, one row per column.
   ///
   /// Rows carry SQLite's `table_info` columns (`cid`, `name`, `type`,
   /// `notnull`, `dflt_value`, `pk`). An unknown table yields an empty
   /// list, mirroring the underlying PRAGMA.
   pub async fn table_info(&self, table: &str) -> Result<Vec<IndexMap<String, JsonValue>>> {
      // PRAGMA arguments cannot be bound as parameters
      self
         .fetch_all(format!("PRAGMA table_info({table})"), Vec::new())
         .await
   }

   /// Names of all user tables, alphabetically.
   pub async fn tables(&self) -> Result<Vec<String>> {
      let rows = self
         .fetch_all(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
               .to_string(),
            Vec::new(),
         )
         .await?;

      Ok(rows
         .into_iter()
         .filter_map(|row| row.get("name").and_then(JsonValue::as_str).map(String::from))
         .collect())
   }

   /// Whether the database currently answers a trivial query.
   pub async fn health_check(&self) -> bool {
      self.pool.health_check().await
   }

   /// Snapshot of the pool's connection counters.
   pub fn status(&self) -> PoolStatus {
      self.pool.status()
   }

   /// Close the pool. Subsequent operations fail with a pool-closed error.
   pub async fn close(&self) {
      self.pool.close_all().await;
   }
}
