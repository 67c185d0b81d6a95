//! Transaction helpers over pooled connections.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteConnection;

use crate::client::{SqliteClient, WriteQueryResult};
use crate::decode::bind_value;
use crate::{Error, Result};

impl SqliteClient {
   /// Run a closure inside a `BEGIN IMMEDIATE` transaction.
   ///
   /// Commits when the closure returns `Ok`, rolls back when it returns
   /// `Err`. The connection is returned to the pool on every exit path.
   /// If the rollback itself fails, the combined
   /// [`Error::TransactionRollbackFailed`] is returned; the pool's
   /// release validation then discards the broken connection.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// # async fn example(db: &sqlx_sqlite_client::SqliteClient) -> Result<(), sqlx_sqlite_client::Error> {
   /// let id: i64 = db
   ///    .with_transaction(|conn| {
   ///       Box::pin(async move {
   ///          sqlx::query("INSERT INTO accounts (name) VALUES ('savings')")
   ///             .execute(&mut *conn)
   ///             .await?;
   ///          let (id,): (i64,) = sqlx::query_as("SELECT last_insert_rowid()")
   ///             .fetch_one(&mut *conn)
   ///             .await?;
   ///          Ok(id)
   ///       })
   ///    })
   ///    .await?;
   /// # let _ = id;
   /// # Ok(())
   /// # }
   /// ```
   pub async fn with_transaction<T, F>(&self, op: F) -> Result<T>
   where
      T: Send + 'static,
      F: Send + 'static,
      F: for<'c> FnOnce(
         &'c mut SqliteConnection,
      ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>,
   {
      self
         .pool()
         .with_connection(move |conn| {
            Box::pin(async move {
               sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

               match op(&mut *conn).await {
                  Ok(value) => {
                     sqlx::query("COMMIT").execute(&mut *conn).await?;
                     Ok(value)
                  }
                  Err(source) => {
                     if let Err(rollback) =
                        sqlx::query("ROLLBACK").execute(&mut *conn).await
                     {
                        tracing::error!("rollback failed after transaction error: {rollback}");
                        return Err(Error::TransactionRollbackFailed {
                           source: Box::new(source),
                           rollback,
                        });
                     }
                     Err(source)
                  }
               }
            })
         })
         .await
   }

   /// Execute a batch of write statements atomically.
   ///
   /// All statements either succeed together or fail together.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// # async fn example(db: &sqlx_sqlite_client::SqliteClient) -> Result<(), sqlx_sqlite_client::Error> {
   /// use serde_json::json;
   ///
   /// let results = db.execute_transaction(vec![
   ///     ("INSERT INTO users (name) VALUES (?)", vec![json!("Alice")]),
   ///     ("INSERT INTO users (name) VALUES (?)", vec![json!("Bob")]),
   /// ]).await?;
   ///
   /// println!("Inserted {} rows total", results.len());
   /// # Ok(())
   /// # }
   /// ```
   pub async fn execute_transaction(
      &self,
      statements: Vec<(&str, Vec<JsonValue>)>,
   ) -> Result<Vec<WriteQueryResult>> {
      let statements: Vec<(String, Vec<JsonValue>)> = statements
         .into_iter()
         .map(|(query, values)| (query.to_string(), values))
         .collect();

      self
         .with_transaction(move |conn| {
            Box::pin(async move {
               let mut results = Vec::with_capacity(statements.len());
               for (query, values) in statements {
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
               Ok(results)
            })
         })
         .await
   }
}
