/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the SQLite client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection pool.
   #[error(transparent)]
   Pool(#[from] sqlx_sqlite_conn_pool::Error),

   /// Error from query building.
   #[error(transparent)]
   QueryBuild(#[from] sqlx_sqlite_query_builder::Error),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// Multiple rows returned from a fetch_one query.
   #[error("fetch_one() query returned {0} rows, expected 0 or 1")]
   MultipleRowsReturned(usize),

   /// A write helper was called with nothing to write or filter on.
   #[error("{operation}() requires a non-empty {argument}")]
   EmptyArgument {
      operation: &'static str,
      argument: &'static str,
   },

   /// Rows passed to insert_many did not share the same column set.
   #[error("insert_many() row {row} has columns {found:?}, expected {expected:?}")]
   ColumnMismatch {
      row: usize,
      expected: Vec<String>,
      found: Vec<String>,
   },

   /// A transaction failed and the subsequent ROLLBACK failed too.
   ///
   /// The connection is discarded by the pool on release, so the
   /// half-open transaction cannot leak into later checkouts.
   #[error("transaction failed ({source}) and rollback also failed: {rollback}")]
   TransactionRollbackFailed {
      #[source]
      source: Box<Error>,
      rollback: sqlx::Error,
   },
}

impl Error {
   /// Extract a structured, machine-readable error code.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            // Surface SQLite error codes from sqlx errors
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Pool(sqlx_sqlite_conn_pool::Error::PoolClosed) => "POOL_CLOSED".to_string(),
         Error::Pool(sqlx_sqlite_conn_pool::Error::PoolExhausted { .. }) => {
            "POOL_EXHAUSTED".to_string()
         }
         Error::Pool(_) => "CONNECTION_ERROR".to_string(),
         Error::QueryBuild(_) => "QUERY_BUILD_ERROR".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::MultipleRowsReturned(_) => "MULTIPLE_ROWS_RETURNED".to_string(),
         Error::EmptyArgument { .. } => "EMPTY_ARGUMENT".to_string(),
         Error::ColumnMismatch { .. } => "COLUMN_MISMATCH".to_string(),
         Error::TransactionRollbackFailed { .. } => "TRANSACTION_ROLLBACK_FAILED".to_string(),
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_codes() {
      let err = Error::MultipleRowsReturned(3);
      assert_eq!(err.error_code(), "MULTIPLE_ROWS_RETURNED");

      let err = Error::Pool(sqlx_sqlite_conn_pool::Error::PoolClosed);
      assert_eq!(err.error_code(), "POOL_CLOSED");

      let err = Error::Pool(sqlx_sqlite_conn_pool::Error::PoolExhausted { max: 4 });
      assert_eq!(err.error_code(), "POOL_EXHAUSTED");

      let err = Error::QueryBuild(sqlx_sqlite_query_builder::Error::MissingFrom);
      assert_eq!(err.error_code(), "QUERY_BUILD_ERROR");
   }

   #[test]
   fn test_empty_argument_message() {
      let err = Error::EmptyArgument {
         operation: "update",
         argument: "data map",
      };
      assert_eq!(err.to_string(), "update() requires a non-empty data map");
   }
}
