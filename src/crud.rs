//! Map-driven CRUD conveniences.
//!
//! Filter maps use one rule per value shape: a JSON array compiles to
//! `IN (...)` (empty array is always false), `null` compiles to
//! `IS NULL`, and any scalar compiles to `column = ?`.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx_sqlite_query_builder::{OrderDirection, QueryBuilder, count_from};

use crate::client::{SqliteClient, WriteQueryResult};
use crate::decode::bind_value;
use crate::{Error, Result};

/// Options for [`SqliteClient::select`].
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
   /// Columns to project; empty means `*`.
   pub columns: Vec<String>,
   /// ORDER BY terms, applied in order.
   pub order_by: Vec<(String, OrderDirection)>,
   pub limit: Option<u64>,
   pub offset: Option<u64>,
}

impl SqliteClient {
   /// Insert one row described by a column map.
   pub async fn insert(
      &self,
      table: &str,
      data: IndexMap<String, JsonValue>,
   ) -> Result<WriteQueryResult> {
      if data.is_empty() {
         return Err(Error::EmptyArgument {
            operation: "insert",
            argument: "data map",
         });
      }

      let (sql, params) = insert_statement(table, &data);
      self.execute(sql, params).await
   }

   /// Insert a batch of rows atomically.
   ///
   /// Every row must carry the same columns in the same order; the first
   /// row defines the expected set.
   pub async fn insert_many(
      &self,
      table: &str,
      rows: Vec<IndexMap<String, JsonValue>>,
   ) -> Result<Vec<WriteQueryResult>> {
      let Some(first) = rows.first() else {
         return Err(Error::EmptyArgument {
            operation: "insert_many",
            argument: "row list",
         });
      };
      if first.is_empty() {
         return Err(Error::EmptyArgument {
            operation: "insert_many",
            argument: "data map",
         });
      }

      let expected: Vec<String> = first.keys().cloned().collect();
      for (i, row) in rows.iter().enumerate().skip(1) {
         let found: Vec<String> = row.keys().cloned().collect();
         if found != expected {
            return Err(Error::ColumnMismatch {
               row: i,
               expected,
               found,
            });
         }
      }

      let (sql, _) = insert_statement(table, first);
      let param_rows: Vec<Vec<JsonValue>> = rows
         .into_iter()
         .map(|row| row.into_values().collect())
         .collect();

      self
         .with_transaction(move |conn| {
            Box::pin(async move {
               let mut results = Vec::with_capacity(param_rows.len());
               for values in param_rows {
                  let mut q = sqlx::query(&sql);
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

   /// Update rows matching a filter map with new column values.
   ///
   /// Both maps must be non-empty; an empty filter would rewrite the
   /// whole table and is rejected.
   pub async fn update(
      &self,
      table: &str,
      data: IndexMap<String, JsonValue>,
      filter: IndexMap<String, JsonValue>,
   ) -> Result<WriteQueryResult> {
      if data.is_empty() {
         return Err(Error::EmptyArgument {
            operation: "update",
            argument: "data map",
         });
      }
      if filter.is_empty() {
         return Err(Error::EmptyArgument {
            operation: "update",
            argument: "filter map",
         });
      }

      let assignments: Vec<String> = data.keys().map(|column| format!("{column} = ?")).collect();
      let mut params: Vec<JsonValue> = data.into_values().collect();

      let (condition, filter_params) = filter_condition(filter);
      params.extend(filter_params);

      let sql = format!(
         "UPDATE {table} SET {} WHERE {condition}",
         assignments.join(", ")
      );
      self.execute(sql, params).await
   }

   /// Delete rows matching a filter map.
   ///
   /// An empty filter would clear the whole table and is rejected.
   pub async fn delete(
      &self,
      table: &str,
      filter: IndexMap<String, JsonValue>,
   ) -> Result<WriteQueryResult> {
      if filter.is_empty() {
         return Err(Error::EmptyArgument {
            operation: "delete",
            argument: "filter map",
         });
      }

      let (condition, params) = filter_condition(filter);
      let sql = format!("DELETE FROM {table} WHERE {condition}");
      self.execute(sql, params).await
   }

   /// Select rows matching a filter map.
   pub async fn select(
      &self,
      table: &str,
      filter: IndexMap<String, JsonValue>,
      options: SelectOptions,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let columns = if options.columns.is_empty() {
         vec!["*".to_string()]
      } else {
         options.columns
      };

      let mut query = QueryBuilder::new().select(columns).from(table);

      if !filter.is_empty() {
         let (condition, params) = filter_condition(filter);
         query = query.where_clause(condition, params);
      }
      for (expr, direction) in options.order_by {
         query = query.order_by(expr, direction);
      }
      if let Some(limit) = options.limit {
         query = query.limit(limit);
      }
      if let Some(offset) = options.offset {
         query = query.offset(offset);
      }

      self.fetch_query(&query).await
   }

   /// Count rows matching a filter map. An empty filter counts the table.
   pub async fn count(
      &self,
      table: &str,
      filter: IndexMap<String, JsonValue>,
   ) -> Result<i64> {
      let mut query = count_from(table, "*");
      if !filter.is_empty() {
         let (condition, params) = filter_condition(filter);
         query = query.where_clause(condition, params);
      }

      let rows = self.fetch_query(&query).await?;
      let count = rows
         .first()
         .and_then(|row| row.values().next())
         .and_then(JsonValue::as_i64)
         .unwrap_or(0);
      Ok(count)
   }
}

/// Render an INSERT statement and its ordered parameters from a column map.
fn insert_statement(table: &str, data: &IndexMap<String, JsonValue>) -> (String, Vec<JsonValue>) {
   let columns: Vec<&str> = data.keys().map(String::as_str).collect();
   let placeholders = vec!["?"; data.len()].join(", ");
   let sql = format!(
      "INSERT INTO {table} ({}) VALUES ({placeholders})",
      columns.join(", ")
   );
   (sql, data.values().cloned().collect())
}

/// AND-join a filter map into a WHERE condition and its parameters.
fn filter_condition(filter: IndexMap<String, JsonValue>) -> (String, Vec<JsonValue>) {
   let mut fragments: Vec<String> = Vec::new();
   let mut params: Vec<JsonValue> = Vec::new();

   for (column, value) in filter {
      match value {
         JsonValue::Null => fragments.push(format!("{column} IS NULL")),
         JsonValue::Array(values) => {
            if values.is_empty() {
               // IN () is invalid SQL; an empty set matches nothing
               fragments.push("1 = 0".to_string());
            } else {
               let placeholders = vec!["?"; values.len()].join(", ");
               fragments.push(format!("{column} IN ({placeholders})"));
               params.extend(values);
            }
         }
         scalar => {
            fragments.push(format!("{column} = ?"));
            params.push(scalar);
         }
      }
   }

   (fragments.join(" AND "), params)
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn map(entries: &[(&str, JsonValue)]) -> IndexMap<String, JsonValue> {
      entries
         .iter()
         .map(|(k, v)| (k.to_string(), v.clone()))
         .collect()
   }

   #[test]
   fn test_insert_statement_preserves_column_order() {
      let data = map(&[("name", json!("Alice")), ("age", json!(30))]);
      let (sql, params) = insert_statement("users", &data);
      assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");
      assert_eq!(params, vec![json!("Alice"), json!(30)]);
   }

   #[test]
   fn test_filter_condition_scalar_and_null() {
      let filter = map(&[("status", json!("active")), ("deleted_at", json!(null))]);
      let (condition, params) = filter_condition(filter);
      assert_eq!(condition, "status = ? AND deleted_at IS NULL");
      assert_eq!(params, vec![json!("active")]);
   }

   #[test]
   fn test_filter_condition_array_becomes_in() {
      let filter = map(&[("id", json!([1, 2, 3]))]);
      let (condition, params) = filter_condition(filter);
      assert_eq!(condition, "id IN (?, ?, ?)");
      assert_eq!(params, vec![json!(1), json!(2), json!(3)]);
   }

   #[test]
   fn test_filter_condition_empty_array_matches_nothing() {
      let filter = map(&[("id", json!([]))]);
      let (condition, params) = filter_condition(filter);
      assert_eq!(condition, "1 = 0");
      assert!(params.is_empty());
   }
}
