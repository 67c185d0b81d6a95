//! Conversions between SQLite values and JSON.
//!
//! Result rows travel as `IndexMap<String, JsonValue>` so column order is
//! preserved; bound parameters travel in the other direction as
//! `serde_json::Value`.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteArguments, SqliteRow, SqliteValueRef};
use sqlx::{Column, Row, TypeInfo, Value, ValueRef};
use time::PrimitiveDateTime;

use crate::Error;

/// Convert a single SQLite value to a JSON value.
///
/// BLOB values become base64 strings since JSON has no binary type.
/// Booleans are stored as INTEGER in SQLite but surface as JSON booleans
/// when the column is declared BOOLEAN.
pub fn to_json(value: SqliteValueRef) -> Result<JsonValue, Error> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let column_type = value.type_info();

   let result = match column_type.name() {
      // DATE and TIME are stored as ISO 8601 text
      "TEXT" | "DATE" | "TIME" => {
         if let Ok(v) = value.to_owned().try_decode::<String>() {
            JsonValue::String(v)
         } else {
            JsonValue::Null
         }
      }

      "REAL" => {
         if let Ok(v) = value.to_owned().try_decode::<f64>() {
            JsonValue::from(v)
         } else {
            JsonValue::Null
         }
      }

      "INTEGER" | "NUMERIC" => {
         if let Ok(v) = value.to_owned().try_decode::<i64>() {
            JsonValue::Number(v.into())
         } else {
            JsonValue::Null
         }
      }

      "BOOLEAN" => {
         if let Ok(v) = value.to_owned().try_decode::<bool>() {
            JsonValue::Bool(v)
         } else {
            JsonValue::Null
         }
      }

      "DATETIME" => {
         if let Ok(dt) = value.to_owned().try_decode::<PrimitiveDateTime>() {
            JsonValue::String(dt.to_string())
         } else if let Ok(v) = value.to_owned().try_decode::<String>() {
            // Not every stored datetime parses; keep the raw text
            JsonValue::String(v)
         } else {
            JsonValue::Null
         }
      }

      "BLOB" => {
         if let Ok(blob) = value.to_owned().try_decode::<Vec<u8>>() {
            JsonValue::String(base64_encode(&blob))
         } else {
            JsonValue::Null
         }
      }

      "NULL" => JsonValue::Null,

      _ => {
         // Unknown declared types fall back to their text representation
         if let Ok(text) = value.to_owned().try_decode::<String>() {
            JsonValue::String(text)
         } else {
            return Err(Error::UnsupportedDatatype(format!(
               "Unknown SQLite type: {}",
               column_type.name()
            )));
         }
      }
   };

   Ok(result)
}

/// Decode a batch of rows into ordered column maps.
pub fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<IndexMap<String, JsonValue>>, Error> {
   let mut values = Vec::with_capacity(rows.len());
   for row in rows {
      let mut value = IndexMap::default();
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         let v = to_json(v)?;
         value.insert(column.name().to_string(), v);
      }
      values.push(value);
   }
   Ok(values)
}

/// Bind a JSON value to a SQLx query as the matching SQLite type.
pub fn bind_value<'a>(
   query: sqlx::query::Query<'a, sqlx::Sqlite, SqliteArguments<'a>>,
   value: JsonValue,
) -> sqlx::query::Query<'a, sqlx::Sqlite, SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => {
         // Bind as i64 when the value fits so integer precision survives
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            if uint_val <= i64::MAX as u64 {
               query.bind(uint_val as i64)
            } else {
               query.bind(uint_val as f64)
            }
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}

fn base64_encode(data: &[u8]) -> String {
   use base64::Engine;
   base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_base64_encode() {
      assert_eq!(base64_encode(b"hello"), "aGVsbG8=");
      assert_eq!(base64_encode(&[1, 2, 3, 4, 5]), "AQIDBAU=");
      assert_eq!(base64_encode(&[]), "");
   }

   #[test]
   fn test_base64_encode_binary() {
      assert_eq!(base64_encode(&[0, 0, 0]), "AAAA");
      assert_eq!(base64_encode(&[255, 255, 255]), "////");
   }
}
