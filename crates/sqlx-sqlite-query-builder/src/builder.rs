//! Chainable SELECT query builder and its compiled output

use serde_json::Value as JsonValue;

use crate::Result;
use crate::clause::{JoinClause, JoinKind, OrderDirection, OrderTerm, Predicate};
use crate::error::Error;

/// Maximum UNION nesting accepted by `build()`. Union branches compile
/// recursively; the limit bounds pathological nesting.
const MAX_UNION_DEPTH: usize = 32;

/// A compiled query: SQL text plus the parameters to bind positionally.
///
/// The Nth `?` placeholder in `sql` binds to `params[N]`. The caller is
/// responsible for passing `params` to the driver; this crate only
/// assembles text.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
   pub sql: String,
   pub params: Vec<JsonValue>,
}

/// Fluent builder for SQLite SELECT statements.
///
/// Each chaining method consumes the builder, appends to its ordered
/// clause lists, and returns it. Nothing is validated until
/// [`QueryBuilder::build`], which compiles the accumulated state without
/// mutating it (repeated calls yield identical output).
///
/// Clause emission order is fixed: SELECT, FROM, JOINs in call order,
/// WHERE (AND-joined), GROUP BY, HAVING (AND-joined), ORDER BY, LIMIT,
/// OFFSET, then one `UNION <subquery>` per unioned builder in call order.
/// Parameter order mirrors emission order exactly.
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_query_builder::QueryBuilder;
/// use serde_json::json;
///
/// let built = QueryBuilder::new()
///    .select(["u.name", "COUNT(o.id) AS orders"])
///    .from_as("users", "u")
///    .left_join("orders o", "o.user_id = u.id")
///    .where_clause("u.active = ?", vec![json!(1)])
///    .group_by(["u.name"])
///    .build()
///    .unwrap();
///
/// assert_eq!(built.params, vec![json!(1)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
   select_columns: Vec<String>,
   distinct: bool,
   from_table: Option<String>,
   joins: Vec<JoinClause>,
   where_clauses: Vec<Predicate>,
   group_by_columns: Vec<String>,
   having_clauses: Vec<Predicate>,
   order_terms: Vec<OrderTerm>,
   limit_count: Option<u64>,
   offset_count: Option<u64>,
   unions: Vec<QueryBuilder>,
}

impl QueryBuilder {
   /// Create an empty builder.
   pub fn new() -> Self {
      Self::default()
   }

   /// Append columns or expressions to the projection list.
   ///
   /// Repeated calls are additive.
   pub fn select<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.select_columns.extend(columns.into_iter().map(Into::into));
      self
   }

   /// Append columns and mark the projection DISTINCT.
   ///
   /// DISTINCT is a one-way flag: once set it applies to the whole
   /// projection regardless of later `select()` calls.
   pub fn select_distinct<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.distinct = true;
      self.select(columns)
   }

   /// Set the FROM table. Calling again overwrites the previous target.
   pub fn from(mut self, table: impl Into<String>) -> Self {
      self.from_table = Some(table.into());
      self
   }

   /// Set the FROM table with an alias.
   pub fn from_as(mut self, table: &str, alias: &str) -> Self {
      self.from_table = Some(format!("{table} {alias}"));
      self
   }

   /// Append a JOIN clause. Call order determines emission order.
   ///
   /// `condition` may be empty only for [`JoinKind::Cross`], which emits
   /// no `ON` fragment.
   pub fn join(
      mut self,
      table: impl Into<String>,
      condition: impl Into<String>,
      kind: JoinKind,
      alias: Option<&str>,
   ) -> Self {
      self.joins.push(JoinClause {
         table: table.into(),
         condition: condition.into(),
         kind,
         alias: alias.map(str::to_owned),
      });
      self
   }

   /// Append an INNER JOIN clause.
   pub fn inner_join(self, table: impl Into<String>, condition: impl Into<String>) -> Self {
      self.join(table, condition, JoinKind::Inner, None)
   }

   /// Append a LEFT JOIN clause.
   pub fn left_join(self, table: impl Into<String>, condition: impl Into<String>) -> Self {
      self.join(table, condition, JoinKind::Left, None)
   }

   /// Append a RIGHT JOIN clause.
   pub fn right_join(self, table: impl Into<String>, condition: impl Into<String>) -> Self {
      self.join(table, condition, JoinKind::Right, None)
   }

   /// Append a FULL OUTER JOIN clause.
   pub fn full_join(self, table: impl Into<String>, condition: impl Into<String>) -> Self {
      self.join(table, condition, JoinKind::Full, None)
   }

   /// Append a CROSS JOIN clause (no join condition).
   pub fn cross_join(self, table: impl Into<String>) -> Self {
      self.join(table, "", JoinKind::Cross, None)
   }

   /// Append a raw WHERE predicate with its bound parameters.
   ///
   /// Multiple WHERE predicates are AND-joined at build time. The `?`
   /// count in `condition` must match `params.len()`; the mismatch is
   /// reported by `build()`, never here. Every `?` counts, including one
   /// inside a quoted literal like `'?'` — a literal question mark must
   /// be passed as a bound parameter, not inlined in the condition text.
   pub fn where_clause(mut self, condition: impl Into<String>, params: Vec<JsonValue>) -> Self {
      self.where_clauses.push(Predicate {
         condition: condition.into(),
         params,
      });
      self
   }

   /// Append `column IN (?, ...)`.
   ///
   /// An empty value list compiles to the always-false predicate `1 = 0`
   /// instead of invalid `IN ()` SQL.
   pub fn where_in(self, column: &str, values: Vec<JsonValue>) -> Self {
      if values.is_empty() {
         return self.where_clause("1 = 0", Vec::new());
      }
      let placeholders = vec!["?"; values.len()].join(", ");
      self.where_clause(format!("{column} IN ({placeholders})"), values)
   }

   /// Append `column NOT IN (?, ...)`.
   ///
   /// An empty value list is always true, so the clause is skipped
   /// entirely.
   pub fn where_not_in(self, column: &str, values: Vec<JsonValue>) -> Self {
      if values.is_empty() {
         return self;
      }
      let placeholders = vec!["?"; values.len()].join(", ");
      self.where_clause(format!("{column} NOT IN ({placeholders})"), values)
   }

   /// Append `column BETWEEN ? AND ?`.
   pub fn where_between(self, column: &str, low: JsonValue, high: JsonValue) -> Self {
      self.where_clause(format!("{column} BETWEEN ? AND ?"), vec![low, high])
   }

   /// Append `column LIKE ?`.
   pub fn where_like(self, column: &str, pattern: impl Into<String>) -> Self {
      self.where_clause(format!("{column} LIKE ?"), vec![JsonValue::String(pattern.into())])
   }

   /// Append `column IS NULL`.
   pub fn where_is_null(self, column: &str) -> Self {
      self.where_clause(format!("{column} IS NULL"), Vec::new())
   }

   /// Append `column IS NOT NULL`.
   pub fn where_is_not_null(self, column: &str) -> Self {
      self.where_clause(format!("{column} IS NOT NULL"), Vec::new())
   }

   /// Append columns to the GROUP BY list.
   pub fn group_by<I, S>(mut self, columns: I) -> Self
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      self.group_by_columns.extend(columns.into_iter().map(Into::into));
      self
   }

   /// Append a raw HAVING predicate with its bound parameters.
   ///
   /// Multiple HAVING predicates are AND-joined at build time.
   pub fn having(mut self, condition: impl Into<String>, params: Vec<JsonValue>) -> Self {
      self.having_clauses.push(Predicate {
         condition: condition.into(),
         params,
      });
      self
   }

   /// Append an ORDER BY term.
   pub fn order_by(mut self, expr: impl Into<String>, direction: OrderDirection) -> Self {
      self.order_terms.push(OrderTerm {
         expr: expr.into(),
         direction,
      });
      self
   }

   /// Set the LIMIT count.
   pub fn limit(mut self, count: u64) -> Self {
      self.limit_count = Some(count);
      self
   }

   /// Set the OFFSET count.
   pub fn offset(mut self, count: u64) -> Self {
      self.offset_count = Some(count);
      self
   }

   /// Append a UNION branch.
   ///
   /// The sub-builder is stored whole and compiled recursively by
   /// `build()`; its parameters follow this query's own parameters in the
   /// output, branch by branch in call order.
   pub fn union(mut self, other: QueryBuilder) -> Self {
      self.unions.push(other);
      self
   }

   /// Compile the accumulated state into SQL text plus ordered parameters.
   ///
   /// Fails with [`Error::MissingSelect`] or [`Error::MissingFrom`] when
   /// the projection or FROM target is absent, and with
   /// [`Error::BindingMismatch`] when any predicate's placeholder count
   /// disagrees with its parameter count. Read-only: calling twice on the
   /// same builder yields byte-identical output.
   pub fn build(&self) -> Result<BuiltQuery> {
      self.build_at_depth(0)
   }

   fn build_at_depth(&self, depth: usize) -> Result<BuiltQuery> {
      if depth > MAX_UNION_DEPTH {
         return Err(Error::UnionTooDeep {
            max: MAX_UNION_DEPTH,
         });
      }

      if self.select_columns.is_empty() {
         return Err(Error::MissingSelect);
      }
      let Some(from_table) = &self.from_table else {
         return Err(Error::MissingFrom);
      };

      let mut parts: Vec<String> = Vec::new();
      let mut params: Vec<JsonValue> = Vec::new();

      let distinct = if self.distinct { "DISTINCT " } else { "" };
      parts.push(format!("SELECT {distinct}{}", self.select_columns.join(", ")));
      parts.push(format!("FROM {from_table}"));

      for join in &self.joins {
         let mut target = join.table.clone();
         if let Some(alias) = &join.alias {
            target.push(' ');
            target.push_str(alias);
         }
         match join.kind {
            JoinKind::Cross => parts.push(format!("{} {}", join.kind.as_sql(), target)),
            _ => parts.push(format!("{} {} ON {}", join.kind.as_sql(), target, join.condition)),
         }
      }

      if !self.where_clauses.is_empty() {
         parts.push(format!(
            "WHERE {}",
            compile_predicates(&self.where_clauses, &mut params)?
         ));
      }

      if !self.group_by_columns.is_empty() {
         parts.push(format!("GROUP BY {}", self.group_by_columns.join(", ")));
      }

      if !self.having_clauses.is_empty() {
         parts.push(format!(
            "HAVING {}",
            compile_predicates(&self.having_clauses, &mut params)?
         ));
      }

      if !self.order_terms.is_empty() {
         let terms: Vec<String> = self
            .order_terms
            .iter()
            .map(|term| format!("{} {}", term.expr, term.direction.as_sql()))
            .collect();
         parts.push(format!("ORDER BY {}", terms.join(", ")));
      }

      if let Some(count) = self.limit_count {
         parts.push(format!("LIMIT {count}"));
      }
      if let Some(count) = self.offset_count {
         parts.push(format!("OFFSET {count}"));
      }

      let mut sql = parts.join(" ");

      for sub_query in &self.unions {
         let compiled = sub_query.build_at_depth(depth + 1)?;
         sql.push_str(" UNION ");
         sql.push_str(&compiled.sql);
         params.extend(compiled.params);
      }

      Ok(BuiltQuery { sql, params })
   }
}

/// AND-join predicates, appending their parameters in clause order.
///
/// Verifies each predicate's `?` count against its parameter count; this
/// is the defensive binding check that keeps the positional contract
/// honest. Counting is textual, so a `?` inside a quoted literal counts
/// too; predicates must bind literal question marks as parameters.
fn compile_predicates(predicates: &[Predicate], params: &mut Vec<JsonValue>) -> Result<String> {
   let mut conditions: Vec<&str> = Vec::new();
   for predicate in predicates {
      let placeholders = predicate.condition.matches('?').count();
      if placeholders != predicate.params.len() {
         return Err(Error::BindingMismatch {
            condition: predicate.condition.clone(),
            placeholders,
            params: predicate.params.len(),
         });
      }
      conditions.push(&predicate.condition);
      params.extend(predicate.params.iter().cloned());
   }
   Ok(conditions.join(" AND "))
}

/// Builder preloaded with a projection and FROM table.
pub fn select_from<I, S>(table: &str, columns: I) -> QueryBuilder
where
   I: IntoIterator<Item = S>,
   S: Into<String>,
{
   QueryBuilder::new().select(columns).from(table)
}

/// Builder for a `COUNT(column)` query against one table.
pub fn count_from(table: &str, column: &str) -> QueryBuilder {
   QueryBuilder::new().select([format!("COUNT({column})")]).from(table)
}

/// Builder for an EXISTS-style check: `SELECT 1 FROM table WHERE ...`.
pub fn exists_in(table: &str, condition: impl Into<String>, params: Vec<JsonValue>) -> QueryBuilder {
   QueryBuilder::new().select(["1"]).from(table).where_clause(condition, params)
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn test_select_from_helper() {
      let built = select_from("users", ["id", "name"]).build().unwrap();
      assert_eq!(built.sql, "SELECT id, name FROM users");
      assert!(built.params.is_empty());
   }

   #[test]
   fn test_count_from_helper() {
      let built = count_from("users", "*").build().unwrap();
      assert_eq!(built.sql, "SELECT COUNT(*) FROM users");
   }

   #[test]
   fn test_exists_in_helper() {
      let built = exists_in("users", "email = ?", vec![json!("a@b.c")])
         .build()
         .unwrap();
      assert_eq!(built.sql, "SELECT 1 FROM users WHERE email = ?");
      assert_eq!(built.params, vec![json!("a@b.c")]);
   }
}
