//! Clause value types stored by the query builder

use serde_json::Value as JsonValue;

/// The kind of a JOIN clause.
///
/// Closed enumeration; [`JoinKind::as_sql`] is the rendering table used
/// during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
   Inner,
   Left,
   Right,
   Full,
   Cross,
}

impl JoinKind {
   /// The SQL keyword sequence for this join kind.
   pub fn as_sql(self) -> &'static str {
      match self {
         JoinKind::Inner => "INNER JOIN",
         JoinKind::Left => "LEFT JOIN",
         JoinKind::Right => "RIGHT JOIN",
         JoinKind::Full => "FULL OUTER JOIN",
         JoinKind::Cross => "CROSS JOIN",
      }
   }
}

/// Sort direction for an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
   Asc,
   Desc,
}

impl OrderDirection {
   pub fn as_sql(self) -> &'static str {
      match self {
         OrderDirection::Asc => "ASC",
         OrderDirection::Desc => "DESC",
      }
   }
}

/// A single JOIN clause.
///
/// `condition` is empty only for [`JoinKind::Cross`], which emits no `ON`
/// fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
   pub table: String,
   pub condition: String,
   pub kind: JoinKind,
   pub alias: Option<String>,
}

/// A WHERE or HAVING fragment plus its ordered bound parameters.
///
/// The number of `?` placeholders in `condition` must equal `params.len()`;
/// this is verified when the query is built, not when the predicate is
/// appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
   pub condition: String,
   pub params: Vec<JsonValue>,
}

/// A single ORDER BY term: a column or expression plus its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
   pub expr: String,
   pub direction: OrderDirection,
}
