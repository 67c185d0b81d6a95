//! Error types for sqlx-sqlite-query-builder

use thiserror::Error;

/// Errors raised by [`crate::QueryBuilder::build`].
///
/// Chaining methods never fail; every error here surfaces when the
/// accumulated state is compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
   /// `build()` was called with no selected columns or expressions.
   #[error("query has no selected columns; call select() before build()")]
   MissingSelect,

   /// `build()` was called with no FROM table.
   #[error("query has no FROM table; call from() before build()")]
   MissingFrom,

   /// A predicate's `?` placeholder count disagrees with its bound
   /// parameter count.
   #[error(
      "predicate `{condition}` has {placeholders} placeholder(s) but {params} bound parameter(s)"
   )]
   BindingMismatch {
      condition: String,
      placeholders: usize,
      params: usize,
   },

   /// UNION branches nested past the compilation depth limit.
   #[error("UNION nesting exceeds the maximum depth of {max}")]
   UnionTooDeep { max: usize },
}
