/// Result type alias for SQL generation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SQL fragment generation and count-query rewriting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Identifier (table, column, or key name) contains characters that are
   /// not safe to interpolate into SQL.
   ///
   /// Identifiers must match `[a-zA-Z_][a-zA-Z0-9_.]*` (letters, digits,
   /// underscores, and dots for qualified names like `table.column`).
   #[error("invalid SQL identifier '{name}': must match [a-zA-Z_][a-zA-Z0-9_.]*")]
   InvalidIdentifier { name: String },

   /// UPDATE statements with no fields to set are syntactically invalid.
   #[error("update requires at least one field to set")]
   EmptyUpdate,

   /// The count rewrite needs a top-level FROM clause to anchor on.
   #[error("statement has no top-level FROM clause to anchor the count rewrite")]
   MissingFrom,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn invalid_identifier_names_the_offender() {
      let err = Error::InvalidIdentifier {
         name: "id; DROP TABLE t".into(),
      };
      assert!(err.to_string().contains("id; DROP TABLE t"));
   }

   #[test]
   fn empty_update_message() {
      assert!(Error::EmptyUpdate.to_string().contains("at least one field"));
   }
}
