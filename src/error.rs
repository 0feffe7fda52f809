/// Result type alias for dbscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the access-layer facade.
///
/// Lifecycle and generation errors pass through transparently; see
/// [`dbscope_conn_mgr::Error::phase`] for which lifecycle phase a scope
/// failure belongs to.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from the connection lifecycle.
   #[error(transparent)]
   Scope(#[from] dbscope_conn_mgr::Error),

   /// Error from SQL generation.
   #[error(transparent)]
   Sql(#[from] dbscope_sqlgen::Error),

   /// The count query's first row had no usable `total` column.
   #[error("count query returned no usable 'total' column")]
   MissingTotal,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn scope_errors_pass_through_transparently() {
      let err = Error::from(dbscope_conn_mgr::Error::NotAcquired {
         phase: dbscope_conn_mgr::Phase::Execute,
      });
      assert!(err.to_string().contains("acquire()"));
   }

   #[test]
   fn sql_errors_pass_through_transparently() {
      let err = Error::from(dbscope_sqlgen::Error::EmptyUpdate);
      assert!(err.to_string().contains("at least one field"));
   }
}
