//! Error types for connection lifecycle management.

use std::time::Duration;

use crate::driver::DriverError;

/// Result type alias for scope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle phase in which an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
   Acquire,
   Begin,
   Execute,
   Commit,
   Close,
}

/// Errors surfaced by [`crate::ConnectionScope`] and its blocking twin.
///
/// There is no retry logic anywhere in this crate: every failure surfaces
/// to the caller after cleanup has run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// The pool could not supply a connection within its own policy.
   /// The scope remains idle; there is nothing to clean up.
   #[error("connection pool exhausted after waiting {waited:?}")]
   PoolExhausted { waited: Duration },

   /// Acquiring a connection or opening its cursor failed.
   #[error("failed to acquire a connection")]
   ConnectionFailed(#[source] DriverError),

   /// The pool has been shut down.
   #[error("connection pool is closed")]
   PoolClosed,

   /// Starting an explicit transaction failed. No statement ran; the
   /// scope stays open.
   #[error("failed to begin a transaction")]
   BeginFailed(#[source] DriverError),

   /// A statement failed. The scope has been rolled back and closed; it
   /// is not reusable without a fresh `acquire()`.
   #[error("statement execution failed (scope rolled back and closed)")]
   QueryFailed(#[source] DriverError),

   /// Commit failed. The transaction was rolled back but the scope is
   /// left open, so the caller may retry or must close explicitly.
   #[error("commit failed (rolled back, scope left open)")]
   CommitFailed(#[source] DriverError),

   /// The session-cleanup statement or cursor close failed during
   /// `close()`. Internal state has still been reset and the connection
   /// returned to the pool.
   #[error("session cleanup failed during close")]
   CleanupFailed(#[source] DriverError),

   /// An operation that needs a live connection ran on an idle scope.
   /// Carries the phase of the attempted operation so `phase()` reports
   /// the step the caller was actually in.
   #[error("operation requires an acquired scope; call acquire() first")]
   NotAcquired { phase: Phase },
}

impl Error {
   /// The lifecycle phase this error belongs to.
   pub fn phase(&self) -> Phase {
      match self {
         Error::PoolExhausted { .. } | Error::ConnectionFailed(_) | Error::PoolClosed => {
            Phase::Acquire
         }
         Error::BeginFailed(_) => Phase::Begin,
         Error::QueryFailed(_) => Phase::Execute,
         Error::NotAcquired { phase } => *phase,
         Error::CommitFailed(_) => Phase::Commit,
         Error::CleanupFailed(_) => Phase::Close,
      }
   }

   pub(crate) fn from_pool(err: PoolError) -> Self {
      match err {
         PoolError::Exhausted { waited } => Error::PoolExhausted { waited },
         PoolError::Connect(cause) => Error::ConnectionFailed(cause),
         PoolError::Closed => Error::PoolClosed,
      }
   }
}

/// Errors from a [`crate::ConnectionPool`] provider.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
   /// No connection became available before the acquire deadline.
   #[error("no connection became available within {waited:?}")]
   Exhausted { waited: Duration },

   /// Opening a new physical connection failed.
   #[error("failed to open a new connection")]
   Connect(#[source] DriverError),

   /// The pool has been shut down.
   #[error("pool is closed")]
   Closed,
}

#[cfg(test)]
mod tests {
   use super::*;

   fn cause() -> DriverError {
      Box::new(std::io::Error::other("driver said no"))
   }

   #[test]
   fn phases_map_to_lifecycle_steps() {
      let waited = Duration::from_secs(1);
      assert_eq!(Error::PoolExhausted { waited }.phase(), Phase::Acquire);
      assert_eq!(Error::ConnectionFailed(cause()).phase(), Phase::Acquire);
      assert_eq!(Error::BeginFailed(cause()).phase(), Phase::Begin);
      assert_eq!(Error::QueryFailed(cause()).phase(), Phase::Execute);
      assert_eq!(Error::CommitFailed(cause()).phase(), Phase::Commit);
      assert_eq!(Error::CleanupFailed(cause()).phase(), Phase::Close);
   }

   #[test]
   fn not_acquired_reports_the_attempted_phase() {
      assert_eq!(Error::NotAcquired { phase: Phase::Begin }.phase(), Phase::Begin);
      assert_eq!(Error::NotAcquired { phase: Phase::Execute }.phase(), Phase::Execute);
      assert_eq!(Error::NotAcquired { phase: Phase::Commit }.phase(), Phase::Commit);
   }

   #[test]
   fn underlying_cause_is_preserved() {
      use std::error::Error as _;

      let err = Error::QueryFailed(cause());
      let source = err.source().expect("cause should be attached");
      assert!(source.to_string().contains("driver said no"));
   }

   #[test]
   fn pool_errors_convert_to_scope_errors() {
      let waited = Duration::from_millis(250);
      assert!(matches!(
         Error::from_pool(PoolError::Exhausted { waited }),
         Error::PoolExhausted { .. }
      ));
      assert!(matches!(
         Error::from_pool(PoolError::Connect(cause())),
         Error::ConnectionFailed(_)
      ));
      assert!(matches!(Error::from_pool(PoolError::Closed), Error::PoolClosed));
   }
}
