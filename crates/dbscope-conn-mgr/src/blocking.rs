//! Request-scoped connection handle for the blocking execution model.
//!
//! [`BlockingConnectionScope`] is the same state machine as
//! [`crate::ConnectionScope`] — lazy acquire, fail-fast execute,
//! commit/rollback asymmetry, finally-semantics close — with every
//! suspension point replaced by a blocking call. See the module docs on
//! [`crate::scope`] for the lifecycle and failure contract; they apply
//! verbatim here.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::ScopeConfig;
use crate::driver::{
   BlockingConnection, BlockingConnectionPool, BlockingCursor, DriverError, Row,
};
use crate::error::{Error, Phase, Result};

/// Blocking twin of [`crate::ConnectionScope`].
pub struct BlockingConnectionScope {
   pool: Arc<dyn BlockingConnectionPool>,
   config: ScopeConfig,
   conn: Option<Box<dyn BlockingConnection>>,
   cursor: Option<Box<dyn BlockingCursor>>,
}

impl BlockingConnectionScope {
   /// Create an idle scope. No connection is taken until the first
   /// [`acquire`](Self::acquire).
   pub fn new(pool: Arc<dyn BlockingConnectionPool>, config: ScopeConfig) -> Self {
      Self {
         pool,
         config,
         conn: None,
         cursor: None,
      }
   }

   /// Whether the scope currently holds a connection and cursor.
   pub fn is_acquired(&self) -> bool {
      self.cursor.is_some()
   }

   /// Lazily obtain a connection and open a cursor; idempotent. May
   /// block the calling thread until the pool has capacity.
   pub fn acquire(&mut self) -> Result<()> {
      if self.cursor.is_some() {
         return Ok(());
      }

      let mut conn = match self.conn.take() {
         Some(conn) => conn,
         None => self.pool.acquire().map_err(Error::from_pool)?,
      };

      match conn.open_cursor() {
         Ok(cursor) => {
            self.conn = Some(conn);
            self.cursor = Some(cursor);
            Ok(())
         }
         Err(cause) => {
            self.pool.release(conn);
            Err(Error::ConnectionFailed(cause))
         }
      }
   }

   /// Start an explicit transaction; [`Error::NotAcquired`] on an idle
   /// scope.
   pub fn begin(&mut self) -> Result<()> {
      let Some(conn) = self.conn.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Begin });
      };
      conn.begin().map_err(Error::BeginFailed)
   }

   /// Run a statement with positionally bound values.
   pub fn execute(&mut self, statement: &str, values: &[JsonValue]) -> Result<()> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      match cursor.execute(statement, values) {
         Ok(()) => Ok(()),
         Err(cause) => Err(self.fail_statement(cause)),
      }
   }

   /// Run a statement once per row of bound values.
   pub fn execute_many(&mut self, statement: &str, rows: &[Vec<JsonValue>]) -> Result<()> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      match cursor.execute_many(statement, rows) {
         Ok(()) => Ok(()),
         Err(cause) => Err(self.fail_statement(cause)),
      }
   }

   fn fail_statement(&mut self, cause: DriverError) -> Error {
      self.rollback();
      if let Err(close_err) = self.close() {
         warn!(error = %close_err, "close failed while unwinding a failed statement");
      }
      Error::QueryFailed(cause)
   }

   /// Fetch the next row of the last result set.
   pub fn fetch_one(&mut self) -> Result<Option<Row>> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      cursor.fetch_one().map_err(Error::QueryFailed)
   }

   /// Fetch all remaining rows of the last result set.
   pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      cursor.fetch_all().map_err(Error::QueryFailed)
   }

   /// Row id generated by the last INSERT, when the driver reports one.
   pub fn last_insert_id(&self) -> Result<Option<i64>> {
      let Some(cursor) = self.cursor.as_ref() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      Ok(cursor.last_insert_id())
   }

   /// Rows affected by the last statement.
   pub fn row_count(&self) -> Result<u64> {
      let Some(cursor) = self.cursor.as_ref() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      Ok(cursor.row_count())
   }

   /// Commit the open transaction; on failure rolls back and leaves the
   /// scope open.
   pub fn commit(&mut self) -> Result<()> {
      let Some(conn) = self.conn.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Commit });
      };
      match conn.commit() {
         Ok(()) => Ok(()),
         Err(cause) => {
            self.rollback();
            Err(Error::CommitFailed(cause))
         }
      }
   }

   /// Roll back the open transaction, if any; never fails.
   pub fn rollback(&mut self) {
      let Some(conn) = self.conn.as_mut() else {
         return;
      };
      if let Err(cause) = conn.rollback() {
         warn!(error = %cause, "rollback failed; continuing cleanup");
      }
   }

   /// Unconditionally release the scope's resources; see
   /// [`crate::ConnectionScope::close`].
   pub fn close(&mut self) -> Result<()> {
      let conn = self.conn.take();
      let cursor = self.cursor.take();
      let mut cleanup_failure: Option<DriverError> = None;

      if let Some(mut cursor) = cursor {
         if let Some(statement) = self.config.cleanup_statement.as_deref() {
            debug!(statement, "running session cleanup");
            if let Err(cause) = cursor.execute(statement, &[]) {
               cleanup_failure = Some(cause);
            }
         }
         if let Err(cause) = cursor.close() {
            cleanup_failure.get_or_insert(cause);
         }
      }

      if let Some(conn) = conn {
         self.pool.release(conn);
      }

      match cleanup_failure {
         Some(cause) => Err(Error::CleanupFailed(cause)),
         None => Ok(()),
      }
   }
}

impl Drop for BlockingConnectionScope {
   fn drop(&mut self) {
      if self.conn.is_some() {
         // Scoped-acquisition discipline: a scope dropped mid-request
         // still returns its connection to the pool.
         if let Err(cause) = self.close() {
            warn!(error = %cause, "cleanup failed while dropping a live scope");
         }
      }
   }
}
