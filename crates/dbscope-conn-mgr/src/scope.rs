//! Request-scoped connection handle for the suspending execution model.
//!
//! A [`ConnectionScope`] owns at most one connection and at most one
//! cursor, acquired lazily from a pool and guaranteed to be released
//! exactly once. The lifecycle runs
//! `Idle → Acquired → (executing)* → {committed | rolled back} → Closed`;
//! `close()` is safe from every state, including `Idle` and mid-failure.
//!
//! Failure contract:
//!
//! - A failed statement invalidates the whole scope, not just one call:
//!   the scope rolls back, closes, and surfaces
//!   [`Error::QueryFailed`](crate::Error::QueryFailed). The caller must
//!   re-`acquire()` before using the scope again.
//! - A failed commit rolls back but leaves the scope open, so the caller
//!   may retry or close explicitly. The asymmetry with execute is
//!   deliberate.
//! - Rollback never surfaces its own failures; they are logged so they
//!   cannot mask the error that triggered the cleanup.
//!
//! A scope is exclusively owned by one request or task; none of its
//! operations may be called concurrently on the same instance. Rust's
//! `&mut self` receivers enforce that single-writer discipline at compile
//! time.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::ScopeConfig;
use crate::driver::{Connection, ConnectionPool, Cursor, DriverError, Row};
use crate::error::{Error, Phase, Result};

/// Request-scoped handle owning at most one connection and cursor.
pub struct ConnectionScope {
   pool: Arc<dyn ConnectionPool>,
   config: ScopeConfig,
   conn: Option<Box<dyn Connection>>,
   cursor: Option<Box<dyn Cursor>>,
}

impl ConnectionScope {
   /// Create an idle scope. No connection is taken until the first
   /// [`acquire`](Self::acquire).
   pub fn new(pool: Arc<dyn ConnectionPool>, config: ScopeConfig) -> Self {
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

   /// Lazily obtain a connection from the pool and open a cursor on it.
   ///
   /// Idempotent: calling on an already-acquired scope is a no-op. If the
   /// pool cannot supply a connection the scope stays idle; if opening
   /// the cursor fails the untouched connection goes straight back to the
   /// pool.
   pub async fn acquire(&mut self) -> Result<()> {
      if self.cursor.is_some() {
         return Ok(());
      }

      let mut conn = match self.conn.take() {
         Some(conn) => conn,
         None => self.pool.acquire().await.map_err(Error::from_pool)?,
      };

      match conn.open_cursor().await {
         Ok(cursor) => {
            self.conn = Some(conn);
            self.cursor = Some(cursor);
            Ok(())
         }
         Err(cause) => {
            self.pool.release(conn).await;
            Err(Error::ConnectionFailed(cause))
         }
      }
   }

   /// Start an explicit transaction on the underlying connection.
   ///
   /// Calling before [`acquire`](Self::acquire) is a caller error and is
   /// surfaced as [`Error::NotAcquired`] rather than silently ignored.
   pub async fn begin(&mut self) -> Result<()> {
      let Some(conn) = self.conn.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Begin });
      };
      conn.begin().await.map_err(Error::BeginFailed)
   }

   /// Run a statement with positionally bound values.
   pub async fn execute(&mut self, statement: &str, values: &[JsonValue]) -> Result<()> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      match cursor.execute(statement, values).await {
         Ok(()) => Ok(()),
         Err(cause) => Err(self.fail_statement(cause).await),
      }
   }

   /// Run a statement once per row of bound values.
   pub async fn execute_many(
      &mut self,
      statement: &str,
      rows: &[Vec<JsonValue>],
   ) -> Result<()> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      match cursor.execute_many(statement, rows).await {
         Ok(()) => Ok(()),
         Err(cause) => Err(self.fail_statement(cause).await),
      }
   }

   /// Rollback, close, and wrap the cause. A statement failure
   /// invalidates the whole scope.
   async fn fail_statement(&mut self, cause: DriverError) -> Error {
      self.rollback().await;
      if let Err(close_err) = self.close().await {
         warn!(error = %close_err, "close failed while unwinding a failed statement");
      }
      Error::QueryFailed(cause)
   }

   /// Fetch the next row of the last result set.
   pub async fn fetch_one(&mut self) -> Result<Option<Row>> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      cursor.fetch_one().await.map_err(Error::QueryFailed)
   }

   /// Fetch all remaining rows of the last result set.
   pub async fn fetch_all(&mut self) -> Result<Vec<Row>> {
      let Some(cursor) = self.cursor.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Execute });
      };
      cursor.fetch_all().await.map_err(Error::QueryFailed)
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

   /// Commit the open transaction.
   ///
   /// On failure the transaction is rolled back but the scope stays
   /// open — the connection is assumed still usable and a later
   /// [`close`](Self::close) still runs session cleanup.
   pub async fn commit(&mut self) -> Result<()> {
      let Some(conn) = self.conn.as_mut() else {
         return Err(Error::NotAcquired { phase: Phase::Commit });
      };
      match conn.commit().await {
         Ok(()) => Ok(()),
         Err(cause) => {
            self.rollback().await;
            Err(Error::CommitFailed(cause))
         }
      }
   }

   /// Roll back the open transaction, if any.
   ///
   /// Never fails: with no connection this is a no-op, and a driver
   /// rollback failure is logged rather than returned so cleanup paths
   /// cannot mask the error that led here.
   pub async fn rollback(&mut self) {
      let Some(conn) = self.conn.as_mut() else {
         return;
      };
      if let Err(cause) = conn.rollback().await {
         warn!(error = %cause, "rollback failed; continuing cleanup");
      }
   }

   /// Unconditionally release the scope's resources.
   ///
   /// Runs the configured session-cleanup statement on the open cursor
   /// (if any), closes the cursor, and returns the connection to the
   /// pool. Internal state is reset on every path, so a second `close()`
   /// is always a safe no-op; a cleanup failure is still surfaced as
   /// [`Error::CleanupFailed`] after the reset.
   pub async fn close(&mut self) -> Result<()> {
      // Taking both up front is the finally-semantics: whatever happens
      // below, the scope ends up empty.
      let conn = self.conn.take();
      let cursor = self.cursor.take();
      let mut cleanup_failure: Option<DriverError> = None;

      if let Some(mut cursor) = cursor {
         if let Some(statement) = self.config.cleanup_statement.as_deref() {
            debug!(statement, "running session cleanup");
            if let Err(cause) = cursor.execute(statement, &[]).await {
               cleanup_failure = Some(cause);
            }
         }
         if let Err(cause) = cursor.close().await {
            // Keep the first failure; it is the more interesting one.
            cleanup_failure.get_or_insert(cause);
         }
      }

      if let Some(conn) = conn {
         self.pool.release(conn).await;
      }

      match cleanup_failure {
         Some(cause) => Err(Error::CleanupFailed(cause)),
         None => Ok(()),
      }
   }
}

impl Drop for ConnectionScope {
   fn drop(&mut self) {
      let Some(conn) = self.conn.take() else {
         return;
      };
      self.cursor = None;

      // A dropped scope (task cancellation included) must not leak its
      // pool slot. Releasing needs an await, so hand the connection back
      // on the runtime when one is still running.
      match tokio::runtime::Handle::try_current() {
         Ok(handle) => {
            warn!("scope dropped while holding a connection; returning it to the pool");
            let pool = Arc::clone(&self.pool);
            handle.spawn(async move {
               pool.release(conn).await;
            });
         }
         Err(_) => {
            warn!("scope dropped while holding a connection and no runtime is available; connection lost");
         }
      }
   }
}
