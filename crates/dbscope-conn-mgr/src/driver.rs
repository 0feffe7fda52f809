//! Driver capability traits.
//!
//! The engine boundary of the access layer is an abstract capability set,
//! not a wire protocol: a pool hands out connections, a connection opens
//! cursors and manages transactions, a cursor runs statements with
//! positionally bound values. Concrete drivers implement these traits;
//! nothing in this crate knows which database sits behind them.
//!
//! Each capability comes in two execution models with identical
//! semantics: the async traits suspend on I/O, the `Blocking*` traits
//! block the calling thread. A scope instance is driven by exactly one
//! task or thread at a time; the pool is the only implementation that
//! must tolerate concurrent callers.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::PoolError;

/// Opaque failure from a concrete driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for driver-level operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A fetched row: column name to value, in projection order.
pub type Row = IndexMap<String, JsonValue>;

/// A statement handle bound to one connection.
#[async_trait]
pub trait Cursor: Send {
   /// Run a statement with positionally bound values.
   async fn execute(&mut self, statement: &str, values: &[JsonValue]) -> DriverResult<()>;

   /// Run a statement once per row of bound values.
   async fn execute_many(&mut self, statement: &str, rows: &[Vec<JsonValue>]) -> DriverResult<()>;

   /// Fetch the next row of the last result set, if any.
   async fn fetch_one(&mut self) -> DriverResult<Option<Row>>;

   /// Fetch all remaining rows of the last result set.
   async fn fetch_all(&mut self) -> DriverResult<Vec<Row>>;

   /// Row id generated by the last INSERT, when the driver reports one.
   fn last_insert_id(&self) -> Option<i64>;

   /// Rows affected by the last statement.
   fn row_count(&self) -> u64;

   async fn close(&mut self) -> DriverResult<()>;
}

/// A live database connection.
#[async_trait]
pub trait Connection: Send {
   async fn open_cursor(&mut self) -> DriverResult<Box<dyn Cursor>>;

   /// Start an explicit transaction.
   async fn begin(&mut self) -> DriverResult<()>;

   async fn commit(&mut self) -> DriverResult<()>;

   async fn rollback(&mut self) -> DriverResult<()>;

   /// Physically close the connection.
   async fn close(&mut self) -> DriverResult<()>;
}

/// A bounded provider of reusable connections.
///
/// Must support concurrent `acquire`/`release` from multiple tasks up to
/// its configured maximum; callers beyond the maximum suspend until a
/// release occurs.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
   /// Obtain a connection, suspending until one is available or the
   /// pool's own policy gives up with [`PoolError::Exhausted`].
   async fn acquire(&self) -> Result<Box<dyn Connection>, PoolError>;

   /// Return a connection for reuse.
   async fn release(&self, conn: Box<dyn Connection>);
}

/// Factory for new physical connections, used by [`crate::BoundedPool`].
#[async_trait]
pub trait Connector: Send + Sync {
   async fn connect(&self) -> DriverResult<Box<dyn Connection>>;
}

/// Blocking counterpart of [`Cursor`].
pub trait BlockingCursor: Send {
   fn execute(&mut self, statement: &str, values: &[JsonValue]) -> DriverResult<()>;

   fn execute_many(&mut self, statement: &str, rows: &[Vec<JsonValue>]) -> DriverResult<()>;

   fn fetch_one(&mut self) -> DriverResult<Option<Row>>;

   fn fetch_all(&mut self) -> DriverResult<Vec<Row>>;

   fn last_insert_id(&self) -> Option<i64>;

   fn row_count(&self) -> u64;

   fn close(&mut self) -> DriverResult<()>;
}

/// Blocking counterpart of [`Connection`].
pub trait BlockingConnection: Send {
   fn open_cursor(&mut self) -> DriverResult<Box<dyn BlockingCursor>>;

   fn begin(&mut self) -> DriverResult<()>;

   fn commit(&mut self) -> DriverResult<()>;

   fn rollback(&mut self) -> DriverResult<()>;

   fn close(&mut self) -> DriverResult<()>;
}

/// Blocking counterpart of [`ConnectionPool`]; `acquire` blocks the
/// calling thread instead of suspending the task.
pub trait BlockingConnectionPool: Send + Sync {
   fn acquire(&self) -> Result<Box<dyn BlockingConnection>, PoolError>;

   fn release(&self, conn: Box<dyn BlockingConnection>);
}

/// Blocking counterpart of [`Connector`].
pub trait BlockingConnector: Send + Sync {
   fn connect(&self) -> DriverResult<Box<dyn BlockingConnection>>;
}
