//! # dbscope-conn-mgr
//!
//! Connection lifecycle management for the dbscope access layer:
//! driver-agnostic capability traits, bounded connection pools, and
//! request-scoped connection handles with a strict cleanup contract.
//!
//! ## Core Types
//!
//! - **[`ConnectionScope`]** / **[`BlockingConnectionScope`]**: request-bound
//!   handles owning at most one connection+cursor pair
//! - **[`BoundedPool`]** / **[`BlockingBoundedPool`]**: bounded, reusable
//!   pools over a driver-supplied [`Connector`]
//! - **[`Connection`]**, **[`Cursor`]**, **[`ConnectionPool`]** (and their
//!   `Blocking*` twins): the driver capability boundary
//! - **[`PoolConfig`]** / **[`ScopeConfig`]**: pool and scope settings
//! - **[`Error`]** / **[`PoolError`]**: error taxonomy with a
//!   [`Phase`] accessor identifying where a failure happened
//!
//! ## Lifecycle
//!
//! ```text
//! 1. Construct a pool at application startup (no global instance)
//! 2. Per request: ConnectionScope::new(pool, config)
//! 3. acquire() lazily takes a connection and opens a cursor
//! 4. execute()/execute_many(), then commit() — or let rollback happen
//! 5. close() always, exactly once per acquire; double close is a no-op
//! ```

mod blocking;
mod config;
mod driver;
mod error;
mod pool;
mod scope;

pub use blocking::BlockingConnectionScope;
pub use config::{PoolConfig, ScopeConfig};
pub use driver::{
   BlockingConnection, BlockingConnectionPool, BlockingConnector, BlockingCursor, Connection,
   ConnectionPool, Connector, Cursor, DriverError, DriverResult, Row,
};
pub use error::{Error, Phase, PoolError, Result};
pub use pool::{BlockingBoundedPool, BoundedPool};
pub use scope::ConnectionScope;
