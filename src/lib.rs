//! # dbscope
//!
//! A relational-database access layer: pooled connections behind abstract
//! driver traits, a request-scoped transactional handle with a strict
//! cleanup contract, and generic SQL generation for filters, updates, and
//! pagination.
//!
//! The layer has three pieces:
//!
//! - **Connection lifecycle**: [`ConnectionScope`] and
//!   [`BlockingConnectionScope`] own at most one connection+cursor pair,
//!   acquired lazily from a [`ConnectionPool`] and released exactly once,
//!   whatever fails in between. [`BoundedPool`] and
//!   [`BlockingBoundedPool`] are ready-made bounded pools over a driver's
//!   [`Connector`].
//! - **SQL generation**: [`where_exact`] / [`where_like`], [`update`],
//!   and [`limit`] build fragments with positionally aligned bound
//!   values; [`count_query`] derives the row-count query for an
//!   arbitrary filtered SELECT.
//! - **Paginated execution**: [`paginate`] / [`paginate_blocking`] run
//!   the derived count query through a scope and return [`PageInfo`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dbscope::{
//!    BoundedPool, ConnectionScope, PageRequest, PlaceholderStyle, PoolConfig, ScopeConfig,
//! };
//!
//! // The pool is built once at startup from a driver's Connector and
//! // passed in explicitly; there is no global instance.
//! let pool = Arc::new(BoundedPool::new(my_driver_connector, PoolConfig::default()));
//!
//! // Per request:
//! let mut scope = ConnectionScope::new(pool, ScopeConfig::with_cleanup("UNLOCK TABLES"));
//! scope.acquire().await?;
//!
//! let filter = dbscope::where_exact(&["status", "name"], &request_data, PlaceholderStyle::Question)?;
//! let base = format!("SELECT id, name FROM users{}", filter.sql);
//!
//! let page = PageRequest::new(1, 20);
//! let info = dbscope::paginate(&mut scope, &base, &filter.values, page, true).await?;
//!
//! let listing = format!("{base}{}", dbscope::limit(page));
//! scope.execute(&listing, &filter.values).await?;
//! let rows = scope.fetch_all().await?;
//!
//! scope.commit().await?;
//! scope.close().await?;
//! ```

mod error;
mod paginate;

pub use error::{Error, Result};
pub use paginate::{paginate, paginate_blocking};

pub use dbscope_conn_mgr::{
   BlockingBoundedPool, BlockingConnection, BlockingConnectionPool, BlockingConnectionScope,
   BlockingConnector, BlockingCursor, BoundedPool, Connection, ConnectionPool, ConnectionScope,
   Connector, Cursor, DriverError, DriverResult, Phase, PoolConfig, PoolError, Row, ScopeConfig,
};
pub use dbscope_sqlgen::{
   Fragment, PageInfo, PageRequest, PlaceholderStyle, count_query, limit, page_info,
   strip_trailing_clauses, update, validate_identifier, where_exact, where_like,
};
