//! Configuration for pools and connection scopes

use std::time::Duration;

/// Configuration for [`crate::BoundedPool`] and
/// [`crate::BlockingBoundedPool`].
///
/// # Examples
///
/// ```
/// use dbscope_conn_mgr::PoolConfig;
/// use std::time::Duration;
///
/// // Use defaults
/// let config = PoolConfig::default();
///
/// // Override just one field
/// let config = PoolConfig {
///    max_connections: 10,
///    ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
   /// Maximum number of live connections, idle and in use combined.
   ///
   /// Callers beyond this maximum wait (suspending or blocking) until a
   /// connection is released.
   ///
   /// Default: 5
   pub max_connections: u32,

   /// How long an `acquire` call may wait for a connection before
   /// failing with `PoolError::Exhausted`.
   ///
   /// Default: 30 seconds
   pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
   fn default() -> Self {
      Self {
         max_connections: 5,
         acquire_timeout: Duration::from_secs(30),
      }
   }
}

/// Configuration for [`crate::ConnectionScope`] and
/// [`crate::BlockingConnectionScope`].
#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
   /// Statement run on the open cursor before it closes, for drivers
   /// whose sessions hold server-side state that outlives the request
   /// (e.g. `UNLOCK TABLES` on MySQL releases explicit table locks).
   ///
   /// Default: none
   pub cleanup_statement: Option<String>,
}

impl ScopeConfig {
   /// Config with a session-cleanup statement.
   pub fn with_cleanup(statement: impl Into<String>) -> Self {
      Self {
         cleanup_statement: Some(statement.into()),
      }
   }
}
