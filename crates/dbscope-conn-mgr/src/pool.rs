//! Bounded connection pools over a driver-supplied connector.
//!
//! [`BoundedPool`] implements [`ConnectionPool`] for the suspending
//! execution model; [`BlockingBoundedPool`] implements
//! [`BlockingConnectionPool`] for the blocking one. Both cap live
//! connections at `max_connections`, reuse released connections from an
//! idle list, and fail an `acquire` that waits longer than
//! `acquire_timeout` with [`PoolError::Exhausted`].
//!
//! Fairness: the async pool queues waiters on a `tokio` semaphore, which
//! wakes them in FIFO order. The blocking pool wakes one waiter per
//! release and lets the mutex arbitrate; its fairness is unspecified.
//!
//! Pools are explicitly constructed and explicitly closed by whoever owns
//! application startup and shutdown. There is no global instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::driver::{
   BlockingConnection, BlockingConnectionPool, BlockingConnector, Connection, ConnectionPool,
   Connector,
};
use crate::error::PoolError;

/// Bounded, reusable connection pool for the suspending execution model.
pub struct BoundedPool<C: Connector> {
   connector: C,
   permits: Arc<Semaphore>,
   idle: Mutex<Vec<Box<dyn Connection>>>,
   closed: AtomicBool,
   acquire_timeout: Duration,
}

impl<C: Connector> BoundedPool<C> {
   pub fn new(connector: C, config: PoolConfig) -> Self {
      Self {
         connector,
         permits: Arc::new(Semaphore::new(config.max_connections as usize)),
         idle: Mutex::new(Vec::with_capacity(config.max_connections as usize)),
         closed: AtomicBool::new(false),
         acquire_timeout: config.acquire_timeout,
      }
   }

   /// Shut the pool down: new acquires fail with [`PoolError::Closed`]
   /// and idle connections are physically closed. Connections currently
   /// in use are closed as they come back.
   pub async fn close(&self) {
      self.closed.store(true, Ordering::SeqCst);
      self.permits.close();

      let mut idle = self.idle.lock().await;
      debug!(count = idle.len(), "closing idle pooled connections");
      for mut conn in idle.drain(..) {
         if let Err(cause) = conn.close().await {
            warn!(error = %cause, "closing a pooled connection failed");
         }
      }
   }
}

#[async_trait]
impl<C: Connector> ConnectionPool for BoundedPool<C> {
   async fn acquire(&self) -> Result<Box<dyn Connection>, PoolError> {
      let started = Instant::now();
      let permit = match timeout(self.acquire_timeout, self.permits.clone().acquire_owned()).await
      {
         Err(_) => {
            return Err(PoolError::Exhausted {
               waited: started.elapsed(),
            });
         }
         Ok(Err(_)) => return Err(PoolError::Closed),
         Ok(Ok(permit)) => permit,
      };

      let reused = self.idle.lock().await.pop();
      let conn = match reused {
         Some(conn) => {
            debug!("reusing idle connection");
            conn
         }
         // Permit held, so live connections stay within max_connections
         // even while the new connection is being opened.
         None => match self.connector.connect().await {
            Ok(conn) => conn,
            // Dropping the permit puts the slot back.
            Err(cause) => return Err(PoolError::Connect(cause)),
         },
      };

      // The slot travels with the connection until release().
      permit.forget();
      Ok(conn)
   }

   async fn release(&self, mut conn: Box<dyn Connection>) {
      if self.closed.load(Ordering::SeqCst) {
         if let Err(cause) = conn.close().await {
            warn!(error = %cause, "closing a released connection failed");
         }
         return;
      }

      self.idle.lock().await.push(conn);
      self.permits.add_permits(1);
   }
}

struct BlockingPoolState {
   idle: Vec<Box<dyn BlockingConnection>>,
   in_use: u32,
   closed: bool,
}

/// Bounded, reusable connection pool for the blocking execution model.
pub struct BlockingBoundedPool<C: BlockingConnector> {
   connector: C,
   state: StdMutex<BlockingPoolState>,
   released: Condvar,
   config: PoolConfig,
}

impl<C: BlockingConnector> BlockingBoundedPool<C> {
   pub fn new(connector: C, config: PoolConfig) -> Self {
      Self {
         connector,
         state: StdMutex::new(BlockingPoolState {
            idle: Vec::with_capacity(config.max_connections as usize),
            in_use: 0,
            closed: false,
         }),
         released: Condvar::new(),
         config,
      }
   }

   fn lock_state(&self) -> MutexGuard<'_, BlockingPoolState> {
      // A poisoned pool lock only means another thread panicked while
      // holding it; the counters are still consistent.
      self.state.lock().unwrap_or_else(PoisonError::into_inner)
   }

   /// Shut the pool down; see [`BoundedPool::close`].
   pub fn close(&self) {
      let mut state = self.lock_state();
      state.closed = true;
      let idle = std::mem::take(&mut state.idle);
      drop(state);

      debug!(count = idle.len(), "closing idle pooled connections");
      for mut conn in idle {
         if let Err(cause) = conn.close() {
            warn!(error = %cause, "closing a pooled connection failed");
         }
      }
      self.released.notify_all();
   }
}

impl<C: BlockingConnector> BlockingConnectionPool for BlockingBoundedPool<C> {
   fn acquire(&self) -> Result<Box<dyn BlockingConnection>, PoolError> {
      let started = Instant::now();
      let deadline = started + self.config.acquire_timeout;
      let mut state = self.lock_state();

      loop {
         if state.closed {
            return Err(PoolError::Closed);
         }

         if let Some(conn) = state.idle.pop() {
            state.in_use += 1;
            debug!("reusing idle connection");
            return Ok(conn);
         }

         if state.in_use < self.config.max_connections {
            // Reserve the slot before dropping the lock so concurrent
            // acquires cannot overshoot the maximum.
            state.in_use += 1;
            drop(state);
            return match self.connector.connect() {
               Ok(conn) => Ok(conn),
               Err(cause) => {
                  let mut state = self.lock_state();
                  state.in_use -= 1;
                  drop(state);
                  self.released.notify_one();
                  Err(PoolError::Connect(cause))
               }
            };
         }

         let now = Instant::now();
         if now >= deadline {
            return Err(PoolError::Exhausted {
               waited: started.elapsed(),
            });
         }
         let (guard, _timed_out) = self
            .released
            .wait_timeout(state, deadline - now)
            .unwrap_or_else(PoisonError::into_inner);
         state = guard;
      }
   }

   fn release(&self, mut conn: Box<dyn BlockingConnection>) {
      let mut state = self.lock_state();
      state.in_use = state.in_use.saturating_sub(1);

      if state.closed {
         drop(state);
         if let Err(cause) = conn.close() {
            warn!(error = %cause, "closing a released connection failed");
         }
         return;
      }

      state.idle.push(conn);
      drop(state);
      self.released.notify_one();
   }
}
