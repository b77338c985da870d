//! Bounded connection pool.
//!
//! `reqwest` keeps idle connections alive but places no ceiling on how many
//! are open at once. The pool hands out permits, one per in-flight request,
//! capped globally and per route (`scheme://host:port`). A permit lives as
//! long as the response body that uses its connection.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::TransportError;

#[derive(Debug, Default)]
struct PoolState {
    leased: usize,
    per_route: HashMap<String, usize>,
    closed: bool,
}

/// Connection pool with a fixed total and per-route capacity.
#[derive(Debug)]
pub struct ConnectionPool {
    max_total: usize,
    max_per_route: usize,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl ConnectionPool {
    /// Creates a new pool. Both limits must be at least one.
    pub fn new(max_total: usize, max_per_route: usize) -> Arc<Self> {
        Arc::new(Self {
            max_total: max_total.max(1),
            max_per_route: max_per_route.max(1),
            state: Mutex::new(PoolState::default()),
            released: Condvar::new(),
        })
    }

    /// Maximum number of connections across all routes.
    pub fn max_total(&self) -> usize {
        self.max_total
    }

    /// Maximum number of connections to a single route.
    pub fn max_per_route(&self) -> usize {
        self.max_per_route
    }

    /// Number of permits currently leased.
    pub fn leased(&self) -> usize {
        self.lock().leased
    }

    /// Returns true once [`ConnectionPool::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Leases a permit for `route`, blocking until one is free.
    ///
    /// With `timeout` set, gives up with [`TransportError::PoolTimeout`] once
    /// it has elapsed.
    pub fn acquire(
        self: &Arc<Self>,
        route: &str,
        timeout: Option<Duration>,
    ) -> Result<PoolPermit, TransportError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        loop {
            if state.closed {
                return Err(TransportError::Closed);
            }

            let route_leased = state.per_route.get(route).copied().unwrap_or(0);
            if state.leased < self.max_total && route_leased < self.max_per_route {
                state.leased += 1;
                *state.per_route.entry(route.to_string()).or_insert(0) += 1;
                return Ok(PoolPermit {
                    pool: Arc::clone(self),
                    route: route.to_string(),
                });
            }

            tracing::debug!(route, leased = state.leased, "Waiting for a pooled connection");

            state = match deadline {
                None => self
                    .released
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TransportError::PoolTimeout {
                            timeout: timeout.unwrap_or_default(),
                        });
                    }
                    self.released
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Closes the pool. Waiters and later callers get [`TransportError::Closed`].
    ///
    /// Returns false if the pool was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let was_open = !state.closed;
        state.closed = true;
        drop(state);
        self.released.notify_all();
        was_open
    }

    fn release(&self, route: &str) {
        let mut state = self.lock();
        state.leased = state.leased.saturating_sub(1);
        if let Some(count) = state.per_route.get_mut(route) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.per_route.remove(route);
            }
        }
        drop(state);
        self.released.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A leased connection slot. Dropping it returns the slot to the pool.
#[derive(Debug)]
pub struct PoolPermit {
    pool: Arc<ConnectionPool>,
    route: String,
}

impl PoolPermit {
    /// The route this permit was leased for.
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.pool.release(&self.route);
    }
}
