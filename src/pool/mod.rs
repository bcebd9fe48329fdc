// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The connection pool (section 4.8): a base size of live connections plus
//! an overflow allowance, FIFO or LIFO checkout, and proactive reconnection
//! of workers that went unhealthy or sat idle too long.
//!
//! Unlike the driver lineage's pool, which hands a caller a guard it must
//! remember to drop in the right place and lets a zero-arity retry callback
//! re-run against whatever connection it's given, [`Pool::with_connection`]
//! passes the connection handle straight into the caller's closure (see
//! REDESIGN FLAGS) and [`PooledConnection`]'s `Drop` is the only release
//! path - there is no separate "forget to check in" failure mode.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::address::Address;
use crate::bolt::{Connection, TcpTransport, Transport};
use crate::config::{CheckoutStrategy, DriverConfig, PoolConfig};
use crate::error::{BoltError, Result};

struct Idle<T: Transport> {
    connection: Connection<T>,
    idle_since: Instant,
}

struct State<T: Transport> {
    idle: VecDeque<Idle<T>>,
    live: usize,
}

/// A fixed-capacity pool of Bolt connections to a single server.
pub struct Pool<T: Transport> {
    connector: Box<dyn Fn() -> Result<T> + Send + Sync>,
    driver_config: DriverConfig,
    pool_config: PoolConfig,
    address: Option<String>,
    state: Mutex<State<T>>,
    room_available: Condvar,
}

impl Pool<TcpTransport> {
    /// A pool that opens plain TCP connections to `address`.
    pub fn for_address(address: Address, driver_config: DriverConfig, pool_config: PoolConfig) -> Self {
        let connect_timeout = driver_config.connection_timeout;
        let label = address.to_string();
        let mut pool = Self::with_connector(
            move || TcpTransport::connect(&address, connect_timeout),
            driver_config,
            pool_config,
        );
        pool.address = Some(label);
        pool
    }
}

impl<T: Transport + Send + 'static> Pool<T> {
    /// A pool that opens connections via `connector`, e.g. an in-memory
    /// duplex transport in tests.
    pub fn with_connector<F>(connector: F, driver_config: DriverConfig, pool_config: PoolConfig) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            connector: Box::new(connector),
            driver_config,
            pool_config,
            address: None,
            state: Mutex::new(State {
                idle: VecDeque::new(),
                live: 0,
            }),
            room_available: Condvar::new(),
        }
    }

    fn capacity(&self) -> usize {
        self.pool_config.pool_size + self.pool_config.max_overflow
    }

    fn open_new(&self) -> Result<Connection<T>> {
        let transport = (self.connector)()?;
        let mut connection = Connection::handshake(
            transport,
            self.driver_config.connection_timeout,
            self.driver_config.query_timeout,
        )?;
        if let Some(address) = &self.address {
            connection.set_address(address.clone());
        }
        connection.hello(
            &self.driver_config.user_agent,
            &self.driver_config.bolt_agent,
            self.driver_config.auth.data(),
        )?;
        debug!("pool: opened new connection");
        Ok(connection)
    }

    /// Takes an idle connection, dropping and replacing any that are
    /// unhealthy or have sat idle past `idle_timeout` (section 4.8's
    /// liveness guarantee), or opens a brand new one if the pool has spare
    /// capacity. Blocks up to `checkout_timeout` if neither is available.
    pub fn checkout(&self) -> Result<PooledConnection<'_, T>> {
        let deadline = Instant::now() + self.pool_config.checkout_timeout;
        loop {
            let mut guard = self.state.lock();
            match self.pop_idle(&mut guard) {
                Some(idle) => {
                    drop(guard);
                    if idle.idle_since.elapsed() > self.pool_config.idle_timeout {
                        debug!("pool: idle connection past idle_timeout, reconnecting");
                        let mut idle = idle;
                        idle.connection.goodbye();
                        match self.open_new() {
                            Ok(connection) => return Ok(PooledConnection::new(self, connection)),
                            Err(err) => {
                                self.release_slot();
                                return Err(err);
                            }
                        }
                    }
                    return Ok(PooledConnection::new(self, idle.connection));
                }
                None => {
                    if guard.live < self.capacity() {
                        guard.live += 1;
                        break;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(BoltError::pool_exhausted(
                            "timed out waiting for a connection to become available",
                        ));
                    }
                    let timed_out = self
                        .room_available
                        .wait_until(&mut guard, deadline)
                        .timed_out();
                    if timed_out {
                        return Err(BoltError::pool_exhausted(
                            "timed out waiting for a connection to become available",
                        ));
                    }
                }
            }
        }

        match self.open_new() {
            Ok(connection) => Ok(PooledConnection::new(self, connection)),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    fn pop_idle(&self, guard: &mut State<T>) -> Option<Idle<T>> {
        match self.pool_config.strategy {
            CheckoutStrategy::Fifo => guard.idle.pop_front(),
            CheckoutStrategy::Lifo => guard.idle.pop_back(),
        }
    }

    fn release_slot(&self) {
        let mut guard = self.state.lock();
        guard.live = guard.live.saturating_sub(1);
        self.room_available.notify_one();
    }

    /// Returns `connection` to the idle set if it is still usable,
    /// attempting a RESET first if it had failed a query; otherwise the
    /// connection is dropped and the slot released for a future checkout to
    /// reopen (section 4.8: "a worker whose connection reports a failed
    /// query is marked unhealthy and reconnected before being made
    /// available again").
    fn checkin(&self, mut connection: Connection<T>) {
        if !connection.is_usable() {
            if connection.reset().is_err() {
                warn!("pool: dropping connection that failed to reset");
                connection.goodbye();
                self.release_slot();
                return;
            }
        }
        let mut guard = self.state.lock();
        guard.idle.push_back(Idle {
            connection,
            idle_since: Instant::now(),
        });
        drop(guard);
        self.room_available.notify_one();
    }

    /// Checks a connection out, runs `f` against it, and checks it back in
    /// regardless of whether `f` succeeded (REDESIGN FLAGS: the pool passes
    /// the connection handle explicitly rather than expecting a zero-arity
    /// retry callback).
    pub fn with_connection<R>(&self, f: impl FnOnce(&mut Connection<T>) -> Result<R>) -> Result<R> {
        let mut pooled = self.checkout()?;
        f(&mut pooled)
    }

    /// Number of connections currently checked out or idle in the pool.
    pub fn live_count(&self) -> usize {
        self.state.lock().live
    }

    pub(crate) fn driver_config(&self) -> &DriverConfig {
        &self.driver_config
    }

    /// Opens a [`crate::session::Session`] borrowing one connection from
    /// this pool for its lifetime (section 4.5).
    pub fn session(&self) -> Result<crate::session::Session<'_, T>> {
        crate::session::Session::new(self)
    }
}

/// A connection on loan from a [`Pool`]. Checked back in on drop.
pub struct PooledConnection<'p, T: Transport> {
    pool: &'p Pool<T>,
    connection: Option<Connection<T>>,
}

impl<'p, T: Transport> PooledConnection<'p, T> {
    fn new(pool: &'p Pool<T>, connection: Connection<T>) -> Self {
        Self {
            pool,
            connection: Some(connection),
        }
    }
}

impl<T: Transport> Deref for PooledConnection<'_, T> {
    type Target = Connection<T>;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref().expect("connection present until drop")
    }
}

impl<T: Transport> DerefMut for PooledConnection<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection.as_mut().expect("connection present until drop")
    }
}

impl<T: Transport> Drop for PooledConnection<'_, T> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.checkin(connection);
        } else {
            info!("pool: connection already taken at drop, nothing to check in");
        }
    }
}
