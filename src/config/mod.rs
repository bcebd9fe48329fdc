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

//! Driver-wide and pool-wide configuration (section 6).

pub mod auth;

use std::time::Duration;

pub use auth::AuthToken;

const DEFAULT_USER_AGENT: &str = concat!("bolt-driver-rs/", env!("CARGO_PKG_VERSION"));
const DEFAULT_BOLT_AGENT: &str = concat!("bolt-driver-rs/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(15_000);
pub(crate) const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(30_000);
pub(crate) const DEFAULT_POOL_SIZE: usize = 10;
pub(crate) const DEFAULT_MAX_OVERFLOW: usize = 5;
pub(crate) const DEFAULT_BATCH_SIZE: i64 = 1000;
pub(crate) const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_millis(60_000);
pub(crate) const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// The order in which idle connections are handed out on checkout (section
/// 4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutStrategy {
    /// Hand out the connection that has been idle the longest.
    #[default]
    Fifo,
    /// Hand out the most recently returned connection.
    Lifo,
}

/// Driver-wide configuration: authentication, identification, and timeouts
/// that apply to every connection the driver ever opens.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub(crate) auth: AuthToken,
    pub(crate) user_agent: String,
    pub(crate) bolt_agent: String,
    pub(crate) connection_timeout: Duration,
    pub(crate) query_timeout: Duration,
    pub(crate) batch_size: i64,
}

impl DriverConfig {
    pub fn new(auth: AuthToken) -> Self {
        Self {
            auth,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bolt_agent: DEFAULT_BOLT_AGENT.to_string(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// How many records a [`crate::record_stream::RecordStream`] requests
    /// per PULL when none is given explicitly.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Connection pool configuration (section 4.8): base size, overflow,
/// checkout strategy, checkout timeout, and idle-connection liveness.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub(crate) pool_size: usize,
    pub(crate) max_overflow: usize,
    pub(crate) checkout_timeout: Duration,
    pub(crate) strategy: CheckoutStrategy,
    pub(crate) idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
            strategy: CheckoutStrategy::Fifo,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_max_overflow(mut self, max_overflow: usize) -> Self {
        self.max_overflow = max_overflow;
        self
    }

    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: CheckoutStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_config_defaults() {
        let config = DriverConfig::new(AuthToken::new_none_auth());
        assert_eq!(config.connection_timeout, DEFAULT_CONNECTION_TIMEOUT);
        assert_eq!(config.query_timeout, DEFAULT_QUERY_TIMEOUT);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn driver_config_batch_size_override() {
        let config = DriverConfig::new(AuthToken::new_none_auth()).with_batch_size(50);
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn pool_config_defaults_match_section_6() {
        let config = PoolConfig::default();
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.max_overflow, 5);
        assert_eq!(config.strategy, CheckoutStrategy::Fifo);
    }

    #[test]
    fn pool_config_builder_overrides_defaults() {
        let config = PoolConfig::new()
            .with_pool_size(2)
            .with_max_overflow(1)
            .with_strategy(CheckoutStrategy::Lifo);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.max_overflow, 1);
        assert_eq!(config.strategy, CheckoutStrategy::Lifo);
    }
}
