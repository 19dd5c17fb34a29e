//! Connection pool configuration.
//!
//! This module provides the `PoolConfig` struct for sizing and recycling the
//! shared connection pool.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the total number of pooled connections.
pub const MAX_TOTAL_CONNECTIONS: u32 = 100;

/// Configuration for the shared connection pool.
///
/// # Security
/// This struct intentionally does NOT store the connection string or any
/// credential.
///
/// # Example
/// ```rust
/// use schemagate_core::adapters::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_pool_size(4)
///     .with_max_overflow(4)
///     .with_connect_timeout(Duration::from_secs(3));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_connections(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Connections kept open while idle
    pub pool_size: u32,
    /// Extra connections allowed under load
    pub max_overflow: u32,
    /// Maximum connection lifetime before it is recycled
    pub recycle: Duration,
    /// How long acquisition may block before failing
    pub connect_timeout: Duration,
    /// Idle connections beyond `pool_size` are closed after this long
    pub idle_timeout: Duration,
    /// Probe connection liveness before each checkout
    pub pre_ping: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            max_overflow: 10,
            recycle: Duration::from_secs(1800),
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            pre_ping: true,
        }
    }
}

impl PoolConfig {
    /// Creates a pool config with the default sizing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total connections the pool may hold.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    /// Validates pool parameters.
    ///
    /// # Errors
    /// Returns error if sizes or timeouts are zero or the total exceeds
    /// [`MAX_TOTAL_CONNECTIONS`].
    pub fn validate(&self) -> crate::Result<()> {
        if self.pool_size == 0 {
            return Err(crate::error::GatewayError::configuration(
                "pool_size must be greater than 0",
            ));
        }

        if self.max_connections() > MAX_TOTAL_CONNECTIONS {
            return Err(crate::error::GatewayError::configuration(format!(
                "pool_size + max_overflow should not exceed {} for safety",
                MAX_TOTAL_CONNECTIONS
            )));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::GatewayError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.recycle.is_zero() {
            return Err(crate::error::GatewayError::configuration(
                "recycle must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set the pool size.
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Builder method to set the overflow allowance.
    pub fn with_max_overflow(mut self, max_overflow: u32) -> Self {
        self.max_overflow = max_overflow;
        self
    }

    /// Builder method to set the recycle interval.
    pub fn with_recycle(mut self, recycle: Duration) -> Self {
        self.recycle = recycle;
        self
    }

    /// Builder method to set the acquisition timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
