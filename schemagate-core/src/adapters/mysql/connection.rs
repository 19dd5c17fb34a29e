//! MySQL/MariaDB connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format before any connection attempt
//! - Every pooled session is switched to read-only transactions
//! - Connection strings are redacted in all error messages

use super::MySqlInspector;
use crate::Result;
use crate::adapters::config::{MAX_TOTAL_CONNECTIONS, PoolConfig};
use crate::error::{GatewayError, redact_database_url};
use sqlx::MySqlPool;
use std::time::Duration;
use url::Url;

impl MySqlInspector {
    /// Creates an inspector with a pool built from the connection URL.
    ///
    /// The pool connects lazily: no connection is opened until the first
    /// query, so construction never blocks on the network.
    ///
    /// # Errors
    /// Returns error if the connection string or pool configuration is invalid.
    pub fn connect(connection_string: &str, config: &PoolConfig) -> Result<Self> {
        let config = parse_pool_config(connection_string, config.clone())?;
        let pool = create_pool(connection_string, &config)?;
        Ok(Self::new(pool))
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Validates a MySQL/MariaDB connection string.
///
/// Accepts `mysql://` and `mariadb://`, optionally with a driver suffix
/// such as `mysql+pymysql://`, and requires a host.
///
/// # Errors
/// Returns error if the connection string is invalid or unsupported.
pub fn validate_connection_url(connection_string: &str) -> Result<Url> {
    let url = Url::parse(connection_string).map_err(|e| {
        GatewayError::configuration(format!("Invalid MySQL connection string format: {}", e))
    })?;

    let engine = url.scheme().split('+').next().unwrap_or_default();
    if !matches!(engine, "mysql" | "mariadb") {
        return Err(GatewayError::configuration(
            "Connection string must use mysql:// or mariadb:// scheme",
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(GatewayError::configuration(
            "Connection string must specify a host",
        ));
    }

    if url.port() == Some(0) {
        return Err(GatewayError::configuration(
            "Invalid port number: must be greater than 0",
        ));
    }

    Ok(url)
}

/// Rewrites an accepted connection string to the `mysql://` scheme the
/// driver understands.
///
/// # Errors
/// Returns error if the connection string fails validation.
pub fn normalize_connection_url(connection_string: &str) -> Result<String> {
    let url = validate_connection_url(connection_string)?;
    let (_, rest) = url.as_str().split_once("://").ok_or_else(|| {
        GatewayError::configuration("Connection string must contain a scheme separator")
    })?;
    Ok(format!("mysql://{}", rest))
}

/// Applies connection-string overrides on top of a base pool config.
///
/// Recognized query parameters:
/// - `connect_timeout`: acquisition timeout in seconds (1-300)
/// - `pool_max_conns`: total connection cap (1-100)
///
/// Out-of-range values are ignored; other parameters are left to the driver.
///
/// # Errors
/// Returns error if the URL or the resulting config is invalid.
pub fn parse_pool_config(connection_string: &str, base: PoolConfig) -> Result<PoolConfig> {
    let url = validate_connection_url(connection_string)?;
    let mut config = base;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "connect_timeout" => {
                if let Ok(timeout_secs) = value.parse::<u64>()
                    && timeout_secs > 0
                    && timeout_secs <= 300
                {
                    config.connect_timeout = Duration::from_secs(timeout_secs);
                }
            }
            "pool_max_conns" => {
                if let Ok(max_conns) = value.parse::<u32>()
                    && max_conns > 0
                    && max_conns <= MAX_TOTAL_CONNECTIONS
                {
                    config.pool_size = config.pool_size.min(max_conns);
                    config.max_overflow = max_conns.saturating_sub(config.pool_size);
                }
            }
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

/// Creates a lazily-connecting pool.
///
/// Each new session is made read-only and pinned to UTC before it is handed
/// out. Connections are recycled after `config.recycle` and probed before
/// checkout when `config.pre_ping` is set.
///
/// # Errors
/// Returns error if the connection string cannot be parsed by the driver.
pub fn create_pool(connection_string: &str, config: &PoolConfig) -> Result<MySqlPool> {
    use sqlx::Executor;

    let normalized = normalize_connection_url(connection_string)?;

    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(config.max_connections())
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.recycle)
        .test_before_acquire(config.pre_ping)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                conn.execute("SET time_zone = '+00:00'").await?;
                Ok(())
            })
        })
        .connect_lazy(&normalized)
        .map_err(|e| {
            GatewayError::collection_failed(
                format!(
                    "Failed to create MySQL connection pool to {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })?;

    tracing::debug!(
        "Created connection pool for {} (max {} connections)",
        redact_database_url(connection_string),
        config.max_connections()
    );

    Ok(pool)
}
