//! Configuration types for the gateway.
//!
//! - `PoolConfig`: Connection pool sizing and recycling
//! - `GatewayConfig`: Allow-list and row-cap policy for the tool surface
//! - `CatalogOptions`: Per-request catalog build options
//!
//! # Security
//! None of these structs store connection strings or credentials.

mod catalog;
mod gateway;
mod pool;

pub use catalog::CatalogOptions;
pub use gateway::{
    DEFAULT_LIMIT, DEFAULT_MAX_TEXT_LEN, GatewayConfig, allow_list, parse_allow_list,
};
pub use pool::{MAX_TOTAL_CONNECTIONS, PoolConfig};
