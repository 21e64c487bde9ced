//! Access-control configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AccessError, AccessResult};

/// Default snapshot lifetime: 5 minutes.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration for the access-control loader and its storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessConfig {
    /// How long a loaded snapshot is served before the next access rebuilds it.
    pub cache_ttl_secs: u64,

    /// Database connection URL.
    pub database_url: String,

    /// Maximum pooled database connections.
    pub database_max_connections: u32,
}

impl Default for AccessConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            database_url: "sqlite://data/console.db".to_string(),
            database_max_connections: 5,
        }
    }
}

impl AccessConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RBAC_CACHE_TTL_SECS`: Snapshot lifetime in seconds (default: 300)
    /// - `DATABASE_URL`: Database URL (default: sqlite://data/console.db)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
    ///
    /// Unparseable numbers fall back to the defaults.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            cache_ttl_secs: std::env::var("RBAC_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.cache_ttl_secs),
            database_url: std::env::var("DATABASE_URL").unwrap_or(default.database_url),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.database_max_connections),
        }
    }

    /// Snapshot lifetime as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Reject settings the loader cannot work with.
    pub fn validate(&self) -> AccessResult<()> {
        if self.cache_ttl_secs == 0 {
            return Err(AccessError::Config(
                "RBAC_CACHE_TTL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.database_max_connections == 0 {
            return Err(AccessError::Config(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(AccessError::Config("DATABASE_URL is empty".to_string()));
        }
        Ok(())
    }
}
