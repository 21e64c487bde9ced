//! Access-control service
//!
//! Bundles a catalog store with the snapshot cache. Construct one at startup
//! and share it (behind an `Arc`) with request handlers and the admin paths.

use console_rbac::RoleScope;
use std::sync::Arc;

use crate::cache::AccessControlCache;
use crate::config::AccessConfig;
use crate::error::AccessResult;
use crate::loader::AccessControlSnapshot;
use crate::permissions;
use crate::store::AccessControlStore;

/// Store plus snapshot cache.
pub struct AccessControlService {
    store: Arc<dyn AccessControlStore>,
    cache: AccessControlCache,
}

impl std::fmt::Debug for AccessControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessControlService")
            .field("cache_ttl", &self.cache.ttl())
            .field("warm", &self.cache.is_warm())
            .finish()
    }
}

impl AccessControlService {
    /// Create a service with the default cache TTL.
    pub fn new(store: Arc<dyn AccessControlStore>) -> Self {
        Self {
            store,
            cache: AccessControlCache::new(),
        }
    }

    /// Create a service using the TTL from `config`.
    pub fn with_config(store: Arc<dyn AccessControlStore>, config: &AccessConfig) -> Self {
        Self {
            store,
            cache: AccessControlCache::with_ttl(config.cache_ttl()),
        }
    }

    /// Connect to the configured SQLite database and build a service on it.
    #[cfg(feature = "sqlite")]
    pub async fn from_config(config: &AccessConfig) -> AccessResult<Self> {
        config.validate()?;
        let store = crate::store::SqliteStore::connect(config).await?;
        Ok(Self::with_config(Arc::new(store), config))
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn AccessControlStore> {
        &self.store
    }

    /// Snapshot cache.
    pub fn cache(&self) -> &AccessControlCache {
        &self.cache
    }

    /// Current snapshot, served from cache while warm.
    pub async fn get_access_control(&self) -> AccessResult<Arc<AccessControlSnapshot>> {
        self.cache.get(self.store.as_ref()).await
    }

    /// Rebuild a snapshot straight from storage without touching the cache.
    pub async fn load_access_control(&self) -> AccessResult<AccessControlSnapshot> {
        crate::loader::load_access_control(self.store.as_ref()).await
    }

    /// Drop the cached snapshot; the next `get_access_control` rebuilds.
    pub fn clear_access_control_cache(&self) {
        self.cache.invalidate();
    }

    /// Uncached `resource:action` codes for a role.
    pub async fn get_role_permissions(
        &self,
        role_name: &str,
        scope: RoleScope,
    ) -> AccessResult<Vec<String>> {
        permissions::get_role_permissions(self.store.as_ref(), role_name, scope).await
    }

    /// Uncached check of one permission code for a role.
    pub async fn check_role_permission(
        &self,
        role_name: &str,
        code: &str,
        scope: RoleScope,
    ) -> AccessResult<bool> {
        permissions::check_role_permission(self.store.as_ref(), role_name, code, scope).await
    }
}
