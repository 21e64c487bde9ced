//! TTL cache for access-control snapshots
//!
//! Holds at most one snapshot for the whole process. The cache is either
//! **cold** (nothing stored, or the stored snapshot is older than the TTL)
//! or **warm**.
//!
//! ```text
//!            get() while cold: rebuild, store, return
//!   ┌──────┐ ─────────────────────────────────────────► ┌──────┐
//!   │ cold │                                             │ warm │ ◄─┐ get() within TTL:
//!   └──────┘ ◄───────────────────────────────────────── └──────┘ ──┘ no storage access
//!            TTL elapsed (seen on next get) or invalidate()
//! ```
//!
//! Expiry is checked lazily on access; there is no background refresh.
//! Concurrent cold callers share one rebuild: they queue on a gate and the
//! ones that wake after it completes reuse the stored snapshot.
//! `invalidate()` never waits for the gate, so a rebuild that is already
//! running still stores its result.
//!
//! Each process holds its own cache. Invalidating here does not reach other
//! processes serving the same database.

use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::DEFAULT_CACHE_TTL_SECS;
use crate::error::AccessResult;
use crate::loader::{load_access_control, AccessControlSnapshot};
use crate::store::AccessControlStore;

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<AccessControlSnapshot>>,
    loaded_at: Option<Instant>,
}

/// Process-wide snapshot cache with a TTL and explicit invalidation.
#[derive(Debug)]
pub struct AccessControlCache {
    ttl: Duration,
    state: RwLock<CacheState>,
    rebuild: Mutex<()>,
}

impl Default for AccessControlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessControlCache {
    /// Create a cache with the default 5 minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
            rebuild: Mutex::new(()),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the current snapshot, rebuilding it from `store` when cold.
    ///
    /// A failed rebuild leaves the cache cold and returns the error; the
    /// next call tries again from scratch.
    pub async fn get(&self, store: &dyn AccessControlStore) -> AccessResult<Arc<AccessControlSnapshot>> {
        if let Some(snapshot) = self.fresh() {
            debug!("Access control cache hit");
            return Ok(snapshot);
        }

        let _gate = self.rebuild.lock().await;

        // A rebuild may have finished while we waited for the gate
        if let Some(snapshot) = self.fresh() {
            debug!("Access control rebuilt by concurrent caller");
            return Ok(snapshot);
        }

        debug!("Access control cache cold, rebuilding");
        match load_access_control(store).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let mut state = self.write_state();
                state.snapshot = Some(snapshot.clone());
                state.loaded_at = Some(Instant::now());
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, "Access control rebuild failed");
                let mut state = self.write_state();
                state.snapshot = None;
                state.loaded_at = None;
                Err(e)
            }
        }
    }

    /// Discard the stored snapshot regardless of its age.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        state.snapshot = None;
        state.loaded_at = None;
        debug!("Access control cache cleared");
    }

    /// Whether a snapshot within its TTL is stored.
    pub fn is_warm(&self) -> bool {
        self.fresh().is_some()
    }

    /// When the stored snapshot was loaded.
    pub fn loaded_at(&self) -> Option<Instant> {
        self.read_state().loaded_at
    }

    fn fresh(&self) -> Option<Arc<AccessControlSnapshot>> {
        let state = self.read_state();
        match (&state.snapshot, state.loaded_at) {
            (Some(snapshot), Some(loaded_at)) if loaded_at.elapsed() < self.ttl => {
                Some(snapshot.clone())
            }
            _ => None,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use console_rbac::{ResourceRecord, ResourceScope};

    // Each rebuild issues two reads: resources, then active roles.
    const READS_PER_LOAD: u64 = 2;

    fn store() -> MemoryStore {
        MemoryStore::new().with_resource(
            ResourceRecord::new("r1", "post", ResourceScope::Both).with_action("a1", "read"),
        )
    }

    #[tokio::test]
    async fn test_warm_hit_skips_storage() {
        let store = store();
        let cache = AccessControlCache::new();
        assert!(!cache.is_warm());

        let first = cache.get(&store).await.unwrap();
        assert_eq!(store.query_count(), READS_PER_LOAD);
        assert!(cache.is_warm());

        let second = cache.get(&store).await.unwrap();
        assert_eq!(store.query_count(), READS_PER_LOAD);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let store = store();
        let cache = AccessControlCache::new();

        cache.get(&store).await.unwrap();
        cache.invalidate();
        assert!(!cache.is_warm());
        assert!(cache.loaded_at().is_none());

        cache.get(&store).await.unwrap();
        assert_eq!(store.query_count(), 2 * READS_PER_LOAD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_is_lazy() {
        let store = store();
        let cache = AccessControlCache::with_ttl(Duration::from_secs(300));

        cache.get(&store).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.is_warm());
        cache.get(&store).await.unwrap();
        assert_eq!(store.query_count(), READS_PER_LOAD);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cache.is_warm());
        // Nothing reloads until the next access
        assert_eq!(store.query_count(), READS_PER_LOAD);

        cache.get(&store).await.unwrap();
        assert_eq!(store.query_count(), 2 * READS_PER_LOAD);
    }

    #[tokio::test]
    async fn test_failed_rebuild_stays_cold() {
        let store = store();
        let cache = AccessControlCache::new();

        store.set_fail_reads(true);
        assert!(cache.get(&store).await.is_err());
        assert!(!cache.is_warm());

        store.set_fail_reads(false);
        let snapshot = cache.get(&store).await.unwrap();
        assert!(snapshot.statement.contains_resource("post"));
        assert!(cache.is_warm());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_callers_share_rebuild() {
        let store = Arc::new(store().with_read_delay(Duration::from_millis(50)));
        let cache = Arc::new(AccessControlCache::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.get(store.as_ref()).await.map(|s| s.statement.len())
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }

        assert_eq!(store.query_count(), READS_PER_LOAD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_rebuild_keeps_result() {
        let store = Arc::new(store().with_read_delay(Duration::from_millis(50)));
        let cache = Arc::new(AccessControlCache::new());

        let task = {
            let store = store.clone();
            let cache = cache.clone();
            tokio::spawn(async move { cache.get(store.as_ref()).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate();
        task.await.unwrap().unwrap();

        // The in-flight rebuild still stored its snapshot
        assert!(cache.is_warm());
    }
}
