//! Mutation hooks
//!
//! Every committed catalog write produces a [`MutationEvent`]. Hooks are
//! registered once at startup in a [`HookRegistry`] and receive each event
//! after the cache has been cleared. A hook that fails is logged and
//! skipped; the write itself has already succeeded.
//!
//! Deployments running several processes can register a hook that
//! broadcasts the event so peers clear their own caches.

use async_trait::async_trait;
use console_rbac::PermissionCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AccessResult;

/// A committed change to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationEvent {
    /// A resource was created.
    ResourceCreated {
        /// Resource ID.
        id: String,
        /// Resource name.
        name: String,
    },
    /// A resource's label or scope changed.
    ResourceUpdated {
        /// Resource ID.
        id: String,
        /// Resource name.
        name: String,
    },
    /// A resource was deleted with its actions and grants.
    ResourceDeleted {
        /// Resource ID.
        id: String,
    },
    /// An action (and its permission) was added to a resource.
    ActionCreated {
        /// Owning resource ID.
        resource_id: String,
        /// Action ID.
        id: String,
        /// Action name.
        name: String,
    },
    /// An action was deleted with its grants.
    ActionDeleted {
        /// Action ID.
        id: String,
    },
    /// A role was created.
    RoleCreated {
        /// Role ID.
        id: String,
        /// Stored (prefixed) role name.
        name: String,
    },
    /// A role's label or active flag changed.
    RoleUpdated {
        /// Role ID.
        id: String,
        /// Stored (prefixed) role name.
        name: String,
    },
    /// A role was deleted.
    RoleDeleted {
        /// Role ID.
        id: String,
    },
    /// A permission was granted to a role, or its qualifiers replaced.
    PermissionGranted {
        /// Role ID.
        role_id: String,
        /// Granted permission.
        code: PermissionCode,
    },
    /// A permission was taken from a role.
    PermissionRevoked {
        /// Role ID.
        role_id: String,
        /// Revoked permission.
        code: PermissionCode,
    },
}

impl MutationEvent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MutationEvent::ResourceCreated { .. } => "resource_created",
            MutationEvent::ResourceUpdated { .. } => "resource_updated",
            MutationEvent::ResourceDeleted { .. } => "resource_deleted",
            MutationEvent::ActionCreated { .. } => "action_created",
            MutationEvent::ActionDeleted { .. } => "action_deleted",
            MutationEvent::RoleCreated { .. } => "role_created",
            MutationEvent::RoleUpdated { .. } => "role_updated",
            MutationEvent::RoleDeleted { .. } => "role_deleted",
            MutationEvent::PermissionGranted { .. } => "permission_granted",
            MutationEvent::PermissionRevoked { .. } => "permission_revoked",
        }
    }
}

/// Receiver of catalog mutation events.
#[async_trait]
pub trait MutationHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// React to a committed mutation.
    async fn on_mutation(&self, event: &MutationEvent) -> AccessResult<()>;
}

/// Ordered set of registered hooks.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn MutationHook>>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").finish_non_exhaustive()
    }
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Hooks run in registration order.
    pub async fn register(&self, hook: Arc<dyn MutationHook>) {
        debug!(hook = hook.name(), "Registered mutation hook");
        self.hooks.write().await.push(hook);
    }

    /// Number of registered hooks.
    pub async fn len(&self) -> usize {
        self.hooks.read().await.len()
    }

    /// Whether no hook is registered.
    pub async fn is_empty(&self) -> bool {
        self.hooks.read().await.is_empty()
    }

    /// Deliver an event to every hook.
    ///
    /// Returns the number of hooks that handled it without error.
    pub async fn dispatch(&self, event: &MutationEvent) -> usize {
        let hooks = self.hooks.read().await.clone();
        let mut delivered = 0;

        for hook in hooks {
            match hook.on_mutation(event).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        hook = hook.name(),
                        event = event.kind(),
                        error = %e,
                        "Mutation hook failed"
                    );
                }
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MutationHook for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn on_mutation(&self, event: &MutationEvent) -> AccessResult<()> {
            self.seen.lock().unwrap().push(event.kind().to_string());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl MutationHook for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_mutation(&self, _event: &MutationEvent) -> AccessResult<()> {
            Err(AccessError::Storage("broadcast unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_continues_past_failure() {
        let registry = HookRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register(Arc::new(Failing)).await;
        registry.register(recorder.clone()).await;
        assert_eq!(registry.len().await, 2);

        let delivered = registry
            .dispatch(&MutationEvent::RoleDeleted { id: "r1".to_string() })
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["role_deleted"]);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = HookRegistry::new();
        assert!(registry.is_empty().await);
        let event = MutationEvent::ResourceDeleted { id: "x".to_string() };
        assert_eq!(registry.dispatch(&event).await, 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = MutationEvent::PermissionGranted {
            role_id: "r1".to_string(),
            code: PermissionCode::new("post", "read"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "permission_granted");
        assert_eq!(json["role_id"], "r1");
    }
}
