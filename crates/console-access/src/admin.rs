//! Admin write paths
//!
//! [`AccessAdmin`] wraps a writable store. After each committed write it
//! clears the snapshot cache, then hands a [`MutationEvent`] to the hook
//! registry. Reads through [`AccessAdmin::service`] see the change on the
//! next access.

use console_rbac::{ActionRecord, PermissionCode, ResourceRecord, RolePermissionRecord, RoleRecord};
use std::sync::Arc;
use tracing::info;

use crate::config::AccessConfig;
use crate::error::AccessResult;
use crate::hooks::{HookRegistry, MutationEvent};
use crate::service::AccessControlService;
use crate::store::{AccessControlWriteStore, NewResource, NewRole, ResourceUpdate, RoleUpdate};

/// Catalog administration with cache invalidation and hooks.
pub struct AccessAdmin<S> {
    store: Arc<S>,
    service: Arc<AccessControlService>,
    hooks: Arc<HookRegistry>,
}

impl<S> std::fmt::Debug for AccessAdmin<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessAdmin")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl<S> AccessAdmin<S>
where
    S: AccessControlWriteStore + 'static,
{
    /// Create an admin and a read service sharing `store`.
    pub fn new(store: Arc<S>) -> Self {
        let service = AccessControlService::new(store.clone());
        Self::with_service(store, Arc::new(service))
    }

    /// Like [`AccessAdmin::new`], with the cache TTL from `config`.
    pub fn with_config(store: Arc<S>, config: &AccessConfig) -> Self {
        let service = AccessControlService::with_config(store.clone(), config);
        Self::with_service(store, Arc::new(service))
    }

    /// Use an existing read service. It must wrap the same store, or cleared
    /// snapshots will be rebuilt from stale data.
    pub fn with_service(store: Arc<S>, service: Arc<AccessControlService>) -> Self {
        Self {
            store,
            service,
            hooks: Arc::new(HookRegistry::new()),
        }
    }

    /// Share a hook registry with other components (builder style).
    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Read service whose cache this admin clears.
    pub fn service(&self) -> &Arc<AccessControlService> {
        &self.service
    }

    /// Registry that receives every committed mutation.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    /// Underlying writable store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a resource.
    pub async fn create_resource(&self, input: NewResource) -> AccessResult<ResourceRecord> {
        let resource = self.store.create_resource(input).await?;
        self.committed(MutationEvent::ResourceCreated {
            id: resource.id.clone(),
            name: resource.name.clone(),
        })
        .await;
        Ok(resource)
    }

    /// Change a resource's label or scope.
    pub async fn update_resource(
        &self,
        id: &str,
        update: ResourceUpdate,
    ) -> AccessResult<ResourceRecord> {
        let resource = self.store.update_resource(id, update).await?;
        self.committed(MutationEvent::ResourceUpdated {
            id: resource.id.clone(),
            name: resource.name.clone(),
        })
        .await;
        Ok(resource)
    }

    /// Delete a resource with its actions and grants.
    pub async fn delete_resource(&self, id: &str) -> AccessResult<()> {
        self.store.delete_resource(id).await?;
        self.committed(MutationEvent::ResourceDeleted { id: id.to_string() })
            .await;
        Ok(())
    }

    /// Add an action, defining the matching permission.
    pub async fn create_action(
        &self,
        resource_id: &str,
        name: &str,
        display_name: Option<String>,
    ) -> AccessResult<ActionRecord> {
        let action = self
            .store
            .create_action(resource_id, name, display_name)
            .await?;
        self.committed(MutationEvent::ActionCreated {
            resource_id: resource_id.to_string(),
            id: action.id.clone(),
            name: action.name.clone(),
        })
        .await;
        Ok(action)
    }

    /// Delete an action and the grants that reference it.
    pub async fn delete_action(&self, action_id: &str) -> AccessResult<()> {
        self.store.delete_action(action_id).await?;
        self.committed(MutationEvent::ActionDeleted {
            id: action_id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Create a role; the stored name gets the scope prefix.
    pub async fn create_role(&self, input: NewRole) -> AccessResult<RoleRecord> {
        let role = self.store.create_role(input).await?;
        self.committed(MutationEvent::RoleCreated {
            id: role.id.clone(),
            name: role.name.clone(),
        })
        .await;
        Ok(role)
    }

    /// Update a role; deactivating removes it from the next snapshot.
    pub async fn update_role(&self, id: &str, update: RoleUpdate) -> AccessResult<RoleRecord> {
        let role = self.store.update_role(id, update).await?;
        self.committed(MutationEvent::RoleUpdated {
            id: role.id.clone(),
            name: role.name.clone(),
        })
        .await;
        Ok(role)
    }

    /// Delete a non-system role.
    pub async fn delete_role(&self, id: &str) -> AccessResult<()> {
        self.store.delete_role(id).await?;
        self.committed(MutationEvent::RoleDeleted { id: id.to_string() })
            .await;
        Ok(())
    }

    /// Grant a permission, replacing the qualifiers of an existing grant.
    pub async fn grant_permission(
        &self,
        role_id: &str,
        grant: RolePermissionRecord,
    ) -> AccessResult<()> {
        let code = grant.code();
        self.store.grant_permission(role_id, grant).await?;
        self.committed(MutationEvent::PermissionGranted {
            role_id: role_id.to_string(),
            code,
        })
        .await;
        Ok(())
    }

    /// Revoke a grant. Nothing is cleared or dispatched when the role did
    /// not hold it.
    pub async fn revoke_permission(&self, role_id: &str, code: &PermissionCode) -> AccessResult<bool> {
        let revoked = self.store.revoke_permission(role_id, code).await?;
        if revoked {
            self.committed(MutationEvent::PermissionRevoked {
                role_id: role_id.to_string(),
                code: code.clone(),
            })
            .await;
        }
        Ok(revoked)
    }

    async fn committed(&self, event: MutationEvent) {
        self.service.clear_access_control_cache();
        let delivered = self.hooks.dispatch(&event).await;
        info!(event = event.kind(), hooks = delivered, "Access catalog changed");
    }
}
