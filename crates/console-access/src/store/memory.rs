//! In-memory catalog store.
//!
//! Suitable for tests and single-process tools. Reads are counted so cache
//! behaviour can be observed, and reads can be made to fail or to take time.

use async_trait::async_trait;
use console_rbac::{
    ActionRecord, PermissionCode, ResourceRecord, RolePermissionRecord, RoleRecord,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccessControlStore, AccessControlWriteStore, NewResource, NewRole, ResourceUpdate, RoleUpdate,
};
use crate::error::{AccessError, AccessResult};

#[derive(Debug, Default)]
struct Tables {
    resources: Vec<ResourceRecord>,
    roles: Vec<RoleRecord>,
}

/// In-memory implementation of the catalog store.
///
/// # Example
///
/// ```rust
/// use console_access::store::{AccessControlStore, MemoryStore};
/// use console_rbac::{ResourceRecord, ResourceScope, RoleRecord, RoleScope};
///
/// let store = MemoryStore::new()
///     .with_resource(ResourceRecord::new("r1", "post", ResourceScope::Both).with_action("a1", "read"))
///     .with_role(RoleRecord::new("role-1", "editor", RoleScope::Global).grant("post", "read"));
///
/// assert_eq!(store.query_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    queries: AtomicU64,
    fail_reads: AtomicBool,
    read_delay: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource (builder style).
    pub fn with_resource(mut self, resource: ResourceRecord) -> Self {
        self.tables.get_mut().resources.push(resource);
        self
    }

    /// Seed a role (builder style).
    pub fn with_role(mut self, role: RoleRecord) -> Self {
        self.tables.get_mut().roles.push(role);
        self
    }

    /// Make every read sleep first (builder style).
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Number of read queries issued so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make subsequent reads fail with a storage error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    async fn begin_read(&self) -> AccessResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AccessError::Storage("memory store read failure".to_string()));
        }
        Ok(())
    }

    fn new_id() -> String {
        Uuid::now_v7().to_string()
    }
}

#[async_trait]
impl AccessControlStore for MemoryStore {
    async fn list_resources(&self) -> AccessResult<Vec<ResourceRecord>> {
        self.begin_read().await?;
        Ok(self.tables.read().await.resources.clone())
    }

    async fn list_active_roles(&self) -> AccessResult<Vec<RoleRecord>> {
        self.begin_read().await?;
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().filter(|r| r.is_active).cloned().collect())
    }

    async fn find_role(&self, name: &str) -> AccessResult<Option<RoleRecord>> {
        self.begin_read().await?;
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.name == name).cloned())
    }
}

#[async_trait]
impl AccessControlWriteStore for MemoryStore {
    async fn create_resource(&self, input: NewResource) -> AccessResult<ResourceRecord> {
        let mut tables = self.tables.write().await;
        if tables.resources.iter().any(|r| r.name == input.name) {
            return Err(AccessError::conflict("resource", input.name));
        }

        let mut resource = ResourceRecord::new(Self::new_id(), input.name, input.scope);
        resource.display_name = input.display_name;
        tables.resources.push(resource.clone());
        Ok(resource)
    }

    async fn update_resource(&self, id: &str, update: ResourceUpdate) -> AccessResult<ResourceRecord> {
        let mut tables = self.tables.write().await;
        let resource = tables
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AccessError::not_found("resource", id))?;

        if let Some(display_name) = update.display_name {
            resource.display_name = Some(display_name);
        }
        if let Some(scope) = update.scope {
            resource.scope = scope;
        }
        Ok(resource.clone())
    }

    async fn delete_resource(&self, id: &str) -> AccessResult<()> {
        let mut tables = self.tables.write().await;
        let index = tables
            .resources
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AccessError::not_found("resource", id))?;

        let removed = tables.resources.remove(index);
        for role in tables.roles.iter_mut() {
            role.permissions.retain(|p| p.resource != removed.name);
        }
        Ok(())
    }

    async fn create_action(
        &self,
        resource_id: &str,
        name: &str,
        display_name: Option<String>,
    ) -> AccessResult<ActionRecord> {
        let mut tables = self.tables.write().await;
        let resource = tables
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
            .ok_or_else(|| AccessError::not_found("resource", resource_id))?;

        if resource.actions.iter().any(|a| a.name == name) {
            return Err(AccessError::conflict(
                "action",
                PermissionCode::new(resource.name.clone(), name).to_string(),
            ));
        }

        let mut action = ActionRecord::new(Self::new_id(), name);
        action.display_name = display_name;
        resource.actions.push(action.clone());
        Ok(action)
    }

    async fn delete_action(&self, action_id: &str) -> AccessResult<()> {
        let mut tables = self.tables.write().await;

        let mut removed = None;
        for resource in tables.resources.iter_mut() {
            if let Some(index) = resource.actions.iter().position(|a| a.id == action_id) {
                let action = resource.actions.remove(index);
                removed = Some(PermissionCode::new(resource.name.clone(), action.name));
                break;
            }
        }
        let code = removed.ok_or_else(|| AccessError::not_found("action", action_id))?;

        for role in tables.roles.iter_mut() {
            role.permissions
                .retain(|p| !(p.resource == code.resource && p.action == code.action));
        }
        Ok(())
    }

    async fn create_role(&self, input: NewRole) -> AccessResult<RoleRecord> {
        let mut tables = self.tables.write().await;
        let stored_name = input.stored_name();
        if tables.roles.iter().any(|r| r.name == stored_name) {
            return Err(AccessError::conflict("role", stored_name));
        }

        let role = RoleRecord {
            id: Self::new_id(),
            name: stored_name,
            display_name: input.display_name,
            scope: input.scope.as_str().to_string(),
            is_active: input.is_active,
            is_system: input.is_system,
            permissions: Vec::new(),
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: &str, update: RoleUpdate) -> AccessResult<RoleRecord> {
        let mut tables = self.tables.write().await;
        let role = tables
            .roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AccessError::not_found("role", id))?;

        if let Some(display_name) = update.display_name {
            role.display_name = Some(display_name);
        }
        if let Some(is_active) = update.is_active {
            role.is_active = is_active;
        }
        Ok(role.clone())
    }

    async fn delete_role(&self, id: &str) -> AccessResult<()> {
        let mut tables = self.tables.write().await;
        let index = tables
            .roles
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AccessError::not_found("role", id))?;

        if tables.roles[index].is_system {
            return Err(AccessError::SystemRole(tables.roles[index].name.clone()));
        }
        tables.roles.remove(index);
        Ok(())
    }

    async fn grant_permission(&self, role_id: &str, grant: RolePermissionRecord) -> AccessResult<()> {
        let mut tables = self.tables.write().await;

        let defined = tables.resources.iter().any(|r| {
            r.name == grant.resource && r.actions.iter().any(|a| a.name == grant.action)
        });
        if !defined {
            return Err(AccessError::not_found("permission", grant.code().to_string()));
        }

        let role = tables
            .roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AccessError::not_found("role", role_id))?;

        match role
            .permissions
            .iter_mut()
            .find(|p| p.resource == grant.resource && p.action == grant.action)
        {
            Some(existing) => *existing = grant,
            None => role.permissions.push(grant),
        }
        Ok(())
    }

    async fn revoke_permission(&self, role_id: &str, code: &PermissionCode) -> AccessResult<bool> {
        let mut tables = self.tables.write().await;
        let role = tables
            .roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AccessError::not_found("role", role_id))?;

        let before = role.permissions.len();
        role.permissions
            .retain(|p| !(p.resource == code.resource && p.action == code.action));
        Ok(role.permissions.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_rbac::{ResourceScope, RoleScope};

    fn seeded() -> MemoryStore {
        MemoryStore::new()
            .with_resource(
                ResourceRecord::new("r1", "post", ResourceScope::Both)
                    .with_action("a1", "read")
                    .with_action("a2", "write"),
            )
            .with_role(RoleRecord::new("role-1", "editor", RoleScope::Global).grant("post", "read"))
            .with_role(
                RoleRecord::new("role-2", "owner", RoleScope::Organization)
                    .grant("post", "write")
                    .active(false),
            )
    }

    #[tokio::test]
    async fn test_reads_are_counted() {
        let store = seeded();
        assert_eq!(store.query_count(), 0);

        let resources = store.list_resources().await.unwrap();
        assert_eq!(resources.len(), 1);
        let roles = store.list_active_roles().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "GLOBAL:editor");

        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_find_role_includes_inactive() {
        let store = seeded();
        let owner = store.find_role("ORGANIZATION:owner").await.unwrap().unwrap();
        assert!(!owner.is_active);
        assert!(store.find_role("owner").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_failure_toggle() {
        let store = seeded();
        store.set_fail_reads(true);
        assert!(matches!(
            store.list_resources().await,
            Err(AccessError::Storage(_))
        ));
        store.set_fail_reads(false);
        assert!(store.list_resources().await.is_ok());
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_resource_name_conflict() {
        let store = seeded();
        let err = store
            .create_resource(NewResource::new("post", ResourceScope::Global))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict { entity: "resource", .. }));
    }

    #[tokio::test]
    async fn test_delete_action_removes_grants() {
        let store = seeded();
        store.delete_action("a1").await.unwrap();

        let editor = store.find_role("GLOBAL:editor").await.unwrap().unwrap();
        assert!(editor.permissions.is_empty());

        let resources = store.list_resources().await.unwrap();
        assert_eq!(resources[0].action_names(), vec!["write"]);
    }

    #[tokio::test]
    async fn test_grant_requires_defined_permission() {
        let store = seeded();
        let err = store
            .grant_permission("role-1", RolePermissionRecord::new("post", "publish"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound { entity: "permission", .. }));

        // Granting twice keeps a single row
        store
            .grant_permission("role-1", RolePermissionRecord::new("post", "write"))
            .await
            .unwrap();
        store
            .grant_permission("role-1", RolePermissionRecord::new("post", "write"))
            .await
            .unwrap();
        let editor = store.find_role("GLOBAL:editor").await.unwrap().unwrap();
        assert_eq!(editor.permissions.len(), 2);
    }

    #[tokio::test]
    async fn test_system_role_cannot_be_deleted() {
        let store = MemoryStore::new()
            .with_role(RoleRecord::new("sys", "admin", RoleScope::Global).system());
        assert!(matches!(
            store.delete_role("sys").await,
            Err(AccessError::SystemRole(_))
        ));
        assert!(matches!(
            store.delete_role("missing").await,
            Err(AccessError::NotFound { .. })
        ));
    }
}
