//! Storage backends for the access-control catalog
//!
//! The loader reads resources and roles through [`AccessControlStore`]; the
//! admin write paths go through [`AccessControlWriteStore`]. Two backends
//! are provided:
//!
//! - `memory` (default): in-process tables, used by tests and single-binary tools
//! - `sqlite`: SQLite via `sqlx`, matching the console's relational schema
//!
//! Every read is one round trip from the loader's point of view; the memory
//! backend counts them so tests can observe cache hits.

use async_trait::async_trait;
use console_rbac::{
    ActionRecord, PermissionCode, ResourceRecord, ResourceScope, RolePermissionRecord, RoleRecord,
    RoleScope,
};
use serde::{Deserialize, Serialize};

use crate::error::AccessResult;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Read side of the catalog, as consumed by the loader.
#[async_trait]
pub trait AccessControlStore: Send + Sync {
    /// All resources, each with its actions.
    async fn list_resources(&self) -> AccessResult<Vec<ResourceRecord>>;

    /// Roles with `is_active = true`, each with its grants resolved to
    /// resource and action names.
    async fn list_active_roles(&self) -> AccessResult<Vec<RoleRecord>>;

    /// A single role by stored (prefixed) name, active or not.
    async fn find_role(&self, name: &str) -> AccessResult<Option<RoleRecord>>;
}

/// Input for creating a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    /// Unique resource name.
    pub name: String,
    /// Human-readable label.
    pub display_name: Option<String>,
    /// Where the resource applies.
    pub scope: ResourceScope,
}

impl NewResource {
    /// Create input with no display name.
    pub fn new(name: impl Into<String>, scope: ResourceScope) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            scope,
        }
    }
}

/// Partial update of a resource. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceUpdate {
    /// New label.
    pub display_name: Option<String>,
    /// New scope.
    pub scope: Option<ResourceScope>,
}

/// Input for creating a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    /// Bare or already-prefixed name; stored with the scope prefix.
    pub name: String,
    /// Human-readable label.
    pub display_name: Option<String>,
    /// Role scope.
    pub scope: RoleScope,
    /// Whether the role is materialized.
    pub is_active: bool,
    /// Built-in role that cannot be deleted.
    pub is_system: bool,
}

impl NewRole {
    /// Create input for an active, non-system role.
    pub fn new(name: impl Into<String>, scope: RoleScope) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            scope,
            is_active: true,
            is_system: false,
        }
    }

    /// Stored name, with the scope prefix.
    pub fn stored_name(&self) -> String {
        self.scope.qualify(&self.name)
    }
}

/// Partial update of a role. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    /// New label.
    pub display_name: Option<String>,
    /// Activate or deactivate the role.
    pub is_active: Option<bool>,
}

/// Write side of the catalog, used by the admin service.
///
/// Unique names are enforced (`Conflict`), unknown IDs yield `NotFound`,
/// and system roles cannot be deleted (`SystemRole`). Deleting a resource or
/// action removes the grants that reference it.
#[async_trait]
pub trait AccessControlWriteStore: AccessControlStore {
    /// Create a resource.
    async fn create_resource(&self, input: NewResource) -> AccessResult<ResourceRecord>;

    /// Update a resource's label or scope.
    async fn update_resource(&self, id: &str, update: ResourceUpdate) -> AccessResult<ResourceRecord>;

    /// Delete a resource with its actions and grants.
    async fn delete_resource(&self, id: &str) -> AccessResult<()>;

    /// Add an action to a resource. This also defines the
    /// `resource:action` permission that roles can be granted.
    async fn create_action(
        &self,
        resource_id: &str,
        name: &str,
        display_name: Option<String>,
    ) -> AccessResult<ActionRecord>;

    /// Delete an action and the grants that reference it.
    async fn delete_action(&self, action_id: &str) -> AccessResult<()>;

    /// Create a role.
    async fn create_role(&self, input: NewRole) -> AccessResult<RoleRecord>;

    /// Update a role's label or active flag.
    async fn update_role(&self, id: &str, update: RoleUpdate) -> AccessResult<RoleRecord>;

    /// Delete a non-system role with its grants.
    async fn delete_role(&self, id: &str) -> AccessResult<()>;

    /// Grant a permission to a role, replacing the qualifiers of an existing grant.
    async fn grant_permission(&self, role_id: &str, grant: RolePermissionRecord) -> AccessResult<()>;

    /// Remove a grant. Returns whether one existed.
    async fn revoke_permission(&self, role_id: &str, code: &PermissionCode) -> AccessResult<bool>;
}
