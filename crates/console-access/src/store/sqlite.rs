//! SQLite catalog store
//!
//! Resources, actions, permissions, roles and role grants live in five
//! tables. Reads resolve grants to resource and action names with a single
//! joined query per call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use console_rbac::{
    ActionRecord, DataScope, PermissionCode, ResourceRecord, ResourceScope, RolePermissionRecord,
    RoleRecord,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    AccessControlStore, AccessControlWriteStore, NewResource, NewRole, ResourceUpdate, RoleUpdate,
};
use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};

const ROLE_SELECT: &str = r#"
    SELECT ro.id, ro.name, ro.display_name, ro.scope, ro.is_active, ro.is_system,
           res.name AS resource_name, act.name AS action_name,
           rp.data_scope, rp.valid_from, rp.valid_until
    FROM roles ro
    LEFT JOIN role_permissions rp ON rp.role_id = ro.id
    LEFT JOIN permissions p ON p.id = rp.permission_id
    LEFT JOIN resources res ON res.id = p.resource_id
    LEFT JOIN actions act ON act.id = p.action_id
"#;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS resources (
        id TEXT PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        display_name TEXT,
        scope TEXT NOT NULL DEFAULT 'GLOBAL',
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS actions (
        id TEXT PRIMARY KEY,
        resource_id TEXT NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        display_name TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (resource_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS permissions (
        id TEXT PRIMARY KEY,
        resource_id TEXT NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
        action_id TEXT NOT NULL REFERENCES actions(id) ON DELETE CASCADE,
        UNIQUE (resource_id, action_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id TEXT PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        display_name TEXT,
        scope TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_system BOOLEAN NOT NULL DEFAULT FALSE,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        id TEXT PRIMARY KEY,
        role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
        data_scope TEXT NOT NULL DEFAULT 'ALL',
        valid_from DATETIME,
        valid_until DATETIME,
        UNIQUE (role_id, permission_id)
    )
    "#,
];

/// SQLite-backed catalog store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect using the configured URL and pool size, then create any
    /// missing catalog tables.
    pub async fn connect(config: &AccessConfig) -> AccessResult<Self> {
        info!("Creating SQLite access-control store");

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to SQLite database");
                AccessError::from(e)
            })?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open a private in-memory database with the schema applied.
    ///
    /// The pool is pinned to one connection that is never recycled, since
    /// every SQLite memory connection is its own database.
    pub async fn in_memory() -> AccessResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the catalog tables if they do not exist.
    pub async fn migrate(&self) -> AccessResult<()> {
        info!("Running access-control schema migrations");
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn fetch_roles(&self, filter: &str, bind: Option<&str>) -> AccessResult<Vec<RoleRecord>> {
        let sql = format!("{} {} ORDER BY ro.name, rp.rowid", ROLE_SELECT, filter);
        let mut query = sqlx::query(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut roles: Vec<RoleRecord> = Vec::new();
        for row in rows {
            let id: String = row.try_get("id")?;
            if roles.last().map_or(true, |r| r.id != id) {
                roles.push(RoleRecord {
                    id,
                    name: row.try_get("name")?,
                    display_name: row.try_get("display_name")?,
                    scope: row.try_get("scope")?,
                    is_active: row.try_get("is_active")?,
                    is_system: row.try_get("is_system")?,
                    permissions: Vec::new(),
                });
            }

            if let Some(grant) = row_to_grant(&row)? {
                if let Some(role) = roles.last_mut() {
                    role.permissions.push(grant);
                }
            }
        }
        Ok(roles)
    }

    async fn fetch_resources(&self, id: Option<&str>) -> AccessResult<Vec<ResourceRecord>> {
        let filter = if id.is_some() { "WHERE r.id = ?" } else { "" };
        let sql = format!(
            r#"
            SELECT r.id, r.name, r.display_name, r.scope,
                   a.id AS action_id, a.name AS action_name, a.display_name AS action_display_name
            FROM resources r
            LEFT JOIN actions a ON a.resource_id = r.id
            {}
            ORDER BY r.name, a.rowid
            "#,
            filter
        );
        let mut query = sqlx::query(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut resources: Vec<ResourceRecord> = Vec::new();
        for row in rows {
            let id: String = row.try_get("id")?;
            if resources.last().map_or(true, |r| r.id != id) {
                let raw_scope: String = row.try_get("scope")?;
                let scope = raw_scope.parse::<ResourceScope>()?;
                let mut resource = ResourceRecord::new(id, row.try_get::<String, _>("name")?, scope);
                resource.display_name = row.try_get("display_name")?;
                resources.push(resource);
            }

            let action_id: Option<String> = row.try_get("action_id")?;
            if let (Some(action_id), Some(resource)) = (action_id, resources.last_mut()) {
                let mut action = ActionRecord::new(action_id, row.try_get::<String, _>("action_name")?);
                action.display_name = row.try_get("action_display_name")?;
                resource.actions.push(action);
            }
        }
        Ok(resources)
    }

    async fn role_by_id(&self, id: &str) -> AccessResult<RoleRecord> {
        self.fetch_roles("WHERE ro.id = ?", Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::not_found("role", id))
    }

    async fn permission_id(&self, code: &PermissionCode) -> AccessResult<Option<String>> {
        let row = sqlx::query(
            "SELECT p.id FROM permissions p
             JOIN resources r ON r.id = p.resource_id
             JOIN actions a ON a.id = p.action_id
             WHERE r.name = ? AND a.name = ?",
        )
        .bind(&code.resource)
        .bind(&code.action)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("id")?),
            None => None,
        })
    }
}

fn row_to_grant(row: &SqliteRow) -> AccessResult<Option<RolePermissionRecord>> {
    let resource: Option<String> = row.try_get("resource_name")?;
    let action: Option<String> = row.try_get("action_name")?;
    let (Some(resource), Some(action)) = (resource, action) else {
        return Ok(None);
    };

    let raw_scope: Option<String> = row.try_get("data_scope")?;
    let data_scope = match raw_scope.as_deref() {
        None => DataScope::All,
        Some(raw) => DataScope::parse(raw).unwrap_or_else(|| {
            warn!(data_scope = raw, resource = %resource, action = %action, "Unknown data scope, treating as ALL");
            DataScope::All
        }),
    };

    Ok(Some(RolePermissionRecord {
        resource,
        action,
        data_scope,
        valid_from: row.try_get::<Option<DateTime<Utc>>, _>("valid_from")?,
        valid_until: row.try_get::<Option<DateTime<Utc>>, _>("valid_until")?,
    }))
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[async_trait]
impl AccessControlStore for SqliteStore {
    async fn list_resources(&self) -> AccessResult<Vec<ResourceRecord>> {
        self.fetch_resources(None).await
    }

    async fn list_active_roles(&self) -> AccessResult<Vec<RoleRecord>> {
        self.fetch_roles("WHERE ro.is_active = 1", None).await
    }

    async fn find_role(&self, name: &str) -> AccessResult<Option<RoleRecord>> {
        Ok(self
            .fetch_roles("WHERE ro.name = ?", Some(name))
            .await?
            .into_iter()
            .next())
    }
}

#[async_trait]
impl AccessControlWriteStore for SqliteStore {
    async fn create_resource(&self, input: NewResource) -> AccessResult<ResourceRecord> {
        let exists = sqlx::query("SELECT id FROM resources WHERE name = ?")
            .bind(&input.name)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AccessError::conflict("resource", input.name));
        }

        let mut resource = ResourceRecord::new(new_id(), input.name, input.scope);
        resource.display_name = input.display_name;

        sqlx::query("INSERT INTO resources (id, name, display_name, scope) VALUES (?, ?, ?, ?)")
            .bind(&resource.id)
            .bind(&resource.name)
            .bind(&resource.display_name)
            .bind(resource.scope.as_str())
            .execute(&self.pool)
            .await?;

        debug!(resource = %resource.name, "Resource created");
        Ok(resource)
    }

    async fn update_resource(&self, id: &str, update: ResourceUpdate) -> AccessResult<ResourceRecord> {
        let result = sqlx::query(
            "UPDATE resources SET display_name = COALESCE(?, display_name), scope = COALESCE(?, scope)
             WHERE id = ?",
        )
        .bind(&update.display_name)
        .bind(update.scope.map(|s| s.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AccessError::not_found("resource", id));
        }

        self.fetch_resources(Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::not_found("resource", id))
    }

    async fn delete_resource(&self, id: &str) -> AccessResult<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AccessError::not_found("resource", id));
        }
        Ok(())
    }

    async fn create_action(
        &self,
        resource_id: &str,
        name: &str,
        display_name: Option<String>,
    ) -> AccessResult<ActionRecord> {
        let resource = sqlx::query("SELECT name FROM resources WHERE id = ?")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AccessError::not_found("resource", resource_id))?;
        let resource_name: String = resource.try_get("name")?;

        let exists = sqlx::query("SELECT id FROM actions WHERE resource_id = ? AND name = ?")
            .bind(resource_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AccessError::conflict(
                "action",
                PermissionCode::new(resource_name, name).to_string(),
            ));
        }

        let mut action = ActionRecord::new(new_id(), name);
        action.display_name = display_name;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO actions (id, resource_id, name, display_name) VALUES (?, ?, ?, ?)")
            .bind(&action.id)
            .bind(resource_id)
            .bind(&action.name)
            .bind(&action.display_name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO permissions (id, resource_id, action_id) VALUES (?, ?, ?)")
            .bind(new_id())
            .bind(resource_id)
            .bind(&action.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(action)
    }

    async fn delete_action(&self, action_id: &str) -> AccessResult<()> {
        let result = sqlx::query("DELETE FROM actions WHERE id = ?")
            .bind(action_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AccessError::not_found("action", action_id));
        }
        Ok(())
    }

    async fn create_role(&self, input: NewRole) -> AccessResult<RoleRecord> {
        let stored_name = input.stored_name();
        let exists = sqlx::query("SELECT id FROM roles WHERE name = ?")
            .bind(&stored_name)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AccessError::conflict("role", stored_name));
        }

        let role = RoleRecord {
            id: new_id(),
            name: stored_name,
            display_name: input.display_name,
            scope: input.scope.as_str().to_string(),
            is_active: input.is_active,
            is_system: input.is_system,
            permissions: Vec::new(),
        };

        sqlx::query(
            "INSERT INTO roles (id, name, display_name, scope, is_active, is_system)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&role.id)
        .bind(&role.name)
        .bind(&role.display_name)
        .bind(&role.scope)
        .bind(role.is_active)
        .bind(role.is_system)
        .execute(&self.pool)
        .await?;

        debug!(role = %role.name, "Role created");
        Ok(role)
    }

    async fn update_role(&self, id: &str, update: RoleUpdate) -> AccessResult<RoleRecord> {
        let result = sqlx::query(
            "UPDATE roles SET display_name = COALESCE(?, display_name), is_active = COALESCE(?, is_active)
             WHERE id = ?",
        )
        .bind(&update.display_name)
        .bind(update.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AccessError::not_found("role", id));
        }
        self.role_by_id(id).await
    }

    async fn delete_role(&self, id: &str) -> AccessResult<()> {
        let role = self.role_by_id(id).await?;
        if role.is_system {
            return Err(AccessError::SystemRole(role.name));
        }

        sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn grant_permission(&self, role_id: &str, grant: RolePermissionRecord) -> AccessResult<()> {
        let code = grant.code();
        let permission_id = self
            .permission_id(&code)
            .await?
            .ok_or_else(|| AccessError::not_found("permission", code.to_string()))?;

        let role = sqlx::query("SELECT id FROM roles WHERE id = ?")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;
        if role.is_none() {
            return Err(AccessError::not_found("role", role_id));
        }

        sqlx::query(
            "INSERT INTO role_permissions (id, role_id, permission_id, data_scope, valid_from, valid_until)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (role_id, permission_id) DO UPDATE SET
                 data_scope = excluded.data_scope,
                 valid_from = excluded.valid_from,
                 valid_until = excluded.valid_until",
        )
        .bind(new_id())
        .bind(role_id)
        .bind(&permission_id)
        .bind(grant.data_scope.as_str())
        .bind(grant.valid_from)
        .bind(grant.valid_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_permission(&self, role_id: &str, code: &PermissionCode) -> AccessResult<bool> {
        let Some(permission_id) = self.permission_id(code).await? else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
            .bind(role_id)
            .bind(&permission_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_rbac::RoleScope;

    async fn seeded() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        let post = store
            .create_resource(NewResource::new("post", ResourceScope::Both))
            .await
            .unwrap();
        store.create_action(&post.id, "read", None).await.unwrap();
        store.create_action(&post.id, "write", None).await.unwrap();

        let editor = store
            .create_role(NewRole::new("editor", RoleScope::Global))
            .await
            .unwrap();
        store
            .grant_permission(&editor.id, RolePermissionRecord::new("post", "read"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_connect_creates_schema() {
        let config = AccessConfig {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            ..Default::default()
        };
        let store = SqliteStore::connect(&config).await.unwrap();

        assert!(store.list_resources().await.unwrap().is_empty());
        assert!(store.list_active_roles().await.unwrap().is_empty());

        // Running the schema again is harmless
        store.migrate().await.unwrap();
        store
            .create_resource(NewResource::new("post", ResourceScope::Both))
            .await
            .unwrap();
        assert_eq!(store.list_resources().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resources_with_actions() {
        let store = seeded().await;
        let resources = store.list_resources().await.unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "post");
        assert_eq!(resources[0].scope, ResourceScope::Both);
        assert_eq!(resources[0].action_names(), vec!["read", "write"]);
    }

    #[tokio::test]
    async fn test_active_roles_with_grants() {
        let store = seeded().await;
        let roles = store.list_active_roles().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "GLOBAL:editor");
        assert_eq!(roles[0].scope, "GLOBAL");
        assert_eq!(roles[0].permissions, vec![RolePermissionRecord::new("post", "read")]);
    }

    #[tokio::test]
    async fn test_inactive_roles_hidden_from_listing() {
        let store = seeded().await;
        let owner = store
            .create_role(NewRole::new("owner", RoleScope::Organization))
            .await
            .unwrap();
        store
            .grant_permission(&owner.id, RolePermissionRecord::new("post", "write"))
            .await
            .unwrap();
        store
            .update_role(&owner.id, RoleUpdate { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_active_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["GLOBAL:editor".to_string()]);

        let owner = store.find_role("ORGANIZATION:owner").await.unwrap().unwrap();
        assert!(!owner.is_active);
        assert_eq!(owner.permissions.len(), 1);
    }

    #[tokio::test]
    async fn test_role_without_grants() {
        let store = seeded().await;
        store
            .create_role(NewRole::new("viewer", RoleScope::Organization))
            .await
            .unwrap();
        let viewer = store.find_role("ORGANIZATION:viewer").await.unwrap().unwrap();
        assert!(viewer.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_resource_cascades() {
        let store = seeded().await;
        let post_id = store.list_resources().await.unwrap()[0].id.clone();
        store.delete_resource(&post_id).await.unwrap();

        assert!(store.list_resources().await.unwrap().is_empty());
        let editor = store.find_role("GLOBAL:editor").await.unwrap().unwrap();
        assert!(editor.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_grant_upsert_and_revoke() {
        let store = seeded().await;
        let editor = store.find_role("GLOBAL:editor").await.unwrap().unwrap();

        let mut grant = RolePermissionRecord::new("post", "read");
        grant.data_scope = DataScope::SelfOnly;
        store.grant_permission(&editor.id, grant).await.unwrap();

        let editor = store.find_role("GLOBAL:editor").await.unwrap().unwrap();
        assert_eq!(editor.permissions.len(), 1);
        assert_eq!(editor.permissions[0].data_scope, DataScope::SelfOnly);

        let code = PermissionCode::new("post", "read");
        assert!(store.revoke_permission(&editor.id, &code).await.unwrap());
        assert!(!store.revoke_permission(&editor.id, &code).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_errors() {
        let store = seeded().await;
        assert!(matches!(
            store.create_resource(NewResource::new("post", ResourceScope::Global)).await,
            Err(AccessError::Conflict { .. })
        ));
        assert!(matches!(
            store.create_role(NewRole::new("GLOBAL:editor", RoleScope::Global)).await,
            Err(AccessError::Conflict { .. })
        ));
        assert!(matches!(
            store.grant_permission("missing", RolePermissionRecord::new("post", "read")).await,
            Err(AccessError::NotFound { entity: "role", .. })
        ));

        let mut admin = NewRole::new("admin", RoleScope::Global);
        admin.is_system = true;
        let admin = store.create_role(admin).await.unwrap();
        assert!(matches!(
            store.delete_role(&admin.id).await,
            Err(AccessError::SystemRole(_))
        ));
    }
}
