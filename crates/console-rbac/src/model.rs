//! # Catalog Model
//!
//! Records read from storage: resources with their actions, and roles with
//! their grants. These are plain data; statements and role objects are
//! derived from them and never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RbacError, RbacResult};
use crate::scope::{DataScope, ResourceScope, RoleScope};

/// An action performable on a resource (e.g. `read`, `delete`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Action ID.
    pub id: String,
    /// Action name, unique within its resource.
    pub name: String,
    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ActionRecord {
    /// Create an action with the given ID and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
        }
    }
}

/// A resource together with its actions.
///
/// # Example
///
/// ```
/// use console_rbac::{ResourceRecord, ResourceScope};
///
/// let post = ResourceRecord::new("res-1", "post", ResourceScope::Both)
///     .with_action("act-1", "read")
///     .with_action("act-2", "write");
///
/// assert_eq!(post.action_names(), vec!["read", "write"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Resource ID.
    pub id: String,
    /// Unique resource name (statement key).
    pub name: String,
    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Where the resource applies.
    pub scope: ResourceScope,
    /// Actions defined on this resource.
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl ResourceRecord {
    /// Create a resource with no actions.
    pub fn new(id: impl Into<String>, name: impl Into<String>, scope: ResourceScope) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: None,
            scope,
            actions: Vec::new(),
        }
    }

    /// Add an action (builder style).
    pub fn with_action(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.actions.push(ActionRecord::new(id, name));
        self
    }

    /// Names of this resource's actions, in storage order.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}

/// A grant of one (resource, action) pair to a role.
///
/// Data scope and validity window are stored but not enforced by the loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionRecord {
    /// Resource name of the granted permission.
    pub resource: String,
    /// Action name of the granted permission.
    pub action: String,
    /// Data-scope qualifier.
    #[serde(default)]
    pub data_scope: DataScope,
    /// Start of the validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl RolePermissionRecord {
    /// Create an unrestricted grant.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            data_scope: DataScope::All,
            valid_from: None,
            valid_until: None,
        }
    }

    /// Permission code (`resource:action`) of this grant.
    pub fn code(&self) -> PermissionCode {
        PermissionCode::new(self.resource.clone(), self.action.clone())
    }

    /// Whether the validity window covers `now`.
    ///
    /// Open-ended bounds always match.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.valid_from.map_or(true, |from| from <= now);
        let not_ended = self.valid_until.map_or(true, |until| now <= until);
        started && not_ended
    }
}

/// A role as stored, with its grants.
///
/// `scope` is kept as the raw stored value; consumers decide what to do with
/// values outside [`RoleScope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    /// Role ID.
    pub id: String,
    /// Stored name, including its scope prefix (e.g. `GLOBAL:admin`).
    pub name: String,
    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Raw stored scope.
    pub scope: String,
    /// Whether the role is materialized at all.
    pub is_active: bool,
    /// Built-in role that cannot be deleted.
    pub is_system: bool,
    /// Grants attached to the role.
    #[serde(default)]
    pub permissions: Vec<RolePermissionRecord>,
}

impl RoleRecord {
    /// Create an active, non-system role with a qualified stored name.
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::{RoleRecord, RoleScope};
    ///
    /// let role = RoleRecord::new("role-1", "editor", RoleScope::Global).grant("post", "read");
    /// assert_eq!(role.name, "GLOBAL:editor");
    /// assert_eq!(role.bare_name(), "editor");
    /// ```
    pub fn new(id: impl Into<String>, name: &str, scope: RoleScope) -> Self {
        Self {
            id: id.into(),
            name: scope.qualify(name),
            display_name: None,
            scope: scope.as_str().to_string(),
            is_active: true,
            is_system: false,
            permissions: Vec::new(),
        }
    }

    /// Add a grant (builder style).
    pub fn grant(mut self, resource: impl Into<String>, action: impl Into<String>) -> Self {
        self.permissions.push(RolePermissionRecord::new(resource, action));
        self
    }

    /// Set the active flag (builder style).
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Mark as a system role (builder style).
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Set the display name (builder style).
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Name with the scope prefix removed.
    pub fn bare_name(&self) -> &str {
        RoleScope::strip_prefix(&self.name)
    }

    /// Scope of the role, or `None` unless the stored value is exactly
    /// `GLOBAL` or `ORGANIZATION`.
    pub fn role_scope(&self) -> Option<RoleScope> {
        RoleScope::from_stored(&self.scope)
    }
}

/// A `resource:action` permission code.
///
/// # Example
///
/// ```
/// use console_rbac::PermissionCode;
///
/// let code = PermissionCode::parse("post:read").unwrap();
/// assert_eq!(code.resource, "post");
/// assert_eq!(code.action, "read");
/// assert_eq!(code.to_string(), "post:read");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionCode {
    /// Resource name.
    pub resource: String,
    /// Action name.
    pub action: String,
}

impl PermissionCode {
    /// Create a permission code.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Parse from `resource:action`.
    ///
    /// Splits on the first colon, so action names may themselves contain
    /// colons. Both halves must be non-empty.
    pub fn parse(s: &str) -> RbacResult<Self> {
        match s.split_once(':') {
            Some((resource, action)) if !resource.is_empty() && !action.is_empty() => {
                Ok(Self::new(resource, action))
            }
            _ => Err(RbacError::InvalidPermissionCode(s.to_string())),
        }
    }
}

impl std::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl std::str::FromStr for PermissionCode {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_permission_code_parsing() {
        let code = PermissionCode::parse("user:ban").unwrap();
        assert_eq!(code.resource, "user");
        assert_eq!(code.action, "ban");

        let code = PermissionCode::parse("report:export:csv").unwrap();
        assert_eq!(code.resource, "report");
        assert_eq!(code.action, "export:csv");

        assert!(PermissionCode::parse("user").is_err());
        assert!(PermissionCode::parse(":read").is_err());
        assert!(PermissionCode::parse("user:").is_err());
    }

    #[test]
    fn test_permission_code_display() {
        let code = PermissionCode::new("menu", "update");
        assert_eq!(code.to_string(), "menu:update");
        assert_eq!("menu:update".parse::<PermissionCode>().unwrap(), code);
    }

    #[test]
    fn test_role_record_builder() {
        let role = RoleRecord::new("r1", "owner", RoleScope::Organization)
            .grant("member", "create")
            .grant("member", "delete")
            .system()
            .active(false);

        assert_eq!(role.name, "ORGANIZATION:owner");
        assert_eq!(role.bare_name(), "owner");
        assert_eq!(role.scope, "ORGANIZATION");
        assert_eq!(role.role_scope(), Some(RoleScope::Organization));
        assert!(role.is_system);
        assert!(!role.is_active);
        assert_eq!(role.permissions.len(), 2);
    }

    #[test]
    fn test_unknown_role_scope() {
        let mut role = RoleRecord::new("r1", "ghost", RoleScope::Global);
        role.scope = "BOTH".to_string();
        assert_eq!(role.role_scope(), None);

        role.scope = "global".to_string();
        assert_eq!(role.role_scope(), None);
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut grant = RolePermissionRecord::new("order", "refund");
        assert!(grant.is_valid_at(now));

        grant.valid_from = Some(now + Duration::hours(1));
        assert!(!grant.is_valid_at(now));

        grant.valid_from = Some(now - Duration::hours(2));
        grant.valid_until = Some(now - Duration::hours(1));
        assert!(!grant.is_valid_at(now));

        grant.valid_until = Some(now + Duration::hours(1));
        assert!(grant.is_valid_at(now));
    }

    #[test]
    fn test_resource_action_names() {
        let resource = ResourceRecord::new("r", "question", ResourceScope::Global)
            .with_action("a1", "create")
            .with_action("a2", "import");
        assert_eq!(resource.action_names(), vec!["create", "import"]);
    }
}
