//! # Scopes
//!
//! Scopes decide where resources and roles apply. A resource is visible
//! system-wide, per organization, or in both contexts. A role belongs to
//! exactly one of the two contexts, and its stored name carries that context
//! as a prefix (`GLOBAL:admin`, `ORGANIZATION:owner`).

use serde::{Deserialize, Serialize};

use crate::error::RbacError;

/// Scope of a resource.
///
/// # Example
///
/// ```
/// use console_rbac::ResourceScope;
///
/// assert!(ResourceScope::Both.includes_global());
/// assert!(ResourceScope::Both.includes_organization());
/// assert!(!ResourceScope::Global.includes_organization());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceScope {
    /// System-wide resource.
    Global,
    /// Per-tenant resource.
    Organization,
    /// Applicable in either context.
    Both,
}

impl ResourceScope {
    /// Get the stored representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceScope::Global => "GLOBAL",
            ResourceScope::Organization => "ORGANIZATION",
            ResourceScope::Both => "BOTH",
        }
    }

    /// Parse scope from its stored representation (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::ResourceScope;
    ///
    /// assert_eq!(ResourceScope::parse("both"), Some(ResourceScope::Both));
    /// assert_eq!(ResourceScope::parse("org"), Some(ResourceScope::Organization));
    /// assert_eq!(ResourceScope::parse("tenant-ish"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GLOBAL" => Some(ResourceScope::Global),
            "ORGANIZATION" | "ORG" => Some(ResourceScope::Organization),
            "BOTH" => Some(ResourceScope::Both),
            _ => None,
        }
    }

    /// Whether resources with this scope belong in the global statement.
    pub fn includes_global(&self) -> bool {
        matches!(self, ResourceScope::Global | ResourceScope::Both)
    }

    /// Whether resources with this scope belong in the organization statement.
    pub fn includes_organization(&self) -> bool {
        matches!(self, ResourceScope::Organization | ResourceScope::Both)
    }
}

impl std::str::FromStr for ResourceScope {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RbacError::InvalidScope(s.to_string()))
    }
}

impl std::fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of a role.
///
/// Unlike resources, a role is never `BOTH`: it is registered against exactly
/// one access-control engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleScope {
    /// System-wide role (admin plugin).
    Global,
    /// Per-tenant role (organization plugin).
    Organization,
}

impl RoleScope {
    /// Prefix for globally scoped role names.
    pub const GLOBAL_PREFIX: &'static str = "GLOBAL:";
    /// Prefix for organization scoped role names.
    pub const ORGANIZATION_PREFIX: &'static str = "ORGANIZATION:";

    /// Get the stored representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Global => "GLOBAL",
            RoleScope::Organization => "ORGANIZATION",
        }
    }

    /// Match a stored scope column exactly.
    ///
    /// Only `GLOBAL` and `ORGANIZATION` are accepted; any other spelling
    /// marks a row the loader must not register.
    pub fn from_stored(s: &str) -> Option<Self> {
        match s {
            "GLOBAL" => Some(RoleScope::Global),
            "ORGANIZATION" => Some(RoleScope::Organization),
            _ => None,
        }
    }

    /// Parse a scope typed by a user (case-insensitive, accepts `ORG`).
    ///
    /// `BOTH` is a resource-only scope and is rejected here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GLOBAL" => Some(RoleScope::Global),
            "ORGANIZATION" | "ORG" => Some(RoleScope::Organization),
            _ => None,
        }
    }

    /// Name prefix used when storing roles of this scope.
    pub fn prefix(&self) -> &'static str {
        match self {
            RoleScope::Global => Self::GLOBAL_PREFIX,
            RoleScope::Organization => Self::ORGANIZATION_PREFIX,
        }
    }

    /// Build the stored name for a bare role name.
    ///
    /// Names that already carry a scope prefix are returned unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::RoleScope;
    ///
    /// assert_eq!(RoleScope::Global.qualify("admin"), "GLOBAL:admin");
    /// assert_eq!(RoleScope::Organization.qualify("ORGANIZATION:owner"), "ORGANIZATION:owner");
    /// ```
    pub fn qualify(&self, name: &str) -> String {
        if Self::has_prefix(name) {
            name.to_string()
        } else {
            format!("{}{}", self.prefix(), name)
        }
    }

    /// Remove a leading `GLOBAL:` or `ORGANIZATION:` from a stored role name.
    ///
    /// Either prefix is stripped whatever the role's own scope is; names
    /// without a prefix come back unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::RoleScope;
    ///
    /// assert_eq!(RoleScope::strip_prefix("GLOBAL:editor"), "editor");
    /// assert_eq!(RoleScope::strip_prefix("ORGANIZATION:owner"), "owner");
    /// assert_eq!(RoleScope::strip_prefix("member"), "member");
    /// ```
    pub fn strip_prefix(name: &str) -> &str {
        name.strip_prefix(Self::GLOBAL_PREFIX)
            .or_else(|| name.strip_prefix(Self::ORGANIZATION_PREFIX))
            .unwrap_or(name)
    }

    fn has_prefix(name: &str) -> bool {
        name.starts_with(Self::GLOBAL_PREFIX) || name.starts_with(Self::ORGANIZATION_PREFIX)
    }
}

impl std::str::FromStr for RoleScope {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RbacError::InvalidScope(s.to_string()))
    }
}

impl std::fmt::Display for RoleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-scope qualifier attached to a grant.
///
/// Stored alongside role permissions. The loader carries it through but does
/// not enforce it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DataScope {
    /// Every record.
    #[default]
    #[serde(rename = "ALL")]
    All,
    /// Records of the caller's organization.
    #[serde(rename = "ORG")]
    Org,
    /// Records of the caller's department.
    #[serde(rename = "DEPT")]
    Dept,
    /// Records of the caller's department and its sub-departments.
    #[serde(rename = "DEPT_AND_SUB")]
    DeptAndSub,
    /// Only the caller's own records.
    #[serde(rename = "SELF")]
    SelfOnly,
}

impl DataScope {
    /// Get the stored representation of the data scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataScope::All => "ALL",
            DataScope::Org => "ORG",
            DataScope::Dept => "DEPT",
            DataScope::DeptAndSub => "DEPT_AND_SUB",
            DataScope::SelfOnly => "SELF",
        }
    }

    /// Parse data scope from its stored representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Some(DataScope::All),
            "ORG" => Some(DataScope::Org),
            "DEPT" => Some(DataScope::Dept),
            "DEPT_AND_SUB" => Some(DataScope::DeptAndSub),
            "SELF" => Some(DataScope::SelfOnly),
            _ => None,
        }
    }
}
