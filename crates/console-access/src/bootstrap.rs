//! Authentication plugin bootstrap
//!
//! The authentication layer takes two plugin configurations: the admin
//! plugin uses global roles and the organization plugin uses org roles.
//! [`AuthPluginConfig::from_snapshot`] derives both from one snapshot.

use console_rbac::{AcRole, AccessControl};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AccessError, AccessResult};
use crate::loader::AccessControlSnapshot;

/// Engine and roles handed to one authentication plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginAccess {
    /// Engine the roles were registered against.
    pub ac: AccessControl,
    /// Bare role name → role.
    pub roles: BTreeMap<String, AcRole>,
}

impl PluginAccess {
    /// Role names, sorted.
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }
}

/// Access configuration for the admin and organization plugins.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPluginConfig {
    /// Global engine and global roles.
    pub admin: PluginAccess,
    /// Organization engine and org roles.
    pub organization: PluginAccess,
}

impl AuthPluginConfig {
    /// Split a snapshot into the two plugin configurations.
    pub fn from_snapshot(snapshot: &AccessControlSnapshot) -> Self {
        Self {
            admin: PluginAccess {
                ac: snapshot.global_ac.clone(),
                roles: snapshot.global_roles.clone(),
            },
            organization: PluginAccess {
                ac: snapshot.org_ac.clone(),
                roles: snapshot.org_roles.clone(),
            },
        }
    }

    /// Global role names, sorted.
    pub fn admin_role_names(&self) -> Vec<&str> {
        self.admin.role_names()
    }

    /// Organization role names, sorted.
    pub fn organization_role_names(&self) -> Vec<&str> {
        self.organization.role_names()
    }

    /// Pretty JSON of both configurations, for diagnostics.
    pub fn to_json(&self) -> AccessResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AccessError::Config(e.to_string()))
    }
}
