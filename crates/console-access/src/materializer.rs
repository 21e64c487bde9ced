//! Role materialization
//!
//! Turns stored roles and their grants into access-control roles registered
//! against the global or organization engine, keyed by bare role name.

use console_rbac::{AcRole, AccessControl, PermissionMap, RoleRecord, RoleScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Role metadata for consumers that do not need the access-control object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    /// Role ID.
    pub id: String,
    /// Bare name (scope prefix removed).
    pub name: String,
    /// Human-readable label.
    pub display_name: Option<String>,
    /// Role scope.
    pub scope: RoleScope,
    /// Built-in role.
    pub is_system: bool,
}

/// Roles registered against each engine, plus their summaries.
#[derive(Debug, Clone, Default)]
pub struct MaterializedRoles {
    /// Bare name → role on the global engine.
    pub global_roles: BTreeMap<String, AcRole>,
    /// Bare name → role on the organization engine.
    pub org_roles: BTreeMap<String, AcRole>,
    /// Summaries of every registered role, in input order.
    pub roles: Vec<RoleSummary>,
}

/// Accumulate a role's grants into resource → actions.
///
/// Several grants on one resource add up; a repeated grant is listed once.
pub fn permission_map(role: &RoleRecord) -> PermissionMap {
    let mut map = PermissionMap::new();
    for grant in &role.permissions {
        let actions = map.entry(grant.resource.clone()).or_default();
        if !actions.contains(&grant.action) {
            actions.push(grant.action.clone());
        }
    }
    map
}

/// Register each active role with the engine matching its own scope.
///
/// The branch follows the role's `scope`, not the scopes of the resources it
/// touches. Roles without grants are still registered, with an empty map.
/// Inactive roles are skipped. A role whose stored scope is neither
/// `GLOBAL` nor `ORGANIZATION` is skipped with a warning.
pub fn materialize_roles(
    global_ac: &AccessControl,
    org_ac: &AccessControl,
    records: Vec<RoleRecord>,
) -> MaterializedRoles {
    let mut out = MaterializedRoles::default();

    for record in records {
        if !record.is_active {
            continue;
        }

        let Some(scope) = record.role_scope() else {
            warn!(
                role_id = %record.id,
                role = %record.name,
                scope = %record.scope,
                "Skipping role with unknown scope"
            );
            continue;
        };

        let bare_name = record.bare_name().to_string();
        let permissions = permission_map(&record);

        match scope {
            RoleScope::Global => {
                out.global_roles
                    .insert(bare_name.clone(), global_ac.new_role(permissions));
            }
            RoleScope::Organization => {
                out.org_roles
                    .insert(bare_name.clone(), org_ac.new_role(permissions));
            }
        }

        out.roles.push(RoleSummary {
            id: record.id,
            name: bare_name,
            display_name: record.display_name,
            scope,
            is_system: record.is_system,
        });
    }

    out
}
