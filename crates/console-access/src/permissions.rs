//! Per-role permission queries
//!
//! These read storage directly and bypass the snapshot cache, so they see
//! grant changes immediately.

use console_rbac::{PermissionCode, RoleScope};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::AccessResult;
use crate::store::AccessControlStore;

/// List the `resource:action` codes granted to a role.
///
/// `role_name` may be bare or already prefixed; it is qualified with
/// `scope` before lookup. A missing or inactive role yields an empty list,
/// as does a role whose own scope differs from `scope`.
/// Codes are sorted and listed once each.
pub async fn get_role_permissions(
    store: &dyn AccessControlStore,
    role_name: &str,
    scope: RoleScope,
) -> AccessResult<Vec<String>> {
    let stored_name = scope.qualify(role_name);

    let Some(role) = store.find_role(&stored_name).await? else {
        debug!(role = %stored_name, "Role not found");
        return Ok(Vec::new());
    };
    if !role.is_active {
        debug!(role = %stored_name, "Role inactive, no permissions");
        return Ok(Vec::new());
    }
    if role.role_scope() != Some(scope) {
        debug!(
            role = %stored_name,
            requested = %scope,
            stored = %role.scope,
            "Role scope does not match request, no permissions"
        );
        return Ok(Vec::new());
    }

    let codes: BTreeSet<String> = role
        .permissions
        .iter()
        .map(|grant| grant.code().to_string())
        .collect();
    Ok(codes.into_iter().collect())
}

/// Check whether a role holds one permission code.
///
/// The code is validated first; a malformed code is an error rather than
/// a denial.
pub async fn check_role_permission(
    store: &dyn AccessControlStore,
    role_name: &str,
    code: &str,
    scope: RoleScope,
) -> AccessResult<bool> {
    let wanted = PermissionCode::parse(code)?.to_string();
    let granted = get_role_permissions(store, role_name, scope).await?;
    Ok(granted.binary_search(&wanted).is_ok())
}
