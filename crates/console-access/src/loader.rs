//! Snapshot loader
//!
//! One rebuild reads the catalog and the active roles, builds the three
//! statements, wraps each in an engine and registers the roles. Nothing is
//! cached here; see [`crate::cache`] for that.

use console_rbac::{build_statements, AcRole, AccessControl, RoleScope, Statement};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::AccessResult;
use crate::materializer::{materialize_roles, RoleSummary};
use crate::store::AccessControlStore;

/// Derived access-control configuration from one rebuild.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlSnapshot {
    /// Engine over the full statement, for unscoped checks.
    #[serde(skip)]
    pub ac: AccessControl,
    /// Engine for GLOBAL roles.
    #[serde(skip)]
    pub global_ac: AccessControl,
    /// Engine for ORGANIZATION roles.
    #[serde(skip)]
    pub org_ac: AccessControl,
    /// Every resource → its actions.
    pub statement: Statement,
    /// GLOBAL and BOTH resources.
    pub global_statement: Statement,
    /// ORGANIZATION and BOTH resources.
    pub org_statement: Statement,
    /// Bare name → global role.
    pub global_roles: BTreeMap<String, AcRole>,
    /// Bare name → organization role.
    pub org_roles: BTreeMap<String, AcRole>,
    /// Summaries of every registered role.
    pub roles: Vec<RoleSummary>,
}

impl AccessControlSnapshot {
    /// Look up a role by bare name on the engine of the given scope.
    pub fn role(&self, scope: RoleScope, name: &str) -> Option<&AcRole> {
        match scope {
            RoleScope::Global => self.global_roles.get(name),
            RoleScope::Organization => self.org_roles.get(name),
        }
    }
}

/// Rebuild the access-control snapshot from storage.
///
/// Storage errors propagate unchanged; no partial snapshot is produced.
pub async fn load_access_control(store: &dyn AccessControlStore) -> AccessResult<AccessControlSnapshot> {
    let started = Instant::now();

    let resources = store.list_resources().await?;
    let statements = build_statements(&resources);
    debug!(
        resources = statements.full.len(),
        global = statements.global.len(),
        org = statements.org.len(),
        "Built access-control statements"
    );

    let ac = AccessControl::new(statements.full.clone());
    let global_ac = AccessControl::new(statements.global.clone());
    let org_ac = AccessControl::new(statements.org.clone());

    let records = store.list_active_roles().await?;
    let materialized = materialize_roles(&global_ac, &org_ac, records);

    info!(
        resources = statements.full.len(),
        global_roles = materialized.global_roles.len(),
        org_roles = materialized.org_roles.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Access control loaded"
    );

    Ok(AccessControlSnapshot {
        ac,
        global_ac,
        org_ac,
        statement: statements.full,
        global_statement: statements.global,
        org_statement: statements.org,
        global_roles: materialized.global_roles,
        org_roles: materialized.org_roles,
        roles: materialized.roles,
    })
}
