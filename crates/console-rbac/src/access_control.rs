//! # Access Control Engine
//!
//! An [`AccessControl`] wraps one statement and hands out [`AcRole`]s: a role
//! is a permission map (resource → granted actions) checked against
//! [`PermissionRequest`]s.
//!
//! ```text
//! Statement ──► AccessControl ──new_role(map)──► AcRole ──authorize(req)──► AuthorizeResponse
//! ```
//!
//! `new_role` never fails and does not check the map against the statement;
//! the statement is consulted when a request is authorized through
//! [`AccessControl::authorize_role`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::PermissionCode;
use crate::statement::Statement;

/// Resource name → action names, as granted to a role or requested by a caller.
pub type PermissionMap = BTreeMap<String, Vec<String>>;

/// How multiple requested actions on one resource combine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    /// Every requested action must be granted.
    #[default]
    And,
    /// At least one requested action must be granted.
    Or,
}

/// A permission check: resource → actions the caller wants.
///
/// # Example
///
/// ```
/// use console_rbac::PermissionRequest;
///
/// let request = PermissionRequest::new().with("post", ["read", "write"]);
/// assert_eq!(request.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PermissionRequest(PermissionMap);

impl PermissionRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self(PermissionMap::new())
    }

    /// Add actions for a resource (builder style).
    pub fn with<I, S>(mut self, resource: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(resource.into())
            .or_default()
            .extend(actions.into_iter().map(Into::into));
        self
    }

    /// Request for a single permission code.
    pub fn from_code(code: &PermissionCode) -> Self {
        Self::new().with(code.resource.clone(), [code.action.clone()])
    }

    /// Iterate over `(resource, actions)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of resources requested.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizeResponse {
    /// Whether the request is granted.
    pub success: bool,
    /// Reason for a denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthorizeResponse {
    fn granted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn denied(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// A role produced by an access-control engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcRole {
    statements: PermissionMap,
}

impl AcRole {
    /// The role's permission map.
    pub fn statements(&self) -> &PermissionMap {
        &self.statements
    }

    /// Actions granted on a resource.
    pub fn actions(&self, resource: &str) -> Option<&[String]> {
        self.statements.get(resource).map(Vec::as_slice)
    }

    /// Whether the role grants nothing.
    pub fn is_empty(&self) -> bool {
        self.statements.values().all(Vec::is_empty)
    }

    /// Check a request against this role's grants.
    ///
    /// Every requested resource must be granted. Within a resource, `And`
    /// needs every requested action and `Or` needs at least one. An empty
    /// request is granted.
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::{AccessControl, Connector, PermissionMap, PermissionRequest, Statement};
    ///
    /// let ac = AccessControl::new(Statement::new());
    /// let mut grants = PermissionMap::new();
    /// grants.insert("post".to_string(), vec!["read".to_string()]);
    /// let role = ac.new_role(grants);
    ///
    /// let read = PermissionRequest::new().with("post", ["read"]);
    /// assert!(role.authorize(&read, Connector::And).success);
    ///
    /// let read_write = PermissionRequest::new().with("post", ["read", "write"]);
    /// assert!(!role.authorize(&read_write, Connector::And).success);
    /// assert!(role.authorize(&read_write, Connector::Or).success);
    /// ```
    pub fn authorize(&self, request: &PermissionRequest, connector: Connector) -> AuthorizeResponse {
        for (resource, requested) in request.iter() {
            let Some(granted) = self.statements.get(resource) else {
                return AuthorizeResponse::denied(format!(
                    "You are not allowed to access resource: {}",
                    resource
                ));
            };

            let has = |action: &String| granted.contains(action);
            let ok = match connector {
                Connector::And => requested.iter().all(has),
                Connector::Or => requested.iter().any(has),
            };

            if !ok {
                return AuthorizeResponse::denied(format!(
                    "Unauthorized to access resource \"{}\"",
                    resource
                ));
            }
        }

        AuthorizeResponse::granted()
    }
}

/// An access-control engine bound to one statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControl {
    statement: Statement,
}

impl AccessControl {
    /// Create an engine for a statement.
    pub fn new(statement: Statement) -> Self {
        Self { statement }
    }

    /// The statement this engine was built from.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Create a role from a permission map.
    pub fn new_role(&self, statements: PermissionMap) -> AcRole {
        AcRole { statements }
    }

    /// Authorize a request for a role, rejecting resources or actions the
    /// statement does not define.
    pub fn authorize_role(
        &self,
        role: &AcRole,
        request: &PermissionRequest,
        connector: Connector,
    ) -> AuthorizeResponse {
        for (resource, actions) in request.iter() {
            if !self.statement.contains_resource(resource) {
                return AuthorizeResponse::denied(format!("Unknown resource: {}", resource));
            }
            if connector == Connector::And {
                if let Some(action) = actions.iter().find(|a| !self.statement.allows(resource, a)) {
                    return AuthorizeResponse::denied(format!(
                        "Unknown action \"{}\" on resource \"{}\"",
                        action, resource
                    ));
                }
            }
        }
        role.authorize(request, connector)
    }
}
