//! # Statements
//!
//! A statement maps each resource name to the action names an
//! access-control engine accepts for it. The catalog produces three of
//! them: the full statement, and the global and organization partitions
//! selected by each resource's scope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ResourceRecord;

/// Resource name → allowed action names.
///
/// Keys are ordered so two statements built from the same catalog compare
/// and serialize identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Statement(BTreeMap<String, Vec<String>>);

impl Statement {
    /// Create an empty statement.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the actions for a resource, replacing any previous entry.
    ///
    /// Repeated action names are dropped, keeping first-seen order.
    pub fn insert<I, S>(&mut self, resource: impl Into<String>, actions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for action in actions {
            let action = action.into();
            if !list.contains(&action) {
                list.push(action);
            }
        }
        self.0.insert(resource.into(), list);
    }

    /// Actions allowed for a resource.
    pub fn actions(&self, resource: &str) -> Option<&[String]> {
        self.0.get(resource).map(Vec::as_slice)
    }

    /// Whether the statement lists this resource.
    pub fn contains_resource(&self, resource: &str) -> bool {
        self.0.contains_key(resource)
    }

    /// Whether the statement allows `action` on `resource`.
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.actions(resource)
            .map_or(false, |actions| actions.iter().any(|a| a == action))
    }

    /// Resource names, in order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(resource, actions)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }
}

impl<K, V, S> FromIterator<(K, V)> for Statement
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut statement = Statement::new();
        for (resource, actions) in iter {
            statement.insert(resource, actions);
        }
        statement
    }
}

/// The full statement and its two scope partitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatementSet {
    /// Every resource.
    pub full: Statement,
    /// Resources scoped `GLOBAL` or `BOTH`.
    pub global: Statement,
    /// Resources scoped `ORGANIZATION` or `BOTH`.
    pub org: Statement,
}

/// Build the full, global and organization statements from a catalog.
///
/// A `BOTH` resource lands in both partitions with the same action list.
/// Each partition owns its own copy, so editing one never touches the other.
///
/// # Example
///
/// ```
/// use console_rbac::{build_statements, ResourceRecord, ResourceScope};
///
/// let catalog = vec![
///     ResourceRecord::new("1", "post", ResourceScope::Both)
///         .with_action("a1", "read")
///         .with_action("a2", "write"),
///     ResourceRecord::new("2", "system", ResourceScope::Global).with_action("a3", "configure"),
/// ];
///
/// let set = build_statements(&catalog);
/// assert_eq!(set.full.len(), 2);
/// assert_eq!(set.global.actions("post"), set.org.actions("post"));
/// assert!(set.global.contains_resource("system"));
/// assert!(!set.org.contains_resource("system"));
/// ```
pub fn build_statements(resources: &[ResourceRecord]) -> StatementSet {
    let mut set = StatementSet::default();

    for resource in resources {
        let actions = resource.action_names();

        set.full.insert(resource.name.clone(), actions.iter().copied());

        if resource.scope.includes_global() {
            set.global.insert(resource.name.clone(), actions.iter().copied());
        }
        if resource.scope.includes_organization() {
            set.org.insert(resource.name.clone(), actions.iter().copied());
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ResourceScope;

    fn catalog() -> Vec<ResourceRecord> {
        vec![
            ResourceRecord::new("r1", "post", ResourceScope::Both)
                .with_action("a1", "read")
                .with_action("a2", "write"),
            ResourceRecord::new("r2", "user", ResourceScope::Global)
                .with_action("a3", "ban")
                .with_action("a4", "impersonate"),
            ResourceRecord::new("r3", "member", ResourceScope::Organization)
                .with_action("a5", "invite"),
        ]
    }

    #[test]
    fn test_empty_catalog() {
        let set = build_statements(&[]);
        assert!(set.full.is_empty());
        assert!(set.global.is_empty());
        assert!(set.org.is_empty());
    }

    #[test]
    fn test_partitioning_by_scope() {
        let set = build_statements(&catalog());

        assert_eq!(set.full.len(), 3);

        assert!(set.global.contains_resource("post"));
        assert!(set.global.contains_resource("user"));
        assert!(!set.global.contains_resource("member"));

        assert!(set.org.contains_resource("post"));
        assert!(set.org.contains_resource("member"));
        assert!(!set.org.contains_resource("user"));
    }

    #[test]
    fn test_both_scope_identical_actions() {
        let set = build_statements(&catalog());
        let expected = vec!["read".to_string(), "write".to_string()];
        assert_eq!(set.global.actions("post"), Some(expected.as_slice()));
        assert_eq!(set.org.actions("post"), Some(expected.as_slice()));
    }

    #[test]
    fn test_partitions_are_independent() {
        let mut set = build_statements(&catalog());
        set.global.insert("post", ["read"]);

        assert_eq!(set.global.actions("post").unwrap().len(), 1);
        assert_eq!(set.org.actions("post").unwrap().len(), 2);
        assert_eq!(set.full.actions("post").unwrap().len(), 2);
    }

    #[test]
    fn test_resource_without_actions() {
        let set = build_statements(&[ResourceRecord::new("r", "audit", ResourceScope::Global)]);
        assert!(set.global.actions("audit").unwrap().is_empty());
        assert!(!set.global.allows("audit", "read"));
    }

    #[test]
    fn test_duplicate_actions_collapsed() {
        let resource = ResourceRecord::new("r", "file", ResourceScope::Global)
            .with_action("a1", "upload")
            .with_action("a2", "upload")
            .with_action("a3", "delete");
        let set = build_statements(&[resource]);
        assert_eq!(
            set.full.actions("file").unwrap(),
            &["upload".to_string(), "delete".to_string()]
        );
    }

    #[test]
    fn test_statement_serializes_as_plain_map() {
        let statement: Statement = [("post", vec!["read"])].into_iter().collect();
        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json, serde_json::json!({ "post": ["read"] }));
    }
}
