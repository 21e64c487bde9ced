//! # Console RBAC (Role-Based Access Control)
//!
//! This crate provides the storage-independent half of the admin console's
//! dynamic access control: the catalog model, scope handling, statements and
//! the access-control engine that roles are registered against.
//!
//! ## Overview
//!
//! The console-rbac crate handles:
//! - **Resources**: Named domains (`user`, `post`, `menu`) with a scope
//! - **Actions**: Operations allowed on a resource (`read`, `ban`)
//! - **Roles**: Named bundles of grants, scoped to GLOBAL or ORGANIZATION
//! - **Statements**: Resource → actions maps, partitioned by scope
//! - **Access Control**: Engines that turn permission maps into roles
//!
//! ## Architecture
//!
//! ```text
//! ResourceRecord[] ──build_statements──► StatementSet { full, global, org }
//!                                            │
//!                                            ▼
//!                               AccessControl (one per statement)
//!                                            │ new_role(permission map)
//!                                            ▼
//!                                          AcRole ──authorize──► AuthorizeResponse
//! ```
//!
//! ## Scopes
//!
//! | Resource scope | Global statement | Organization statement |
//! |----------------|------------------|------------------------|
//! | `GLOBAL`       | yes              | no                     |
//! | `ORGANIZATION` | no               | yes                    |
//! | `BOTH`         | yes              | yes                    |
//!
//! Roles are stored with their scope as a name prefix (`GLOBAL:admin`,
//! `ORGANIZATION:owner`). Engines and consumers only see the bare name.
//!
//! ## Usage
//!
//! ```rust
//! use console_rbac::{build_statements, AccessControl, Connector, PermissionRequest};
//! use console_rbac::{ResourceRecord, ResourceScope};
//!
//! let catalog = vec![ResourceRecord::new("r1", "post", ResourceScope::Both)
//!     .with_action("a1", "read")
//!     .with_action("a2", "write")];
//!
//! let statements = build_statements(&catalog);
//! let global_ac = AccessControl::new(statements.global.clone());
//!
//! let mut grants = console_rbac::PermissionMap::new();
//! grants.insert("post".to_string(), vec!["read".to_string()]);
//! let editor = global_ac.new_role(grants);
//!
//! let request = PermissionRequest::new().with("post", ["read"]);
//! assert!(global_ac.authorize_role(&editor, &request, Connector::And).success);
//! ```

pub mod access_control;
pub mod error;
pub mod model;
pub mod scope;
pub mod statement;

// Re-export main types for convenience
pub use access_control::{
    AcRole, AccessControl, AuthorizeResponse, Connector, PermissionMap, PermissionRequest,
};
pub use error::{RbacError, RbacResult};
pub use model::{ActionRecord, PermissionCode, ResourceRecord, RolePermissionRecord, RoleRecord};
pub use scope::{DataScope, ResourceScope, RoleScope};
pub use statement::{build_statements, Statement, StatementSet};
