//! # Console Access
//!
//! Database-driven access control for the admin console. Resources, actions
//! and roles live in storage; this crate turns them into access-control
//! engines and roles, caches the result for a fixed time, and clears the
//! cache whenever an admin changes the catalog.
//!
//! ## Overview
//!
//! - **Store**: read and write traits over the catalog, with in-memory and
//!   SQLite backends
//! - **Loader**: one full rebuild into an [`AccessControlSnapshot`]
//! - **Cache**: 5 minute TTL, explicit invalidation, one rebuild at a time
//! - **Service**: the store and cache bundled for request handlers
//! - **Admin**: writes that clear the cache and notify [`MutationHook`]s
//! - **Bootstrap**: admin and organization plugin configs for the auth layer
//!
//! ## Flow
//!
//! ```text
//!   AccessControlStore ──list_resources──► build_statements ──► full / global / org engines
//!          │                                                           │
//!          └────list_active_roles──► materialize_roles ◄───────────────┘
//!                                            │
//!                                            ▼
//!                                  AccessControlSnapshot ──► AccessControlCache (TTL)
//!                                                                    ▲
//!                        AccessAdmin write ── clear_access_control_cache
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use console_access::{AccessControlService, MemoryStore};
//! use console_rbac::{Connector, PermissionRequest, ResourceRecord, ResourceScope, RoleRecord, RoleScope};
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new()
//!         .with_resource(ResourceRecord::new("r1", "post", ResourceScope::Both).with_action("a1", "read"))
//!         .with_role(RoleRecord::new("1", "editor", RoleScope::Global).grant("post", "read"));
//!
//!     let service = AccessControlService::new(Arc::new(store));
//!     let snapshot = service.get_access_control().await?;
//!
//!     if let Some(editor) = snapshot.role(RoleScope::Global, "editor") {
//!         let request = PermissionRequest::new().with("post", ["read"]);
//!         assert!(snapshot.global_ac.authorize_role(editor, &request, Connector::And).success);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod admin;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod materializer;
pub mod permissions;
pub mod service;
pub mod store;

pub use admin::AccessAdmin;
pub use bootstrap::{AuthPluginConfig, PluginAccess};
pub use cache::AccessControlCache;
pub use config::{AccessConfig, DEFAULT_CACHE_TTL_SECS};
pub use error::{AccessError, AccessResult};
pub use hooks::{HookRegistry, MutationEvent, MutationHook};
pub use loader::{load_access_control, AccessControlSnapshot};
pub use materializer::{materialize_roles, permission_map, MaterializedRoles, RoleSummary};
pub use permissions::{check_role_permission, get_role_permissions};
pub use service::AccessControlService;
pub use store::{
    AccessControlStore, AccessControlWriteStore, NewResource, NewRole, ResourceUpdate, RoleUpdate,
};

#[cfg(feature = "memory")]
pub use store::MemoryStore;
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
