//! Error types for access-control loading and administration
//!
//! This module defines the errors surfaced by storage backends, the
//! snapshot loader and the admin write paths.

use thiserror::Error;

/// Access-control error types.
///
/// Loader failures are fail-fast: a storage error during a rebuild reaches
/// the caller unchanged and nothing is cached.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Storage backend failed (query, connection, decoding)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// ID or name that was looked up.
        id: String,
    },

    /// A unique name is already taken
    #[error("{entity} already exists: {name}")]
    Conflict {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting name.
        name: String,
    },

    /// System roles cannot be deleted
    #[error("System role cannot be deleted: {0}")]
    SystemRole(String),

    /// Stored or requested scope is not valid here
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Permission code could not be parsed
    #[error("Invalid permission code: {0}")]
    InvalidPermissionCode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for access-control operations.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AccessError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a name clash.
    pub fn conflict(entity: &'static str, name: impl Into<String>) -> Self {
        AccessError::Conflict {
            entity,
            name: name.into(),
        }
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AccessError::Storage(_) | AccessError::Config(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::NotFound { .. } => 404,
            AccessError::Conflict { .. } => 409,
            AccessError::SystemRole(_) => 403,
            AccessError::InvalidScope(_) | AccessError::InvalidPermissionCode(_) => 400,
            AccessError::Storage(_) | AccessError::Config(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::Storage(_) => "STORAGE_ERROR",
            AccessError::NotFound { .. } => "NOT_FOUND",
            AccessError::Conflict { .. } => "CONFLICT",
            AccessError::SystemRole(_) => "SYSTEM_ROLE",
            AccessError::InvalidScope(_) => "INVALID_SCOPE",
            AccessError::InvalidPermissionCode(_) => "INVALID_PERMISSION_CODE",
            AccessError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<console_rbac::RbacError> for AccessError {
    fn from(err: console_rbac::RbacError) -> Self {
        match err {
            console_rbac::RbacError::InvalidScope(s) => AccessError::InvalidScope(s),
            console_rbac::RbacError::InvalidPermissionCode(s) => AccessError::InvalidPermissionCode(s),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for AccessError {
    fn from(err: sqlx::Error) -> Self {
        AccessError::Storage(err.to_string())
    }
}
