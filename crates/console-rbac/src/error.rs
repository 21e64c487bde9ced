//! Error types for scope and permission parsing.

use thiserror::Error;

/// RBAC parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacError {
    /// Scope string is not one of the known values
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    /// Permission code is not `resource:action`
    #[error("Invalid permission code: {0}")]
    InvalidPermissionCode(String),
}

/// Result type for RBAC parsing.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::InvalidScope(_) => "INVALID_SCOPE",
            RbacError::InvalidPermissionCode(_) => "INVALID_PERMISSION_CODE",
        }
    }
}
