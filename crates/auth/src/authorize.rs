use thiserror::Error;

use crate::{AuthSession, Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("forbidden: role '{role}' cannot perform '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

impl AuthzError {
    /// Stable, machine-readable kind used in audit event details.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::NotLoggedIn => "not_logged_in",
            AuthzError::Forbidden { .. } => "forbidden",
        }
    }
}

/// Authorize the active session for `required`.
///
/// - No IO
/// - No panics
/// - Pure role check; business rules stay in the domain operations
pub fn authorize(session: &AuthSession, required: Permission) -> Result<&Principal, AuthzError> {
    let principal = session.principal().ok_or(AuthzError::NotLoggedIn)?;

    if principal.role.grants(required) {
        Ok(principal)
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            permission: required,
        })
    }
}
