//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a local, recoverable outcome of a single attempted
/// operation. Infrastructure failures (IO, encoding) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An item type with this name is already defined.
    #[error("item type '{0}' already exists")]
    DuplicateType(String),

    /// No item type with this name is defined.
    #[error("unknown item type '{0}'")]
    UnknownType(String),

    /// A required field (item name, type name, username) was blank.
    #[error("required field '{0}' cannot be empty")]
    EmptyRequiredField(String),

    /// A user with this username already exists.
    #[error("user '{0}' already exists")]
    DuplicateUser(String),

    /// No user with this username exists.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The password did not match the stored credentials.
    #[error("wrong password")]
    WrongPassword,

    /// The user exists but has not been approved by an administrator yet.
    #[error("user '{0}' is awaiting approval")]
    NotApproved(String),
}

impl DomainError {
    pub fn duplicate_type(name: impl Into<String>) -> Self {
        Self::DuplicateType(name.into())
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType(name.into())
    }

    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::EmptyRequiredField(field.into())
    }

    pub fn duplicate_user(username: impl Into<String>) -> Self {
        Self::DuplicateUser(username.into())
    }

    pub fn unknown_user(username: impl Into<String>) -> Self {
        Self::UnknownUser(username.into())
    }

    pub fn not_approved(username: impl Into<String>) -> Self {
        Self::NotApproved(username.into())
    }

    /// Stable, machine-readable kind used in audit event details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateType(_) => "duplicate_type",
            Self::UnknownType(_) => "unknown_type",
            Self::EmptyRequiredField(_) => "empty_required_field",
            Self::DuplicateUser(_) => "duplicate_user",
            Self::UnknownUser(_) => "unknown_user",
            Self::WrongPassword => "wrong_password",
            Self::NotApproved(_) => "not_approved",
        }
    }
}

/// Reject a value that is blank after trimming.
pub fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::empty_field(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            require_non_blank("name", "   "),
            Err(DomainError::EmptyRequiredField("name".to_string()))
        );
        assert!(require_non_blank("name", "Bread").is_ok());
    }

    #[test]
    fn kinds_are_distinct_for_credential_failures() {
        assert_ne!(
            DomainError::unknown_user("alice").kind(),
            DomainError::WrongPassword.kind()
        );
    }
}
