//! User accounts.
//!
//! Credentials are stored and compared as plain text. This mirrors the
//! persisted document format; hashing would change that format.

use serde::{Deserialize, Serialize};

use revive_core::Entity;

use crate::{Principal, Role};

/// Input for creating an account (self-registration or admin creation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            address: address.into(),
            phone: phone.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A registered account.
///
/// # Invariants
/// - `username` is unique within a directory and never changes.
/// - Admin accounts are approved from creation.
/// - `approved` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Key in the users document, restored on load.
    #[serde(skip)]
    pub(crate) username: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub(crate) password: String,
    pub role: Role,
    pub approved: bool,
}

impl UserAccount {
    pub(crate) fn from_registration(reg: Registration, role: Role) -> Self {
        Self {
            username: reg.username.trim().to_string(),
            address: reg.address,
            phone: reg.phone,
            email: reg.email,
            password: reg.password,
            role,
            approved: role == Role::Admin,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    /// Whether this account may start a session.
    pub fn can_login(&self) -> bool {
        self.role == Role::Admin || self.approved
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.username.clone(), self.role)
    }
}

impl Entity for UserAccount {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.username
    }
}
