//! Login state machine.
//!
//! ```text
//! LoggedOut ──login──▶ Authenticating ──ok──▶ AdminSession | UserSession
//!     ▲                      │                        │
//!     └──────── rejected ────┘◀─────── logout ────────┘
//! ```
//!
//! One session at a time, scoped to the process; there is no expiry.

use revive_core::{DomainError, DomainResult};

use crate::{Principal, Role, UserDirectory};

/// Current state of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    LoggedOut,
    /// Credentials are being checked for this username.
    Authenticating { username: String },
    AdminSession(Principal),
    UserSession(Principal),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    state: SessionState,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The logged-in principal, if a session is active.
    pub fn principal(&self) -> Option<&Principal> {
        match &self.state {
            SessionState::AdminSession(p) | SessionState::UserSession(p) => Some(p),
            SessionState::LoggedOut | SessionState::Authenticating { .. } => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.principal().map(|p| p.role)
    }

    pub fn is_logged_in(&self) -> bool {
        self.principal().is_some()
    }

    /// Authenticate against `directory`.
    ///
    /// Any active session ends first. On failure the session stays logged out:
    /// - unknown username → `UnknownUser`
    /// - wrong password → `WrongPassword`
    /// - unapproved regular user → `NotApproved`
    pub fn login(
        &mut self,
        directory: &UserDirectory,
        username: &str,
        password: &str,
    ) -> DomainResult<&Principal> {
        self.logout();
        self.state = SessionState::Authenticating {
            username: username.to_string(),
        };

        match Self::authenticate(directory, username, password) {
            Ok(principal) => {
                tracing::debug!(username, role = %principal.role, "session started");
                self.state = match principal.role {
                    Role::Admin => SessionState::AdminSession(principal),
                    Role::User => SessionState::UserSession(principal),
                };
                self.principal()
                    .ok_or_else(|| DomainError::unknown_user(username))
            }
            Err(err) => {
                self.state = SessionState::LoggedOut;
                Err(err)
            }
        }
    }

    fn authenticate(
        directory: &UserDirectory,
        username: &str,
        password: &str,
    ) -> DomainResult<Principal> {
        let account = directory.verify_credentials(username, password)?;
        if !account.can_login() {
            return Err(DomainError::not_approved(username));
        }
        Ok(account.principal())
    }

    /// End the current session. Returns the principal that was logged in.
    pub fn logout(&mut self) -> Option<Principal> {
        match std::mem::take(&mut self.state) {
            SessionState::AdminSession(p) | SessionState::UserSession(p) => Some(p),
            SessionState::LoggedOut | SessionState::Authenticating { .. } => None,
        }
    }
}
