//! User directory: registration, admin creation, approval, credential checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use revive_core::{require_non_blank, DomainError, DomainResult, Entity};

use crate::{Registration, Role, UserAccount};

/// Owner of every user account, keyed by username.
///
/// Serialized as a JSON object keyed by username:
/// `{ "<username>": { "address", "phone", "email", "password", "role", "approved" } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    users: BTreeMap<String, UserAccount>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, username: &str) -> Option<&UserAccount> {
        self.users.get(username)
    }

    /// Regular users still waiting for approval, sorted by username.
    pub fn pending_approvals(&self) -> impl Iterator<Item = &UserAccount> {
        self.users
            .values()
            .filter(|u| u.role == Role::User && !u.approved)
    }

    pub fn has_admin(&self) -> bool {
        self.users.values().any(|u| u.role == Role::Admin)
    }

    /// Self-registration: role `user`, awaiting approval.
    pub fn register(&mut self, registration: Registration) -> DomainResult<&UserAccount> {
        self.insert(registration, Role::User)
    }

    /// Admin creation: role `admin`, approved immediately.
    pub fn add_admin(&mut self, registration: Registration) -> DomainResult<&UserAccount> {
        self.insert(registration, Role::Admin)
    }

    fn insert(&mut self, registration: Registration, role: Role) -> DomainResult<&UserAccount> {
        require_non_blank("username", &registration.username)?;

        let account = UserAccount::from_registration(registration, role);
        if self.users.contains_key(account.id()) {
            return Err(DomainError::duplicate_user(account.id().as_str()));
        }

        tracing::debug!(username = account.username(), role = %role, "user account created");
        let key = account.id().clone();
        Ok(&*self.users.entry(key).or_insert(account))
    }

    /// Approve a user.
    ///
    /// Returns `true` when the flag changed; approving an already approved
    /// user or an admin is a no-op.
    pub fn approve(&mut self, username: &str) -> DomainResult<bool> {
        let account = self
            .users
            .get_mut(username)
            .ok_or_else(|| DomainError::unknown_user(username))?;

        if account.approved || account.role == Role::Admin {
            return Ok(false);
        }

        account.approved = true;
        tracing::debug!(username, "user approved");
        Ok(true)
    }

    /// Look up `username` and check `password`.
    ///
    /// Unknown users and wrong passwords fail with distinct errors; approval
    /// is not checked here.
    pub fn verify_credentials(&self, username: &str, password: &str) -> DomainResult<&UserAccount> {
        let account = self
            .users
            .get(username)
            .ok_or_else(|| DomainError::unknown_user(username))?;

        if !account.password_matches(password) {
            return Err(DomainError::WrongPassword);
        }
        Ok(account)
    }
}

impl Serialize for UserDirectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.users.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UserDirectory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut users = BTreeMap::<String, UserAccount>::deserialize(deserializer)?;
        for (username, account) in users.iter_mut() {
            account.username = username.clone();
        }
        Ok(Self { users })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, password: &str) -> Registration {
        Registration::new(username, "1 Main St", "555-0100", "x@example.com", password)
    }

    #[test]
    fn register_creates_unapproved_user() {
        let mut dir = UserDirectory::new();
        let account = dir.register(registration("alice", "pw")).unwrap();

        assert_eq!(account.username(), "alice");
        assert_eq!(account.role, Role::User);
        assert!(!account.approved);
    }

    #[test]
    fn register_duplicate_fails() {
        let mut dir = UserDirectory::new();
        dir.register(registration("alice", "pw")).unwrap();

        let err = dir.register(registration("alice", "other")).unwrap_err();
        assert_eq!(err, DomainError::DuplicateUser("alice".to_string()));
        assert!(dir.get("alice").unwrap().password_matches("pw"));

        let err = dir.add_admin(registration("alice", "other")).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateUser(_)));
        assert_eq!(dir.get("alice").unwrap().role, Role::User);
    }

    #[test]
    fn register_blank_username_fails() {
        let mut dir = UserDirectory::new();
        let err = dir.register(registration(" ", "pw")).unwrap_err();
        assert!(matches!(err, DomainError::EmptyRequiredField(_)));
        assert!(dir.is_empty());
    }

    #[test]
    fn add_admin_is_approved() {
        let mut dir = UserDirectory::new();
        assert!(!dir.has_admin());

        let admin = dir.add_admin(registration("root", "toor")).unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.approved);
        assert!(dir.has_admin());
    }

    #[test]
    fn approve_is_idempotent() {
        let mut dir = UserDirectory::new();
        dir.register(registration("alice", "pw")).unwrap();

        assert!(dir.approve("alice").unwrap());
        assert!(dir.get("alice").unwrap().approved);
        assert!(!dir.approve("alice").unwrap());
        assert!(dir.get("alice").unwrap().approved);
    }

    #[test]
    fn approve_admin_is_noop() {
        let mut dir = UserDirectory::new();
        dir.add_admin(registration("root", "toor")).unwrap();
        assert!(!dir.approve("root").unwrap());
    }

    #[test]
    fn approve_unknown_user_fails() {
        let mut dir = UserDirectory::new();
        assert_eq!(
            dir.approve("ghost").unwrap_err(),
            DomainError::UnknownUser("ghost".to_string())
        );
    }

    #[test]
    fn verify_credentials_distinguishes_failures() {
        let mut dir = UserDirectory::new();
        dir.register(registration("alice", "pw")).unwrap();

        assert!(matches!(
            dir.verify_credentials("bob", "pw"),
            Err(DomainError::UnknownUser(_))
        ));
        assert!(matches!(
            dir.verify_credentials("alice", "nope"),
            Err(DomainError::WrongPassword)
        ));
        assert_eq!(dir.verify_credentials("alice", "pw").unwrap().username(), "alice");
    }

    #[test]
    fn pending_approvals_lists_only_unapproved_users() {
        let mut dir = UserDirectory::new();
        dir.add_admin(registration("root", "toor")).unwrap();
        dir.register(registration("carol", "pw")).unwrap();
        dir.register(registration("bob", "pw")).unwrap();
        dir.register(registration("dave", "pw")).unwrap();
        dir.approve("dave").unwrap();

        let pending: Vec<&str> = dir.pending_approvals().map(UserAccount::username).collect();
        assert_eq!(pending, vec!["bob", "carol"]);
    }

    #[test]
    fn document_round_trip_restores_usernames() {
        let mut dir = UserDirectory::new();
        dir.add_admin(registration("root", "toor")).unwrap();
        dir.register(registration("alice", "pw")).unwrap();

        let json = serde_json::to_string(&dir).unwrap();
        let restored: UserDirectory = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, dir);
        assert_eq!(restored.get("alice").unwrap().username(), "alice");
    }
}
