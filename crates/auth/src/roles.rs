use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role of a user account; decides which operations a session can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::DefineType,
                Permission::RedefineAttributes,
                Permission::ApproveUser,
                Permission::AddAdmin,
                Permission::ListTypes,
            ],
            Role::User => &[
                Permission::AddItem,
                Permission::SearchItems,
                Permission::ListTypes,
            ],
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_and_user_operation_sets_are_disjoint_except_listing() {
        for permission in Role::Admin.permissions() {
            if *permission != Permission::ListTypes {
                assert!(!Role::User.grants(*permission), "{permission}");
            }
        }
        assert!(Role::User.grants(Permission::AddItem));
        assert!(!Role::Admin.grants(Permission::AddItem));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let role: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(role, Role::User);
    }
}
