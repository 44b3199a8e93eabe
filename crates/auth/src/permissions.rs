use serde::{Deserialize, Serialize};

/// Operation gated by role.
///
/// `as_str` doubles as the stable operation name in the audit trail
/// (e.g. "inventory.item.add").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    DefineType,
    RedefineAttributes,
    ApproveUser,
    AddAdmin,
    AddItem,
    SearchItems,
    ListTypes,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::DefineType => "inventory.type.define",
            Permission::RedefineAttributes => "inventory.type.redefine",
            Permission::ApproveUser => "auth.user.approve",
            Permission::AddAdmin => "auth.admin.add",
            Permission::AddItem => "inventory.item.add",
            Permission::SearchItems => "inventory.item.search",
            Permission::ListTypes => "inventory.type.list",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
