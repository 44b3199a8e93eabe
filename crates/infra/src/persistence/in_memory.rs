use std::path::PathBuf;
use std::sync::RwLock;

use serde::de::DeserializeOwned;

use revive_auth::UserDirectory;
use revive_inventory::TypeRegistry;

use super::gateway::{PersistenceGateway, StorageError};

#[derive(Debug, Default)]
struct Documents {
    items: Option<String>,
    users: Option<String>,
    saves: usize,
}

/// In-memory gateway holding the serialized documents.
///
/// Intended for tests/dev. Documents go through the same JSON encoding as
/// the file gateway, so round-trip behaviour matches.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    documents: RwLock<Documents>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.documents.read().map(|d| d.saves).unwrap_or(0)
    }

    /// Raw items document as last saved.
    pub fn items_document(&self) -> Option<String> {
        self.documents.read().ok().and_then(|d| d.items.clone())
    }

    /// Raw users document as last saved.
    pub fn users_document(&self) -> Option<String> {
        self.documents.read().ok().and_then(|d| d.users.clone())
    }
}

impl PersistenceGateway for InMemoryGateway {
    fn load(&self) -> Result<(TypeRegistry, UserDirectory), StorageError> {
        let docs = self.documents.read().map_err(|_| StorageError::Poisoned)?;

        let types = match &docs.items {
            Some(raw) => decode(raw, "items")?,
            None => TypeRegistry::default(),
        };
        let users = match &docs.users {
            Some(raw) => decode(raw, "users")?,
            None => UserDirectory::default(),
        };
        Ok((types, users))
    }

    fn save(&self, types: &TypeRegistry, users: &UserDirectory) -> Result<(), StorageError> {
        let items = serde_json::to_string(types)?;
        let users = serde_json::to_string(users)?;

        let mut docs = self.documents.write().map_err(|_| StorageError::Poisoned)?;
        docs.items = Some(items);
        docs.users = Some(users);
        docs.saves += 1;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(raw: &str, document: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Decode {
        path: PathBuf::from(format!("memory:{document}")),
        source,
    })
}
