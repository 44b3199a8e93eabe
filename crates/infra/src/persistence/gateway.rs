use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use revive_auth::UserDirectory;
use revive_inventory::TypeRegistry;

/// Persistence failure.
///
/// Unlike domain errors these are never swallowed: losing a write silently
/// would lose data, so callers surface them as fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed document {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Load/save contract for the two persisted documents.
///
/// - `load` reads both documents; a missing document initialises that side
///   empty (not an error).
/// - `save` overwrites both documents from the given in-memory state.
pub trait PersistenceGateway {
    fn load(&self) -> Result<(TypeRegistry, UserDirectory), StorageError>;

    fn save(&self, types: &TypeRegistry, users: &UserDirectory) -> Result<(), StorageError>;
}

impl<G> PersistenceGateway for Arc<G>
where
    G: PersistenceGateway + ?Sized,
{
    fn load(&self) -> Result<(TypeRegistry, UserDirectory), StorageError> {
        (**self).load()
    }

    fn save(&self, types: &TypeRegistry, users: &UserDirectory) -> Result<(), StorageError> {
        (**self).save(types, users)
    }
}
