//! File-backed gateway: two pretty-printed JSON documents in a data directory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use revive_auth::UserDirectory;
use revive_inventory::TypeRegistry;

use super::gateway::{PersistenceGateway, StorageError};

pub const ITEMS_FILE: &str = "items.json";
pub const USERS_FILE: &str = "users.json";

/// Stores item types in `items.json` and accounts in `users.json`.
///
/// Each document is written to a temp file in the same directory and then
/// renamed over the target, so a crash mid-write leaves the previous
/// document intact.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    items_path: PathBuf,
    users_path: PathBuf,
}

impl JsonFileGateway {
    /// Gateway over `<data_dir>/items.json` and `<data_dir>/users.json`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self::with_paths(dir.join(ITEMS_FILE), dir.join(USERS_FILE))
    }

    pub fn with_paths(items_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            items_path: items_path.into(),
            users_path: users_path.into(),
        }
    }

    pub fn items_path(&self) -> &Path {
        &self.items_path
    }

    pub fn users_path(&self) -> &Path {
        &self.users_path
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn load(&self) -> Result<(TypeRegistry, UserDirectory), StorageError> {
        let types = read_document(&self.items_path)?;
        let users = read_document(&self.users_path)?;
        tracing::info!(
            items_path = %self.items_path.display(),
            users_path = %self.users_path.display(),
            "data loaded"
        );
        Ok((types, users))
    }

    fn save(&self, types: &TypeRegistry, users: &UserDirectory) -> Result<(), StorageError> {
        // Encode both before touching disk so an encoding failure writes nothing.
        let items_doc = serde_json::to_string_pretty(types)?;
        let users_doc = serde_json::to_string_pretty(users)?;

        write_atomic(&self.items_path, &items_doc)?;
        write_atomic(&self.users_path, &users_doc)?;
        tracing::debug!(
            types = types.len(),
            users = users.len(),
            "data saved"
        );
        Ok(())
    }
}

fn read_document<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no data file found, starting empty");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let write_err = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.write_all(b"\n").map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
