//! Persistence gateway: load/save of the item and user documents.

mod gateway;
pub mod in_memory;
pub mod json_file;

pub use gateway::{PersistenceGateway, StorageError};
pub use in_memory::InMemoryGateway;
pub use json_file::JsonFileGateway;
