//! Infrastructure layer: file persistence, audit log files, and the
//! application service composing them with the domain crates.

pub mod audit_log;
pub mod persistence;
pub mod service;

pub use audit_log::JsonLinesAuditSink;
pub use persistence::{InMemoryGateway, JsonFileGateway, PersistenceGateway, StorageError};
pub use service::{RegistryService, ServiceError, ServiceResult};
