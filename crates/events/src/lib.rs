//! Audit trail events and sinks.

pub mod event;
pub mod in_memory_sink;
pub mod sink;

pub use event::{AuditEvent, Outcome};
pub use in_memory_sink::InMemoryAuditSink;
pub use sink::{AuditError, AuditSink, NullAuditSink, TracingAuditSink};
