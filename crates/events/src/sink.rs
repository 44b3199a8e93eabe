//! Audit sink abstraction (mechanics only).
//!
//! The domain and service layers never print or write audit records
//! themselves. They hand every [`AuditEvent`] to an injected [`AuditSink`],
//! so callers decide where the trail goes:
//!
//! - [`TracingAuditSink`]: structured `tracing` events (default)
//! - [`NullAuditSink`]: auditing disabled
//! - [`InMemoryAuditSink`](crate::InMemoryAuditSink): captured for tests
//! - file-backed sinks live in the infra crate
//!
//! ## Error Handling
//!
//! `record()` can fail (file IO, poisoned lock). Failures are surfaced to the
//! caller, which logs them; a failed audit write never aborts the operation
//! being audited.

use std::sync::Arc;

use thiserror::Error;

use crate::event::{AuditEvent, Outcome};

#[derive(Debug, Error)]
pub enum AuditError {
    /// Internal lock poisoning.
    #[error("audit sink lock poisoned")]
    Poisoned,

    #[error("audit sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for audit events.
pub trait AuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        (**self).record(event)
    }
}

impl<S> AuditSink for Box<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        (**self).record(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Emits audit events as structured `tracing` records on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let details = event.details().to_string();
        match event.outcome() {
            Outcome::Success => tracing::info!(
                target: "audit",
                event_id = %event.event_id(),
                operation = event.operation(),
                actor = event.actor().unwrap_or("-"),
                details = %details,
                "operation succeeded"
            ),
            Outcome::Failure { kind, message } => tracing::warn!(
                target: "audit",
                event_id = %event.event_id(),
                operation = event.operation(),
                actor = event.actor().unwrap_or("-"),
                details = %details,
                error_kind = kind.as_str(),
                error = message.as_str(),
                "operation failed"
            ),
        }
        Ok(())
    }
}
