//! Audit events: one structured record per attempted operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Result of the operation an audit event describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure {
        /// Stable error kind (e.g. "duplicate_type").
        kind: String,
        /// Human-readable error message.
        message: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// An audit event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - emitted for **every** attempted operation, successful or not
/// - designed to be **append-only** (sinks never rewrite history)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    event_id: Uuid,
    occurred_at: DateTime<Utc>,

    /// Stable operation name (e.g. "inventory.item.add").
    operation: String,

    /// Username of the session that attempted the operation, if any.
    actor: Option<String>,

    /// Operation-specific payload (type names, usernames, keywords, ...).
    details: JsonValue,

    outcome: Outcome,
}

impl AuditEvent {
    pub fn new(
        operation: impl Into<String>,
        actor: Option<String>,
        details: JsonValue,
        outcome: Outcome,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            occurred_at: Utc::now(),
            operation: operation.into(),
            actor,
            details,
            outcome,
        }
    }

    pub fn success(operation: impl Into<String>, actor: Option<String>, details: JsonValue) -> Self {
        Self::new(operation, actor, details, Outcome::Success)
    }

    pub fn failure(
        operation: impl Into<String>,
        actor: Option<String>,
        details: JsonValue,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            operation,
            actor,
            details,
            Outcome::Failure {
                kind: kind.into(),
                message: message.into(),
            },
        )
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn details(&self) -> &JsonValue {
        &self.details
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}
