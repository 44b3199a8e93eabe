//! In-memory audit sink for tests/dev.

use std::sync::Mutex;

use crate::event::AuditEvent;
use crate::sink::{AuditError, AuditSink};

/// Collects audit events in memory.
///
/// - No IO
/// - Events are kept in emission order
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Operation names of every recorded event, oldest first.
    pub fn operations(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.operation().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut events = self.events.lock().map_err(|_| AuditError::Poisoned)?;
        events.push(event.clone());
        Ok(())
    }
}
