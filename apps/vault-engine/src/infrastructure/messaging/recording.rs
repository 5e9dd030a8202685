//! Publisher that keeps every event in memory.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::vault::VaultEvent;

/// In-memory event log.
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: RwLock<Vec<VaultEvent>>,
}

impl RecordingEventPublisher {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far.
    #[must_use]
    pub fn events(&self) -> Vec<VaultEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Type names of all events published so far.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(VaultEvent::event_type)
            .collect()
    }
}

#[async_trait]
impl EventPublisherPort for RecordingEventPublisher {
    async fn publish(&self, events: Vec<VaultEvent>) -> Result<(), EventPublishError> {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
        Ok(())
    }
}
