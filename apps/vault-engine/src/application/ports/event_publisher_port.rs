//! Event Publisher Port (Driven Port)
//!
//! Interface for publishing vault events to external systems.

use async_trait::async_trait;

use crate::domain::vault::VaultEvent;

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// Connection error.
    #[error("Event publish connection error: {message}")]
    ConnectionError { message: String },

    /// Serialization error.
    #[error("Event serialization error: {message}")]
    SerializationError { message: String },

    /// Publishing failed.
    #[error("Event publish failed: {message}")]
    PublishFailed { message: String },
}

/// Port for publishing domain events.
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish vault events.
    async fn publish(&self, events: Vec<VaultEvent>) -> Result<(), EventPublishError>;

    /// Publish a single vault event.
    async fn publish_one(&self, event: VaultEvent) -> Result<(), EventPublishError> {
        self.publish(vec![event]).await
    }
}

/// No-op event publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisherPort for NoOpEventPublisher {
    async fn publish(&self, _events: Vec<VaultEvent>) -> Result<(), EventPublishError> {
        Ok(())
    }
}
