//! Publisher that writes events to the log as JSON.

use async_trait::async_trait;

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::domain::vault::VaultEvent;

/// Logs each event at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisherPort for TracingEventPublisher {
    async fn publish(&self, events: Vec<VaultEvent>) -> Result<(), EventPublishError> {
        for event in events {
            let payload =
                serde_json::to_string(&event).map_err(|e| EventPublishError::SerializationError {
                    message: e.to_string(),
                })?;
            tracing::info!(
                event_type = event.event_type(),
                round = event.round(),
                payload = %payload,
                "Vault event"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::AccountId;
    use crate::domain::vault::events::Redeemed;

    #[tokio::test]
    async fn publishes_serializable_events() {
        let publisher = TracingEventPublisher;
        let result = publisher
            .publish(vec![VaultEvent::Redeemed(Redeemed {
                account: AccountId::new("alice"),
                shares: u128::MAX,
                round: 2,
            })])
            .await;
        assert!(result.is_ok());
    }
}
