//! Domain event publisher that records events in the structured log.

use async_trait::async_trait;
use tracing::info;

use crate::domain::DomainEvent;
use crate::domain::ports::{DomainEventPublisher, EventPublishError};

/// Logs each event at `info`. There is no downstream consumer yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl DomainEventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), EventPublishError> {
        match event {
            DomainEvent::UserCreated(created) => info!(
                event = event.name(),
                event_id = %created.event_id,
                user_id = %created.user_id,
                occurred_on = %created.occurred_on.to_rfc3339(),
                "user created"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::UserCreated;

    #[tokio::test]
    async fn publishing_always_succeeds() {
        let event = DomainEvent::UserCreated(UserCreated {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            user_id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            name: "Ada".to_owned(),
        });
        assert!(TracingEventPublisher.publish(&event).await.is_ok());
    }
}
