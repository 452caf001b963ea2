//! Port for publishing domain events after a successful commit.
use async_trait::async_trait;

use crate::domain::DomainEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event publishers.
    pub enum EventPublishError {
        /// The sink refused or failed to accept the event.
        Rejected { message: String } => "event publication rejected: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainEventPublisher: Send + Sync {
    /// Deliver one event. Called once per event, in raise order, after the
    /// changes that raised it are committed.
    async fn publish(&self, event: &DomainEvent) -> Result<(), EventPublishError>;
}
