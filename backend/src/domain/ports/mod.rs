//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod actor;
mod event_publisher;
mod storage;

#[cfg(test)]
pub use actor::MockActorProvider;
pub use actor::{ActorProvider, StaticActorProvider};
#[cfg(test)]
pub use event_publisher::MockDomainEventPublisher;
pub use event_publisher::{DomainEventPublisher, EventPublishError};
#[cfg(test)]
pub use storage::MockStorageAdapter;
pub use storage::{
    RecordChange, RecordPage, RecordWindow, StagedChange, StorageAdapter, StorageError,
    StorageTransaction, StoredRecord,
};
