//! State shared by a unit of work and the repositories it hands out.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{
    RecordPage, RecordWindow, StorageAdapter, StorageError, StorageTransaction, StoredRecord,
};
use crate::domain::{DomainEvent, Entity, EntityKind};

use super::change_tracker::{ChangeTracker, EntryState};

#[derive(Default)]
pub(crate) struct SessionState {
    pub(crate) tracker: ChangeTracker,
    pub(crate) transaction: Option<Box<dyn StorageTransaction>>,
    /// Events from changes applied inside the open transaction; published
    /// only once it commits.
    pub(crate) deferred_events: Vec<DomainEvent>,
}

pub(crate) struct Session {
    pub(crate) storage: Arc<dyn StorageAdapter>,
    pub(crate) state: Mutex<SessionState>,
}

impl Session {
    pub(crate) fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub(crate) async fn load_all(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        let mut state = self.state.lock().await;
        match state.transaction.as_mut() {
            Some(transaction) => transaction.load_all(kind).await,
            None => self.storage.load_all(kind).await,
        }
    }

    pub(crate) async fn count(&self, kind: EntityKind) -> Result<u64, StorageError> {
        let mut state = self.state.lock().await;
        match state.transaction.as_mut() {
            Some(transaction) => transaction.count(kind).await,
            None => self.storage.count(kind).await,
        }
    }

    pub(crate) async fn load_page(
        &self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        let mut state = self.state.lock().await;
        match state.transaction.as_mut() {
            Some(transaction) => transaction.load_page(kind, window).await,
            None => self.storage.load_page(kind, window).await,
        }
    }

    pub(crate) async fn load_one(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let mut state = self.state.lock().await;
        match state.transaction.as_mut() {
            Some(transaction) => transaction.load_one(kind, id).await,
            None => self.storage.load_one(kind, id).await,
        }
    }

    pub(crate) async fn track<E: Entity>(&self, entry_state: EntryState, entity: E) {
        self.state.lock().await.tracker.track(entry_state, entity);
    }

    pub(crate) async fn track_all<E: Entity>(
        &self,
        entry_state: EntryState,
        entities: impl IntoIterator<Item = E> + Send,
    ) {
        let mut state = self.state.lock().await;
        for entity in entities {
            state.tracker.track(entry_state, entity);
        }
    }

    pub(crate) async fn in_transaction(&self) -> bool {
        self.state.lock().await.transaction.is_some()
    }

    pub(crate) async fn install_transaction(&self, transaction: Box<dyn StorageTransaction>) {
        self.state.lock().await.transaction = Some(transaction);
    }

    pub(crate) async fn take_transaction(&self) -> Option<Box<dyn StorageTransaction>> {
        self.state.lock().await.transaction.take()
    }

    pub(crate) async fn take_deferred_events(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.state.lock().await.deferred_events)
    }

    pub(crate) async fn clear_staged(&self) {
        self.state.lock().await.tracker.clear();
    }

    /// Drop staged changes and deferred events after a failed transaction.
    pub(crate) async fn discard(&self) {
        let mut state = self.state.lock().await;
        state.tracker.clear();
        state.deferred_events.clear();
    }
}
