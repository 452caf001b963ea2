//! Shared wiring for dispatcher-level integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use user_service::application::Dispatcher;
use user_service::application::users::register_user_handlers;
use user_service::domain::EntityKind;
use user_service::domain::ports::{
    RecordPage, RecordWindow, StaticActorProvider, StorageAdapter, StorageError,
    StorageTransaction, StoredRecord,
};
use user_service::outbound::memory::InMemoryStorage;
use user_service::persistence::{RetryPolicy, UnitOfWorkFactory};
use user_service::test_support::{MutableClock, RecordingPublisher};
use uuid::Uuid;

/// Counts every call that reaches the store.
pub struct CountingStorage {
    inner: InMemoryStorage,
    calls: AtomicUsize,
    full_scans: AtomicUsize,
}

impl CountingStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            full_scans: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that loaded every record of a kind.
    pub fn full_scans(&self) -> usize {
        self.full_scans.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageAdapter for CountingStorage {
    async fn load_all(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        self.hit();
        self.full_scans.fetch_add(1, Ordering::SeqCst);
        self.inner.load_all(kind).await
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StorageError> {
        self.hit();
        self.inner.count(kind).await
    }

    async fn load_page(
        &self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        self.hit();
        self.inner.load_page(kind, window).await
    }

    async fn load_one(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        self.hit();
        self.inner.load_one(kind, id).await
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        self.hit();
        self.inner.begin().await
    }
}

/// A dispatcher with every user handler over an in-memory store.
pub struct Service {
    pub storage: InMemoryStorage,
    pub counting: Arc<CountingStorage>,
    pub clock: Arc<MutableClock>,
    pub publisher: Arc<RecordingPublisher>,
    pub dispatcher: Dispatcher,
}

pub const ACTOR: &str = "integration";

impl Service {
    pub fn new() -> Self {
        let storage = InMemoryStorage::with_default_indexes();
        let counting = Arc::new(CountingStorage::new(storage.clone()));
        let clock = Arc::new(MutableClock::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let factory = UnitOfWorkFactory::new(
            counting.clone(),
            clock.clone(),
            Arc::new(StaticActorProvider::new(ACTOR)),
            publisher.clone(),
        )
        .with_retry_policy(RetryPolicy::new(
            3,
            std::time::Duration::ZERO,
            std::time::Duration::ZERO,
        ));
        let mut dispatcher = Dispatcher::new(factory);
        register_user_handlers(&mut dispatcher, clock.clone()).expect("handlers register once");
        Self {
            storage,
            counting,
            clock,
            publisher,
            dispatcher,
        }
    }
}
