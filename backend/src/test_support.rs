//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests
//! or with the `test-support` feature.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

use crate::domain::DomainEvent;
use crate::domain::ports::{DomainEventPublisher, EventPublishError, StaticActorProvider};
use crate::outbound::memory::InMemoryStorage;
use crate::persistence::{RetryPolicy, UnitOfWorkFactory};

/// Timestamp every fixture clock starts at.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("valid fixture timestamp"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Publisher that remembers every event it receives.
#[derive(Default)]
pub struct RecordingPublisher(Mutex<Vec<DomainEvent>>);

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        match self.0.lock() {
            Ok(events) => events.clone(),
            Err(_) => panic!("publisher mutex"),
        }
    }
}

#[async_trait]
impl DomainEventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), EventPublishError> {
        match self.0.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(_) => panic!("publisher mutex"),
        }
        Ok(())
    }
}

/// In-memory collaborators wired into a unit-of-work factory.
pub struct Harness {
    pub storage: InMemoryStorage,
    pub clock: Arc<MutableClock>,
    pub publisher: Arc<RecordingPublisher>,
    pub factory: UnitOfWorkFactory,
}

impl Harness {
    /// Actor stamped into audit fields by [`Harness::new`].
    pub const ACTOR: &'static str = "tester";

    /// Fresh store with the default unique indexes and retries that never
    /// sleep.
    pub fn new() -> Self {
        let storage = InMemoryStorage::with_default_indexes();
        let clock = Arc::new(MutableClock::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let factory = UnitOfWorkFactory::new(
            Arc::new(storage.clone()),
            clock.clone(),
            Arc::new(StaticActorProvider::new(Self::ACTOR)),
            publisher.clone(),
        )
        .with_retry_policy(RetryPolicy::new(
            2,
            std::time::Duration::ZERO,
            std::time::Duration::ZERO,
        ));
        Self {
            storage,
            clock,
            publisher,
            factory,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// One event recorded by [`LogCapture`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Layer that records every event for assertions on log output.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<CapturedEvent>>>);

impl LogCapture {
    /// Install a fresh capture as this thread's default subscriber until the
    /// guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let guard = tracing::subscriber::set_default(Registry::default().with(capture.clone()));
        (capture, guard)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        match self.0.lock() {
            Ok(events) => events.clone(),
            Err(_) => panic!("log capture mutex"),
        }
    }

    /// Events whose message is exactly `message`.
    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }

    /// The only event with `message`.
    ///
    /// # Panics
    /// Panics unless exactly one such event was recorded.
    pub fn single(&self, message: &str) -> CapturedEvent {
        let mut matching = self.with_message(message);
        match (matching.pop(), matching.is_empty()) {
            (Some(event), true) => event,
            _ => panic!("expected exactly one `{message}` event"),
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldRecorder::default();
        event.record(&mut fields);
        let mut fields = fields.0;
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            message: fields.remove("message").unwrap_or_default(),
            fields,
        };
        match self.0.lock() {
            Ok(mut events) => events.push(captured),
            Err(_) => panic!("log capture mutex"),
        }
    }
}

#[derive(Default)]
struct FieldRecorder(HashMap<String, String>);

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}
