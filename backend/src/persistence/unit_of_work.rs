//! Unit of work: one change tracker and at most one open transaction per
//! request.
//!
//! A [`UnitOfWork`] is created per request by a [`UnitOfWorkFactory`]. It
//! hands out one [`Repository`] per entity type, stamps audit fields and
//! persists staged changes on [`UnitOfWork::save_changes`], and runs
//! operations atomically through [`UnitOfWork::execute_transaction`].
//! Domain events raised by saved entities are published only after the
//! changes that raised them commit.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError};

use mockable::Clock;
use tracing::{debug, error, info, warn};

use crate::cancellation::CancellationToken;
use crate::domain::ports::{ActorProvider, DomainEventPublisher, StorageAdapter, StorageError};
use crate::domain::{AuditStamp, DomainEvent, Entity, EntityKind, Fault};

use super::repository::Repository;
use super::retry::RetryPolicy;
use super::session::Session;

/// Collaborators shared by every unit of work.
#[derive(Clone)]
pub struct UnitOfWorkFactory {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    actor: Arc<dyn ActorProvider>,
    publisher: Arc<dyn DomainEventPublisher>,
    retry: RetryPolicy,
}

impl UnitOfWorkFactory {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        actor: Arc<dyn ActorProvider>,
        publisher: Arc<dyn DomainEventPublisher>,
    ) -> Self {
        Self {
            storage,
            clock,
            actor,
            publisher,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the transient-failure retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Start a fresh unit of work with an empty tracker.
    pub fn create(&self) -> UnitOfWork {
        UnitOfWork {
            session: Arc::new(Session::new(Arc::clone(&self.storage))),
            repositories: std::sync::Mutex::new(HashMap::new()),
            services: self.clone(),
        }
    }
}

/// Per-request change tracker and transaction boundary.
pub struct UnitOfWork {
    session: Arc<Session>,
    repositories: std::sync::Mutex<HashMap<EntityKind, Arc<dyn Any + Send + Sync>>>,
    services: UnitOfWorkFactory,
}

impl UnitOfWork {
    /// Repository for `E`. Repeated calls return the same instance.
    pub fn repository<E: Entity>(&self) -> Arc<Repository<E>> {
        let mut cache = self
            .repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&E::KIND) {
            match Arc::clone(cached).downcast::<Repository<E>>() {
                Ok(repository) => return repository,
                Err(_) => error!(kind = %E::KIND, "cached repository has an unexpected type"),
            }
        }
        let repository = Arc::new(Repository::<E>::new(Arc::clone(&self.session)));
        let erased: Arc<dyn Any + Send + Sync> = repository.clone();
        cache.insert(E::KIND, erased);
        repository
    }

    /// Persist every staged change and return the number of affected records.
    ///
    /// Inside [`Self::execute_transaction`] the changes are applied to the
    /// open transaction and become durable when it commits. Otherwise they
    /// are applied and committed atomically here. Nothing staged means no
    /// storage call and a count of zero.
    ///
    /// # Errors
    /// Returns the adapter's [`StorageError`]; a rejected write is
    /// [`StorageError::Conflict`]. Staged changes are kept on failure.
    pub async fn save_changes(&self) -> Result<u64, StorageError> {
        let mut guard = self.session.state.lock().await;
        let state = &mut *guard;
        if state.tracker.is_empty() {
            return Ok(0);
        }

        let stamp = AuditStamp {
            actor: self.services.actor.current_actor(),
            at: self.services.clock.utc(),
        };
        state.tracker.stamp_audit(&stamp);
        let changes = state.tracker.to_changes()?;
        debug!(entries = state.tracker.len(), actor = %stamp.actor, "saving staged changes");

        if let Some(transaction) = state.transaction.as_mut() {
            let affected = transaction.apply(&changes).await?;
            let events = state.tracker.drain_events();
            state.deferred_events.extend(events);
            state.tracker.clear();
            return Ok(affected);
        }

        let mut transaction = self.session.storage.begin().await?;
        let affected = match transaction.apply(&changes).await {
            Ok(affected) => affected,
            Err(err) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    warn!(error = %rollback_err, "rollback after rejected save failed");
                }
                return Err(err);
            }
        };
        transaction.commit().await?;
        let events = state.tracker.drain_events();
        state.tracker.clear();
        drop(guard);

        self.publish(events).await;
        Ok(affected)
    }

    /// Forget every change staged since the last successful save.
    ///
    /// Changes already applied to an open transaction are unaffected.
    pub async fn discard_changes(&self) {
        self.session.clear_staged().await;
    }

    /// Run `operation` atomically, retrying on transient storage failures.
    ///
    /// Each attempt opens a transaction, runs `operation`, saves staged
    /// changes, and commits. Any fault or cancellation rolls the transaction
    /// back, discards staged changes, and is returned unchanged. The commit
    /// happens whenever `operation` returns `Ok`, including an `Ok` holding
    /// an error outcome.
    ///
    /// Transient faults ([`Fault::is_transient`]) restart the whole attempt,
    /// so `operation` must be safe to run more than once.
    pub async fn execute_transaction<T, F, Fut>(
        &self,
        cancellation: &CancellationToken,
        mut operation: F,
    ) -> Result<T, Fault>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, Fault>> + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.attempt_transaction(cancellation, &mut operation).await {
                Err(fault) if fault.is_transient() && self.services.retry.should_retry(attempt) => {
                    let delay = self.services.retry.delay_after(attempt);
                    warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %fault,
                        "transient storage failure; retrying transaction"
                    );
                    cancellation.guard(tokio::time::sleep(delay)).await?;
                }
                result => return result,
            }
        }
    }

    /// [`Self::execute_transaction`] for operations whose value is not needed.
    pub async fn run_in_transaction<T, F, Fut>(
        &self,
        cancellation: &CancellationToken,
        operation: F,
    ) -> Result<(), Fault>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, Fault>> + Send,
    {
        self.execute_transaction(cancellation, operation)
            .await
            .map(drop)
    }

    async fn attempt_transaction<T, F, Fut>(
        &self,
        cancellation: &CancellationToken,
        operation: &mut F,
    ) -> Result<T, Fault>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, Fault>> + Send,
    {
        cancellation.check()?;
        if self.session.in_transaction().await {
            return Err(
                StorageError::query("a transaction is already open for this unit of work").into(),
            );
        }
        let transaction = self.session.storage.begin().await?;
        self.session.install_transaction(transaction).await;

        let result: Result<T, Fault> = async {
            let value = cancellation.guard(operation()).await??;
            cancellation.guard(self.save_changes()).await??;
            cancellation.check()?;
            Ok(value)
        }
        .await;

        let Some(transaction) = self.session.take_transaction().await else {
            self.session.discard().await;
            return Err(StorageError::query("transaction closed before commit").into());
        };

        match result {
            Ok(value) => match transaction.commit().await {
                Ok(()) => {
                    let events = self.session.take_deferred_events().await;
                    self.publish(events).await;
                    Ok(value)
                }
                Err(err) => {
                    self.session.discard().await;
                    Err(err.into())
                }
            },
            Err(fault) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    error!(error = %rollback_err, "transaction rollback failed");
                }
                self.session.discard().await;
                info!(error = %fault, "transaction rolled back");
                Err(fault)
            }
        }
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        if events.is_empty() {
            return;
        }
        debug!(count = events.len(), "publishing domain events");
        for event in events {
            if let Err(err) = self.services.publisher.publish(&event).await {
                warn!(
                    event = event.name(),
                    event_id = %event.event_id(),
                    error = %err,
                    error_kind = err.variant_name(),
                    "domain event publication failed"
                );
            }
        }
    }
}
