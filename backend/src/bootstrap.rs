//! Wiring of storage, collaborators, and handlers into a dispatcher.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::info;

use crate::application::Dispatcher;
use crate::application::users::register_user_handlers;
use crate::config::ServiceSettings;
use crate::domain::Fault;
use crate::domain::ports::{StaticActorProvider, StorageAdapter};
use crate::outbound::events::TracingEventPublisher;
use crate::outbound::memory::InMemoryStorage;
use crate::outbound::persistence::{DbPool, PoolError, PostgresStorage};
use crate::persistence::UnitOfWorkFactory;

/// Failures while assembling the service.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    #[error("handler registration: {0}")]
    Registration(#[from] Fault),
}

/// Build a dispatcher over `storage` with every user handler registered.
///
/// # Errors
/// Returns [`BootstrapError::Registration`] if a handler is registered twice.
pub fn build_dispatcher_with(
    storage: Arc<dyn StorageAdapter>,
    settings: &ServiceSettings,
    clock: Arc<dyn Clock>,
) -> Result<Dispatcher, BootstrapError> {
    let factory = UnitOfWorkFactory::new(
        storage,
        Arc::clone(&clock),
        Arc::new(StaticActorProvider::new(settings.system_actor())),
        Arc::new(TracingEventPublisher),
    )
    .with_retry_policy(settings.retry_policy());

    let mut dispatcher = Dispatcher::new(factory);
    register_user_handlers(&mut dispatcher, clock)?;
    Ok(dispatcher)
}

/// Build a dispatcher from configuration.
///
/// Uses PostgreSQL when `database_url` is set and the in-memory store
/// otherwise.
///
/// # Errors
/// Returns [`BootstrapError::Pool`] when the database pool cannot be built.
pub async fn build_dispatcher(settings: &ServiceSettings) -> Result<Dispatcher, BootstrapError> {
    let storage: Arc<dyn StorageAdapter> = match settings.pool_config() {
        Some(config) => {
            info!("using PostgreSQL storage");
            Arc::new(PostgresStorage::new(DbPool::connect(&config).await?))
        }
        None => {
            info!("no database configured; using in-memory storage");
            Arc::new(InMemoryStorage::with_default_indexes())
        }
    };
    build_dispatcher_with(storage, settings, Arc::new(DefaultClock))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::application::users::{CreateUser, GetAllUsers};
    use crate::cancellation::CancellationToken;

    fn settings() -> ServiceSettings {
        ServiceSettings {
            database_url: None,
            pool_max_size: 10,
            pool_min_idle: 2,
            connection_timeout_secs: 30,
            retry_max_attempts: 0,
            retry_max_delay_secs: 0,
            system_actor: Some("bootstrap".into()),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn in_memory_dispatcher_handles_user_requests() {
        let dispatcher = build_dispatcher(&settings()).await.expect("dispatcher builds");
        let token = CancellationToken::new();

        let created = dispatcher
            .send(
                CreateUser {
                    email: "ada@example.com".into(),
                    name: "Ada".into(),
                },
                &token,
            )
            .await
            .expect("no fault")
            .expect("user created");
        assert_eq!(created.created_by, "bootstrap");

        let all = dispatcher
            .send(GetAllUsers, &token)
            .await
            .expect("no fault")
            .expect("users listed");
        assert_eq!(all, vec![created]);
    }
}
