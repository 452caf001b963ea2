//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI arguments, `USER_SERVICE_*` environment variables,
//! and the configuration file, in OrthoConfig's usual precedence.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ports::StaticActorProvider;
use crate::outbound::persistence::PoolConfig;
use crate::persistence::RetryPolicy;

/// Configuration for the user service core.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_SERVICE")]
pub struct ServiceSettings {
    /// PostgreSQL connection string. Without one the in-memory store is used.
    pub database_url: Option<String>,
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    #[ortho_config(default = 2)]
    pub pool_min_idle: u32,
    #[ortho_config(default = 30)]
    pub connection_timeout_secs: u64,
    /// Retries after the first failed attempt of a transaction.
    #[ortho_config(default = 5)]
    pub retry_max_attempts: u32,
    #[ortho_config(default = 30)]
    pub retry_max_delay_secs: u64,
    /// Actor stamped into audit fields.
    pub system_actor: Option<String>,
}

impl ServiceSettings {
    pub fn system_actor(&self) -> &str {
        self.system_actor
            .as_deref()
            .unwrap_or(StaticActorProvider::SYSTEM)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            RetryPolicy::DEFAULT_BASE_DELAY,
            Duration::from_secs(self.retry_max_delay_secs),
        )
    }

    /// Pool settings when a database is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_deref().map(|url| PoolConfig {
            database_url: url.to_owned(),
            max_size: self.pool_max_size,
            min_idle: self.pool_min_idle,
            checkout_timeout: Duration::from_secs(self.connection_timeout_secs),
        })
    }
}
