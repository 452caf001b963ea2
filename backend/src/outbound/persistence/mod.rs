//! PostgreSQL storage adapter using Diesel ORM.
//!
//! Entities are stored as JSONB documents in a single `entity_records`
//! table. Connections come from a `bb8` pool through `diesel-async`; each
//! unit-of-work transaction owns one connection for its lifetime.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay inside
//! this module. Database errors are mapped to
//! [`StorageError`](crate::domain::ports::StorageError) so retry and conflict
//! handling work the same as with the in-memory store.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use user_service::outbound::persistence::{DbPool, PoolConfig, PostgresStorage};
//!
//! let config = PoolConfig {
//!     database_url: "postgres://localhost/users".into(),
//!     max_size: 10,
//!     min_idle: 2,
//!     checkout_timeout: Duration::from_secs(30),
//! };
//! let pool = DbPool::connect(&config).await?;
//! let storage = PostgresStorage::new(pool);
//! ```

mod error_mapping;
mod models;
mod pool;
mod postgres_storage;
mod schema;

pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
pub use postgres_storage::PostgresStorage;
