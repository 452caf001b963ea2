//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process record store for tests and local runs
//! - **persistence**: PostgreSQL record store using Diesel ORM
//! - **events**: domain event publisher writing to the structured log
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod events;
pub mod memory;
pub mod persistence;
