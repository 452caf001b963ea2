//! Generic repositories and the unit of work that coordinates them.
//!
//! Handlers obtain repositories from the request's [`UnitOfWork`], stage
//! changes through them, and persist with [`UnitOfWork::save_changes`] or
//! inside [`UnitOfWork::execute_transaction`]. Storage itself sits behind
//! the [`StorageAdapter`](crate::domain::ports::StorageAdapter) port.

mod change_tracker;
mod repository;
mod retry;
mod session;
mod unit_of_work;

pub use repository::{CountedWindow, Filter, Repository};
pub use retry::RetryPolicy;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
