//! Domain primitives and aggregates.
//!
//! Purpose: define the error taxonomy, the entity model, and the ports that
//! the unit of work and request pipeline depend on. Nothing here knows about
//! HTTP or SQL.
//!
//! Public surface:
//! - Error, ErrorKind, ErrorList, Outcome, Success: expected failures as values.
//! - Fault: exceptional failures.
//! - Entity, EntityKind, AuditFields, SortKey, SortField: persisted aggregate
//!   contract.
//! - User and its catalogued errors.
//! - DomainEvent and its payloads.
//! - TraceId: request correlation.

pub mod entity;
pub mod error;
pub mod events;
pub mod fault;
pub mod messages;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::entity::{AuditFields, AuditStamp, Entity, EntityKind, SortField, SortKey};
pub use self::error::{Error, ErrorKind, ErrorList, ErrorValidationError, Outcome, Success};
pub use self::events::{DomainEvent, UserCreated};
pub use self::fault::Fault;
pub use self::trace_id::TraceId;
pub use self::user::{USER_EMAIL_FIELD, User, errors as user_errors, is_valid_email};
