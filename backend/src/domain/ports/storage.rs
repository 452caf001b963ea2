//! Port abstraction for the record store behind the unit of work.
//!
//! Adapters persist entities as JSON documents keyed by
//! ([`EntityKind`], id). The unit of work stages typed changes, serialises
//! them into [`StagedChange`]s, and hands them to a [`StorageTransaction`].
//! Reads issued while a transaction is open go through that transaction so
//! they observe its own writes.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{EntityKind, Error, SortField, messages};

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum StorageError {
        /// The store could not be reached or dropped the connection.
        Connection { message: String } => "storage connection failed: {message}",
        /// The store rejected a write because of a constraint.
        Conflict { message: String } => "storage rejected the write: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } => "storage query failed: {message}",
        /// A record could not be converted to or from its document form.
        Serialization { message: String } => "record serialisation failed: {message}",
    }
}

impl StorageError {
    /// Whether retrying the whole operation may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Describe a rejected write as a `Failure` error for callers.
    pub fn to_error(&self) -> Error {
        Error::failure(messages::STORAGE_WRITE_REJECTED, self.to_string())
    }
}

/// A stored entity document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Entity identity.
    pub id: Uuid,
    /// Serialised entity body.
    pub body: Value,
}

/// A single mutation against one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    /// Create a record; fails if the id already exists.
    Insert(StoredRecord),
    /// Replace the body of an existing record.
    Update(StoredRecord),
    /// Remove an existing record.
    Delete(Uuid),
}

impl RecordChange {
    /// Identity of the record this change touches.
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Insert(record) | Self::Update(record) => record.id,
            Self::Delete(id) => *id,
        }
    }
}

/// A change tagged with the kind of entity it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    /// Entity kind the change applies to.
    pub kind: EntityKind,
    /// The mutation itself.
    pub change: RecordChange,
}

/// An ordered slice of the records of one kind.
///
/// Records order by `sort`, then by id, with the whole ordering reversed when
/// `descending` is set. Records without a value for the sort field come
/// first in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordWindow {
    pub sort: SortField,
    pub descending: bool,
    pub skip: u64,
    pub take: u64,
}

/// A window of records together with the number of records of that kind,
/// both read from the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<StoredRecord>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Load every committed record of `kind`, ordered by id.
    async fn load_all(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError>;

    /// Number of committed records of `kind`.
    async fn count(&self, kind: EntityKind) -> Result<u64, StorageError>;

    /// One ordered window of committed records of `kind` and their total.
    async fn load_page(
        &self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError>;

    /// Load one committed record.
    async fn load_one(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError>;

    /// Open a transaction.
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError>;
}

/// An open transaction. Dropping it without committing discards its writes.
#[async_trait]
pub trait StorageTransaction: Send {
    /// Load every record of `kind` visible inside this transaction.
    async fn load_all(&mut self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError>;

    async fn count(&mut self, kind: EntityKind) -> Result<u64, StorageError>;

    async fn load_page(
        &mut self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError>;

    /// Load one record visible inside this transaction.
    async fn load_one(
        &mut self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError>;

    /// Apply `changes` in order and return the number of affected records.
    ///
    /// Either every change applies or none does.
    async fn apply(&mut self, changes: &[StagedChange]) -> Result<u64, StorageError>;

    /// Make the applied changes durable.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard the applied changes.
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorKind;

    #[rstest]
    #[case(StorageError::connection("reset"), true)]
    #[case(StorageError::conflict("duplicate"), false)]
    #[case(StorageError::query("syntax"), false)]
    #[case(StorageError::serialization("bad json"), false)]
    fn only_connection_failures_are_transient(#[case] error: StorageError, #[case] expected: bool) {
        assert_eq!(error.is_transient(), expected);
    }

    #[rstest]
    fn rejected_write_maps_to_failure_kind() {
        let error = StorageError::conflict("duplicate key value").to_error();
        assert_eq!(error.kind(), ErrorKind::Failure);
        assert_eq!(error.code(), "Storage.WriteRejected");
        assert!(error.description().contains("duplicate key value"));
    }

    #[rstest]
    fn change_reports_record_id() {
        let id = Uuid::new_v4();
        assert_eq!(RecordChange::Delete(id).id(), id);
        let insert = RecordChange::Insert(StoredRecord {
            id,
            body: Value::Null,
        });
        assert_eq!(insert.id(), id);
    }
}
