//! Common shape of persisted entities.
//!
//! Every entity has a UUID identity, a block of [`AuditFields`] maintained by
//! the unit of work, and a list of pending domain events that are drained
//! when its changes are saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::domain::DomainEvent;

/// Discriminates entity tables in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// [`User`](crate::domain::User) records.
    User,
}

impl EntityKind {
    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who created and last modified an entity, and when.
///
/// Fields are written by the unit of work on save; handlers never set them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    /// Actor that inserted the entity.
    pub created_by: String,
    /// Insert time.
    pub created_at: DateTime<Utc>,
    /// Actor of the most recent update.
    pub updated_by: Option<String>,
    /// Time of the most recent update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Actor and time applied to audit fields during one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    /// Acting identity.
    pub actor: String,
    /// Save time.
    pub at: DateTime<Utc>,
}

impl AuditFields {
    /// Record creation. Update fields stay untouched.
    pub fn stamp_created(&mut self, stamp: &AuditStamp) {
        self.created_by.clone_from(&stamp.actor);
        self.created_at = stamp.at;
    }

    /// Record an update. Creation fields stay untouched.
    pub fn stamp_updated(&mut self, stamp: &AuditStamp) {
        self.updated_by = Some(stamp.actor.clone());
        self.updated_at = Some(stamp.at);
    }
}

/// Comparable value extracted from an entity for ordering.
///
/// Variants compare in declaration order first, so an absent optional value
/// sorts before any present one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// The field has no value on this entity.
    Absent,
    /// Case-folded text.
    Text(String),
    /// Timestamp.
    Time(DateTime<Utc>),
    /// Identity.
    Id(Uuid),
}

impl SortKey {
    /// Text key compared case-insensitively.
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }
}

impl From<Option<DateTime<Utc>>> for SortKey {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Absent, Self::Time)
    }
}

/// Document field an entity can be ordered by in storage.
///
/// Text fields order case-insensitively and timestamp fields chronologically,
/// matching the [`SortKey`] the entity reports for the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Record identity.
    Id,
    /// String field with this document name.
    Text(&'static str),
    /// RFC 3339 timestamp field with this document name.
    Time(&'static str),
}

impl SortField {
    /// Key of the document `body` of record `id` under this field.
    pub fn key_of(self, id: Uuid, body: &serde_json::Value) -> SortKey {
        match self {
            Self::Id => SortKey::Id(id),
            Self::Text(name) => body
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map_or(SortKey::Absent, SortKey::text),
            Self::Time(name) => body
                .get(name)
                .and_then(serde_json::Value::as_str)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map_or(SortKey::Absent, |at| SortKey::Time(at.with_timezone(&Utc))),
        }
    }
}

/// A persisted aggregate managed through repositories.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Table this entity lives in.
    const KIND: EntityKind;

    /// Identity.
    fn id(&self) -> Uuid;

    /// Audit metadata.
    fn audit(&self) -> &AuditFields;

    /// Mutable audit metadata for stamping on save.
    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Sort key for `field`, matched case-insensitively.
    ///
    /// Returns `None` for fields the entity does not recognise; callers fall
    /// back to identity ordering. Identity itself is handled by callers.
    fn sort_key(&self, field: &str) -> Option<SortKey>;

    /// Storage-side counterpart of [`Self::sort_key`] for `field`.
    fn sort_field(field: &str) -> Option<SortField>;

    /// Remove and return events raised since the last save.
    fn take_events(&mut self) -> Vec<DomainEvent> {
        Vec::new()
    }
}
