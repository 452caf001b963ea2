//! Staged entity changes awaiting `save_changes`.

use uuid::Uuid;

use crate::domain::ports::{RecordChange, StagedChange, StorageError, StoredRecord};
use crate::domain::{AuditStamp, DomainEvent, Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryState {
    Added,
    Modified,
    Deleted,
}

/// Type-erased view of a tracked entity.
trait TrackedEntity: Send + Sync {
    fn kind(&self) -> EntityKind;
    fn id(&self) -> Uuid;
    fn stamp(&mut self, state: EntryState, stamp: &AuditStamp);
    fn drain_events(&mut self) -> Vec<DomainEvent>;
    fn to_record(&self) -> Result<StoredRecord, StorageError>;
}

impl<E: Entity> TrackedEntity for E {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    fn id(&self) -> Uuid {
        Entity::id(self)
    }

    fn stamp(&mut self, state: EntryState, stamp: &AuditStamp) {
        match state {
            EntryState::Added => self.audit_mut().stamp_created(stamp),
            EntryState::Modified => self.audit_mut().stamp_updated(stamp),
            EntryState::Deleted => {}
        }
    }

    fn drain_events(&mut self) -> Vec<DomainEvent> {
        self.take_events()
    }

    fn to_record(&self) -> Result<StoredRecord, StorageError> {
        let body = serde_json::to_value(self)
            .map_err(|err| StorageError::serialization(err.to_string()))?;
        Ok(StoredRecord {
            id: Entity::id(self),
            body,
        })
    }
}

struct Entry {
    state: EntryState,
    entity: Box<dyn TrackedEntity>,
}

/// Ordered log of pending changes.
#[derive(Default)]
pub(crate) struct ChangeTracker {
    entries: Vec<Entry>,
}

impl ChangeTracker {
    pub(crate) fn track<E: Entity>(&mut self, state: EntryState, entity: E) {
        self.entries.push(Entry {
            state,
            entity: Box::new(entity),
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stamp audit fields: inserts get creation fields, updates get update
    /// fields, deletes are left alone.
    pub(crate) fn stamp_audit(&mut self, stamp: &AuditStamp) {
        for entry in &mut self.entries {
            entry.entity.stamp(entry.state, stamp);
        }
    }

    pub(crate) fn to_changes(&self) -> Result<Vec<StagedChange>, StorageError> {
        self.entries
            .iter()
            .map(|entry| {
                let change = match entry.state {
                    EntryState::Added => RecordChange::Insert(entry.entity.to_record()?),
                    EntryState::Modified => RecordChange::Update(entry.entity.to_record()?),
                    EntryState::Deleted => RecordChange::Delete(entry.entity.id()),
                };
                Ok(StagedChange {
                    kind: entry.entity.kind(),
                    change,
                })
            })
            .collect()
    }

    /// Take every raised event in tracking order.
    pub(crate) fn drain_events(&mut self) -> Vec<DomainEvent> {
        self.entries
            .iter_mut()
            .flat_map(|entry| entry.entity.drain_events())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::User;

    fn stamp() -> AuditStamp {
        AuditStamp {
            actor: "System".to_owned(),
            at: Utc
                .with_ymd_and_hms(2026, 5, 6, 7, 8, 9)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[rstest]
    fn changes_follow_tracking_order() {
        let added = User::with_id(Uuid::new_v4(), "a@example.com", "A");
        let removed = User::with_id(Uuid::new_v4(), "b@example.com", "B");
        let mut tracker = ChangeTracker::default();
        tracker.track(EntryState::Added, added.clone());
        tracker.track(EntryState::Deleted, removed.clone());

        let changes = tracker.to_changes().expect("serialise changes");
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            changes.first().map(|c| &c.change),
            Some(RecordChange::Insert(record)) if record.id == Entity::id(&added)
        ));
        assert!(matches!(
            changes.get(1).map(|c| &c.change),
            Some(RecordChange::Delete(id)) if *id == Entity::id(&removed)
        ));
    }

    #[rstest]
    fn stamping_targets_state() {
        let mut tracker = ChangeTracker::default();
        tracker.track(
            EntryState::Added,
            User::with_id(Uuid::new_v4(), "a@example.com", "A"),
        );
        tracker.track(
            EntryState::Modified,
            User::with_id(Uuid::new_v4(), "b@example.com", "B"),
        );
        tracker.stamp_audit(&stamp());

        let changes = tracker.to_changes().expect("serialise changes");
        let bodies: Vec<_> = changes
            .iter()
            .filter_map(|c| match &c.change {
                RecordChange::Insert(r) | RecordChange::Update(r) => Some(r.body.clone()),
                RecordChange::Delete(_) => None,
            })
            .collect();

        let inserted = bodies.first().expect("insert body");
        assert_eq!(inserted.get("createdBy"), Some(&serde_json::json!("System")));
        assert_eq!(inserted.get("updatedBy"), Some(&serde_json::Value::Null));

        let updated = bodies.get(1).expect("update body");
        assert_eq!(updated.get("updatedBy"), Some(&serde_json::json!("System")));
        assert_eq!(updated.get("createdBy"), Some(&serde_json::json!("")));
    }

    #[rstest]
    fn events_are_drained_once() {
        let mut tracker = ChangeTracker::default();
        tracker.track(
            EntryState::Added,
            User::create("a@example.com", "A", stamp().at),
        );
        assert_eq!(tracker.drain_events().len(), 1);
        assert!(tracker.drain_events().is_empty());
    }
}
