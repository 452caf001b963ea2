//! In-memory record store.
//!
//! Backs tests and local runs without a database. Writes inside a
//! transaction are buffered and validated against committed data plus the
//! transaction's own earlier writes; commit re-validates under the store lock
//! and swaps the result in atomically. Unique indexes are declared per
//! entity kind and field.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    RecordChange, RecordPage, RecordWindow, StagedChange, StorageAdapter, StorageError,
    StorageTransaction, StoredRecord,
};
use crate::domain::{EntityKind, USER_EMAIL_FIELD};

type Table = BTreeMap<Uuid, Value>;
type Tables = HashMap<EntityKind, Table>;

/// Transaction counters, for assertions in tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Default)]
struct Counters {
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

struct Shared {
    tables: Mutex<Tables>,
    unique_indexes: Vec<(EntityKind, &'static str)>,
    failing_begins: AtomicU32,
    counters: Counters,
}

/// Thread-safe in-memory [`StorageAdapter`]. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryStorage {
    shared: Arc<Shared>,
}

impl InMemoryStorage {
    /// Empty store with the given unique indexes.
    pub fn new(unique_indexes: impl IntoIterator<Item = (EntityKind, &'static str)>) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::new()),
                unique_indexes: unique_indexes.into_iter().collect(),
                failing_begins: AtomicU32::new(0),
                counters: Counters::default(),
            }),
        }
    }

    /// Empty store with the indexes the user model needs.
    pub fn with_default_indexes() -> Self {
        Self::new([(EntityKind::User, USER_EMAIL_FIELD)])
    }

    /// Make the next `count` calls to `begin` fail with a connection error.
    pub fn fail_next_begins(&self, count: u32) {
        self.shared.failing_begins.store(count, Ordering::SeqCst);
    }

    /// Committed records of `kind`, ordered by id.
    pub fn snapshot(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        let tables = self.shared.lock()?;
        Ok(records_of(&tables, kind))
    }

    pub fn stats(&self) -> TransactionStats {
        let counters = &self.shared.counters;
        TransactionStats {
            begun: counters.begun.load(Ordering::SeqCst),
            committed: counters.committed.load(Ordering::SeqCst),
            rolled_back: counters.rolled_back.load(Ordering::SeqCst),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::with_default_indexes()
    }
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::connection("in-memory store lock poisoned"))
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_begins
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl StorageAdapter for InMemoryStorage {
    async fn load_all(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        let tables = self.shared.lock()?;
        Ok(records_of(&tables, kind))
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StorageError> {
        let tables = self.shared.lock()?;
        Ok(count_of(&tables, kind))
    }

    async fn load_page(
        &self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        let tables = self.shared.lock()?;
        Ok(page_of(&tables, kind, window))
    }

    async fn load_one(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let tables = self.shared.lock()?;
        Ok(record_of(&tables, kind, id))
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        if self.shared.take_injected_failure() {
            debug!("injected connection failure on begin");
            return Err(StorageError::connection("simulated connection loss"));
        }
        self.shared.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            pending: Vec::new(),
        }))
    }
}

struct MemoryTransaction {
    shared: Arc<Shared>,
    pending: Vec<StagedChange>,
}

impl MemoryTransaction {
    /// Committed data with this transaction's writes applied.
    fn view(&self) -> Result<Tables, StorageError> {
        let mut tables = self.shared.lock()?.clone();
        apply_changes(&mut tables, &self.pending, &self.shared.unique_indexes)?;
        Ok(tables)
    }
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    async fn load_all(&mut self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        Ok(records_of(&self.view()?, kind))
    }

    async fn count(&mut self, kind: EntityKind) -> Result<u64, StorageError> {
        Ok(count_of(&self.view()?, kind))
    }

    async fn load_page(
        &mut self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        Ok(page_of(&self.view()?, kind, window))
    }

    async fn load_one(
        &mut self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        Ok(record_of(&self.view()?, kind, id))
    }

    async fn apply(&mut self, changes: &[StagedChange]) -> Result<u64, StorageError> {
        let mut tables = self.view()?;
        let affected = apply_changes(&mut tables, changes, &self.shared.unique_indexes)?;
        self.pending.extend_from_slice(changes);
        Ok(affected)
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut tables = self.shared.lock()?;
        let mut next = tables.clone();
        apply_changes(&mut next, &self.pending, &self.shared.unique_indexes)?;
        *tables = next;
        drop(tables);
        self.shared.counters.committed.fetch_add(1, Ordering::SeqCst);
        debug!(changes = self.pending.len(), "in-memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.shared.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        debug!(changes = self.pending.len(), "in-memory transaction rolled back");
        Ok(())
    }
}

fn records_of(tables: &Tables, kind: EntityKind) -> Vec<StoredRecord> {
    tables
        .get(&kind)
        .map(|table| {
            table
                .iter()
                .map(|(id, body)| StoredRecord {
                    id: *id,
                    body: body.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn count_of(tables: &Tables, kind: EntityKind) -> u64 {
    tables
        .get(&kind)
        .map_or(0, |table| u64::try_from(table.len()).unwrap_or(u64::MAX))
}

fn page_of(tables: &Tables, kind: EntityKind, window: &RecordWindow) -> RecordPage {
    let Some(table) = tables.get(&kind) else {
        return RecordPage::default();
    };
    let mut keyed: Vec<_> = table
        .iter()
        .map(|(id, body)| ((window.sort.key_of(*id, body), *id), id, body))
        .collect();
    keyed.sort_by(|(left, ..), (right, ..)| {
        let ordering = left.cmp(right);
        if window.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    let records = keyed
        .into_iter()
        .skip(usize::try_from(window.skip).unwrap_or(usize::MAX))
        .take(usize::try_from(window.take).unwrap_or(usize::MAX))
        .map(|(_, id, body)| StoredRecord {
            id: *id,
            body: body.clone(),
        })
        .collect();
    RecordPage {
        records,
        total: u64::try_from(table.len()).unwrap_or(u64::MAX),
    }
}

fn record_of(tables: &Tables, kind: EntityKind, id: Uuid) -> Option<StoredRecord> {
    tables
        .get(&kind)
        .and_then(|table| table.get(&id))
        .map(|body| StoredRecord {
            id,
            body: body.clone(),
        })
}

/// Apply `changes` in order, enforcing identity and unique-index constraints.
fn apply_changes(
    tables: &mut Tables,
    changes: &[StagedChange],
    unique_indexes: &[(EntityKind, &'static str)],
) -> Result<u64, StorageError> {
    let mut affected: u64 = 0;
    for StagedChange { kind, change } in changes {
        let table = tables.entry(*kind).or_default();
        match change {
            RecordChange::Insert(record) => {
                if table.contains_key(&record.id) {
                    return Err(StorageError::conflict(format!(
                        "{kind} {} already exists",
                        record.id
                    )));
                }
                table.insert(record.id, record.body.clone());
            }
            RecordChange::Update(record) => {
                let Some(body) = table.get_mut(&record.id) else {
                    return Err(StorageError::conflict(format!(
                        "{kind} {} no longer exists",
                        record.id
                    )));
                };
                body.clone_from(&record.body);
            }
            RecordChange::Delete(id) => {
                if table.remove(id).is_none() {
                    return Err(StorageError::conflict(format!("{kind} {id} no longer exists")));
                }
            }
        }
        affected = affected.saturating_add(1);
    }
    check_unique_indexes(tables, unique_indexes)?;
    Ok(affected)
}

fn check_unique_indexes(
    tables: &Tables,
    unique_indexes: &[(EntityKind, &'static str)],
) -> Result<(), StorageError> {
    for (kind, field) in unique_indexes {
        let Some(table) = tables.get(kind) else {
            continue;
        };
        let mut seen = HashSet::new();
        for body in table.values() {
            match body.get(*field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    if !seen.insert(value.to_string()) {
                        return Err(StorageError::conflict(format!(
                            "duplicate value for unique {kind}.{field}"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::SortField;

    #[fixture]
    fn storage() -> InMemoryStorage {
        InMemoryStorage::with_default_indexes()
    }

    fn insert(email: &str) -> StagedChange {
        StagedChange {
            kind: EntityKind::User,
            change: RecordChange::Insert(StoredRecord {
                id: Uuid::new_v4(),
                body: json!({ "email": email }),
            }),
        }
    }

    fn emails(page: &RecordPage) -> Vec<&str> {
        page.records
            .iter()
            .filter_map(|record| record.body.get("email").and_then(Value::as_str))
            .collect()
    }

    fn by_email(descending: bool, skip: u64, take: u64) -> RecordWindow {
        RecordWindow {
            sort: SortField::Text("email"),
            descending,
            skip,
            take,
        }
    }

    async fn seed(storage: &InMemoryStorage, emails: &[&str]) {
        let mut tx = storage.begin().await.expect("begin");
        let changes: Vec<_> = emails.iter().map(|email| insert(email)).collect();
        tx.apply(&changes).await.expect("apply");
        tx.commit().await.expect("commit");
    }

    #[rstest]
    #[tokio::test]
    async fn uncommitted_writes_are_private(storage: InMemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        tx.apply(&[insert("a@example.com")]).await.expect("apply");

        assert_eq!(tx.load_all(EntityKind::User).await.expect("tx read").len(), 1);
        assert!(storage.load_all(EntityKind::User).await.expect("read").is_empty());

        tx.commit().await.expect("commit");
        assert_eq!(storage.load_all(EntityKind::User).await.expect("read").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn rollback_discards_writes(storage: InMemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        tx.apply(&[insert("a@example.com")]).await.expect("apply");
        tx.rollback().await.expect("rollback");

        assert!(storage.snapshot(EntityKind::User).expect("snapshot").is_empty());
        assert_eq!(
            storage.stats(),
            TransactionStats {
                begun: 1,
                committed: 0,
                rolled_back: 1
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unique_index_rejects_duplicates_within_a_batch(storage: InMemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        let result = tx
            .apply(&[insert("a@example.com"), insert("a@example.com")])
            .await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));
        assert!(tx.load_all(EntityKind::User).await.expect("tx read").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn commit_revalidates_against_concurrent_commits(storage: InMemoryStorage) {
        let mut first = storage.begin().await.expect("begin first");
        let mut second = storage.begin().await.expect("begin second");
        first.apply(&[insert("a@example.com")]).await.expect("apply first");
        second.apply(&[insert("a@example.com")]).await.expect("apply second");

        first.commit().await.expect("commit first");
        let result = second.commit().await;
        assert!(matches!(result, Err(StorageError::Conflict { .. })));
        assert_eq!(storage.snapshot(EntityKind::User).expect("snapshot").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn update_of_missing_record_conflicts(storage: InMemoryStorage) {
        let mut tx = storage.begin().await.expect("begin");
        let change = StagedChange {
            kind: EntityKind::User,
            change: RecordChange::Update(StoredRecord {
                id: Uuid::new_v4(),
                body: json!({}),
            }),
        };
        assert!(matches!(
            tx.apply(&[change]).await,
            Err(StorageError::Conflict { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn injected_failures_are_consumed(storage: InMemoryStorage) {
        storage.fail_next_begins(1);
        assert!(matches!(
            storage.begin().await.err(),
            Some(StorageError::Connection { .. })
        ));
        assert!(storage.begin().await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn pages_are_ordered_windows_with_a_total(storage: InMemoryStorage) {
        seed(&storage, &["carol@example.com", "Alice@example.com", "bob@example.com"]).await;

        let first = storage
            .load_page(EntityKind::User, &by_email(false, 0, 2))
            .await
            .expect("first page");
        assert_eq!(emails(&first), vec!["Alice@example.com", "bob@example.com"]);
        assert_eq!(first.total, 3);

        let last = storage
            .load_page(EntityKind::User, &by_email(true, 2, 2))
            .await
            .expect("last page");
        assert_eq!(emails(&last), vec!["Alice@example.com"]);
        assert_eq!(last.total, 3);
        assert_eq!(storage.count(EntityKind::User).await.expect("count"), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn pages_past_the_end_keep_the_total(storage: InMemoryStorage) {
        seed(&storage, &["a@example.com"]).await;
        let page = storage
            .load_page(EntityKind::User, &by_email(false, 10, 5))
            .await
            .expect("page");
        assert!(page.records.is_empty());
        assert_eq!(page.total, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn transaction_pages_include_uncommitted_writes(storage: InMemoryStorage) {
        seed(&storage, &["b@example.com"]).await;
        let mut tx = storage.begin().await.expect("begin");
        tx.apply(&[insert("a@example.com")]).await.expect("apply");

        let page = tx
            .load_page(EntityKind::User, &by_email(false, 0, 10))
            .await
            .expect("tx page");
        assert_eq!(emails(&page), vec!["a@example.com", "b@example.com"]);
        assert_eq!(tx.count(EntityKind::User).await.expect("tx count"), 2);
        assert_eq!(storage.count(EntityKind::User).await.expect("count"), 1);
    }
}
