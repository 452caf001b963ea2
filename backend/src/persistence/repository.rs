//! Generic repository over one entity kind.
//!
//! Reads go through the owning unit of work's session: inside a transaction
//! they observe the transaction's applied writes, outside one they see
//! committed data. Mutations are staged and only reach storage on
//! [`UnitOfWork::save_changes`](super::UnitOfWork::save_changes), so reads
//! never see them before that.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{RecordWindow, StorageError, StoredRecord};
use crate::domain::{Entity, SortField, SortKey, USER_EMAIL_FIELD, User};

use super::change_tracker::EntryState;
use super::session::Session;

/// Optional filter for [`Repository::get_paginated`].
pub type Filter<'a, E> = Option<&'a (dyn Fn(&E) -> bool + Send + Sync)>;

/// A window of entities and the number of entities of that type, read
/// together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedWindow<E> {
    pub items: Vec<E>,
    pub total: u64,
}

/// Data access for entities of type `E`.
pub struct Repository<E: Entity> {
    session: Arc<Session>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub(crate) const fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<E>, StorageError> {
        self.session
            .load_one(E::KIND, id)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn get_all(&self) -> Result<Vec<E>, StorageError> {
        self.session
            .load_all(E::KIND)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Every entity matching `predicate`.
    pub async fn find<P>(&self, predicate: P) -> Result<Vec<E>, StorageError>
    where
        P: Fn(&E) -> bool + Send + Sync,
    {
        let mut entities = self.get_all().await?;
        entities.retain(|entity| predicate(entity));
        Ok(entities)
    }

    /// The single entity matching `predicate`, if any.
    ///
    /// # Errors
    /// Returns [`StorageError::Query`] when more than one entity matches.
    pub async fn single_or_default<P>(&self, predicate: P) -> Result<Option<E>, StorageError>
    where
        P: Fn(&E) -> bool + Send + Sync,
    {
        let mut matches = self.find(predicate).await?.into_iter();
        let first = matches.next();
        if matches.next().is_some() {
            return Err(StorageError::query(format!(
                "more than one {} matched a single-result lookup",
                E::KIND
            )));
        }
        Ok(first)
    }

    pub async fn count(&self) -> Result<u64, StorageError> {
        self.session.count(E::KIND).await
    }

    pub async fn count_where<P>(&self, predicate: P) -> Result<u64, StorageError>
    where
        P: Fn(&E) -> bool + Send + Sync,
    {
        let matched = self.find(predicate).await?;
        Ok(u64::try_from(matched.len()).unwrap_or(u64::MAX))
    }

    pub async fn exists<P>(&self, predicate: P) -> Result<bool, StorageError>
    where
        P: Fn(&E) -> bool + Send + Sync,
    {
        Ok(self.get_all().await?.iter().any(|entity| predicate(entity)))
    }

    /// Ordered, optionally filtered window of entities.
    ///
    /// Ordering uses the entity's sort key for `sort_by`; `"Id"` and fields
    /// the entity does not recognise order by identity. Ties break on
    /// identity so repeated calls return the same order. The filter is
    /// applied after ordering and before `skip`/`take`.
    ///
    /// Without a filter the store sorts and windows the records itself.
    /// A filter is a closure, so filtered pages load every entity and work
    /// in memory.
    pub async fn get_paginated(
        &self,
        skip: u64,
        take: u64,
        sort_by: &str,
        sort_descending: bool,
        filter: Filter<'_, E>,
    ) -> Result<Vec<E>, StorageError> {
        let Some(filter) = filter else {
            let window = self
                .get_counted_window(skip, take, sort_by, sort_descending)
                .await?;
            return Ok(window.items);
        };
        let mut entities = self.get_all().await?;
        entities.sort_by(|left, right| {
            let ordering = sort_key(left, sort_by)
                .cmp(&sort_key(right, sort_by))
                .then_with(|| left.id().cmp(&right.id()));
            if sort_descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        debug!(kind = %E::KIND, sort_by, sort_descending, skip, take, "paging filtered entities");

        let window = entities
            .into_iter()
            .filter(|entity| filter(entity))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(usize::MAX))
            .collect();
        Ok(window)
    }

    /// Unfiltered [`Self::get_paginated`] window plus the total number of
    /// entities, taken from one read of the store.
    pub async fn get_counted_window(
        &self,
        skip: u64,
        take: u64,
        sort_by: &str,
        sort_descending: bool,
    ) -> Result<CountedWindow<E>, StorageError> {
        let window = RecordWindow {
            sort: sort_field::<E>(sort_by),
            descending: sort_descending,
            skip,
            take,
        };
        debug!(kind = %E::KIND, sort_by, sort_descending, skip, take, "paging entities in storage");
        let page = self.session.load_page(E::KIND, &window).await?;
        let items = page
            .records
            .into_iter()
            .map(decode)
            .collect::<Result<_, _>>()?;
        Ok(CountedWindow {
            items,
            total: page.total,
        })
    }

    /// Stage an insert.
    pub async fn add(&self, entity: E) {
        self.session.track(EntryState::Added, entity).await;
    }

    pub async fn add_range(&self, entities: impl IntoIterator<Item = E> + Send) {
        self.session.track_all(EntryState::Added, entities).await;
    }

    /// Stage an update.
    pub async fn update(&self, entity: E) {
        self.session.track(EntryState::Modified, entity).await;
    }

    pub async fn update_range(&self, entities: impl IntoIterator<Item = E> + Send) {
        self.session.track_all(EntryState::Modified, entities).await;
    }

    /// Stage a delete.
    pub async fn delete(&self, entity: E) {
        self.session.track(EntryState::Deleted, entity).await;
    }

    pub async fn delete_range(&self, entities: impl IntoIterator<Item = E> + Send) {
        self.session.track_all(EntryState::Deleted, entities).await;
    }
}

/// User lookups beyond the generic operations.
impl Repository<User> {
    /// Look a user up by email, compared case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        debug!(field = USER_EMAIL_FIELD, "looking up user by email");
        self.single_or_default(|user| user.email().eq_ignore_ascii_case(email))
            .await
    }

    /// Whether any user already uses `email`, compared case-insensitively.
    pub async fn email_exists(&self, email: &str) -> Result<bool, StorageError> {
        self.exists(|user| user.email().eq_ignore_ascii_case(email))
            .await
    }
}

fn sort_field<E: Entity>(field: &str) -> SortField {
    if field.eq_ignore_ascii_case("id") {
        return SortField::Id;
    }
    E::sort_field(field).unwrap_or(SortField::Id)
}

fn sort_key<E: Entity>(entity: &E, field: &str) -> SortKey {
    if field.eq_ignore_ascii_case("id") {
        return SortKey::Id(entity.id());
    }
    entity
        .sort_key(field)
        .unwrap_or_else(|| SortKey::Id(entity.id()))
}

fn decode<E: Entity>(record: StoredRecord) -> Result<E, StorageError> {
    serde_json::from_value(record.body).map_err(|err| {
        StorageError::serialization(format!("{} {}: {err}", E::KIND, record.id))
    })
}
