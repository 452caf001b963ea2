//! PostgreSQL-backed [`StorageAdapter`].
//!
//! Reads outside a transaction borrow a pooled connection per call. A
//! transaction owns its connection from `BEGIN` until commit or rollback.
//!
//! Page reads run as one statement, so the window and the total come from
//! the same snapshot. Sorting happens in SQL on the JSON document field.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{
    RecordChange, RecordPage, RecordWindow, StagedChange, StorageAdapter, StorageError,
    StorageTransaction, StoredRecord,
};
use crate::domain::{EntityKind, SortField};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EntityRecordRow, NewEntityRecordRow, PageRow};
use super::pool::{DbPool, OwnedConnection};
use super::schema::entity_records;

type Transactions = AnsiTransactionManager;

#[derive(Clone)]
pub struct PostgresStorage {
    pool: DbPool,
}

impl PostgresStorage {
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageAdapter for PostgresStorage {
    async fn load_all(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        let mut conn = self.pool.statement().await.map_err(map_pool_error)?;
        load_all(&mut conn, kind).await
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, StorageError> {
        let mut conn = self.pool.statement().await.map_err(map_pool_error)?;
        count(&mut conn, kind).await
    }

    async fn load_page(
        &self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        let mut conn = self.pool.statement().await.map_err(map_pool_error)?;
        load_page(&mut conn, kind, window).await
    }

    async fn load_one(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let mut conn = self.pool.statement().await.map_err(map_pool_error)?;
        load_one(&mut conn, kind, id).await
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let mut conn = self.pool.transaction().await.map_err(map_pool_error)?;
        <Transactions as TransactionManager<AsyncPgConnection>>::begin_transaction(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        debug!("postgres transaction opened");
        Ok(Box::new(PgTransaction { conn }))
    }
}

struct PgTransaction {
    conn: OwnedConnection,
}

#[async_trait]
impl StorageTransaction for PgTransaction {
    async fn load_all(&mut self, kind: EntityKind) -> Result<Vec<StoredRecord>, StorageError> {
        load_all(&mut self.conn, kind).await
    }

    async fn count(&mut self, kind: EntityKind) -> Result<u64, StorageError> {
        count(&mut self.conn, kind).await
    }

    async fn load_page(
        &mut self,
        kind: EntityKind,
        window: &RecordWindow,
    ) -> Result<RecordPage, StorageError> {
        load_page(&mut self.conn, kind, window).await
    }

    async fn load_one(
        &mut self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StorageError> {
        load_one(&mut self.conn, kind, id).await
    }

    async fn apply(&mut self, changes: &[StagedChange]) -> Result<u64, StorageError> {
        // A savepoint keeps a rejected batch from poisoning the outer transaction.
        <Transactions as TransactionManager<AsyncPgConnection>>::begin_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        match apply_all(&mut self.conn, changes).await {
            Ok(affected) => {
                <Transactions as TransactionManager<AsyncPgConnection>>::commit_transaction(
                    &mut *self.conn,
                )
                .await
                .map_err(map_diesel_error)?;
                Ok(affected)
            }
            Err(err) => {
                if let Err(rollback_err) =
                    <Transactions as TransactionManager<AsyncPgConnection>>::rollback_transaction(
                        &mut *self.conn,
                    )
                    .await
                {
                    warn!(error = %rollback_err, "savepoint rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        <Transactions as TransactionManager<AsyncPgConnection>>::commit_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StorageError> {
        <Transactions as TransactionManager<AsyncPgConnection>>::rollback_transaction(
            &mut *self.conn,
        )
        .await
        .map_err(map_diesel_error)
    }
}

async fn load_all(
    conn: &mut AsyncPgConnection,
    kind: EntityKind,
) -> Result<Vec<StoredRecord>, StorageError> {
    let rows: Vec<EntityRecordRow> = entity_records::table
        .filter(entity_records::entity_kind.eq(kind.as_str()))
        .order(entity_records::id.asc())
        .select(EntityRecordRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(StoredRecord::from).collect())
}

async fn count(conn: &mut AsyncPgConnection, kind: EntityKind) -> Result<u64, StorageError> {
    let total: i64 = entity_records::table
        .filter(entity_records::entity_kind.eq(kind.as_str()))
        .count()
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(u64::try_from(total).unwrap_or(0))
}

async fn load_page(
    conn: &mut AsyncPgConnection,
    kind: EntityKind,
    window: &RecordWindow,
) -> Result<RecordPage, StorageError> {
    let query = page_sql(window)?;
    debug!(kind = %kind, sort = ?window.sort, skip = window.skip, take = window.take, "loading page");
    let rows: Vec<PageRow> = sql_query(query)
        .bind::<Text, _>(kind.as_str())
        .bind::<BigInt, _>(i64::try_from(window.skip).unwrap_or(i64::MAX))
        .bind::<BigInt, _>(i64::try_from(window.take).unwrap_or(i64::MAX))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(into_page(rows))
}

/// Count and window in one statement. The lateral join keeps the count row
/// when the window is empty.
fn page_sql(window: &RecordWindow) -> Result<String, StorageError> {
    Ok(format!(
        "SELECT counted.total, page.id, page.body \
         FROM (SELECT COUNT(*) AS total FROM entity_records WHERE entity_kind = $1) AS counted \
         LEFT JOIN LATERAL (\
         SELECT id, body FROM entity_records WHERE entity_kind = $1 \
         ORDER BY {inner} OFFSET $2 LIMIT $3\
         ) AS page ON TRUE \
         ORDER BY {outer}",
        inner = order_by("entity_records", window)?,
        outer = order_by("page", window)?,
    ))
}

/// Ordering that mirrors [`SortKey`](crate::domain::SortKey): text compares
/// lower-cased by code point, missing values sort first when ascending, and
/// ties break on id in the same direction.
fn order_by(table: &str, window: &RecordWindow) -> Result<String, StorageError> {
    let (direction, nulls) = if window.descending {
        ("DESC", "NULLS LAST")
    } else {
        ("ASC", "NULLS FIRST")
    };
    let id = format!("{table}.id {direction}");
    Ok(match window.sort {
        SortField::Id => id,
        SortField::Text(field) => format!(
            "lower({table}.body ->> '{}') COLLATE \"C\" {direction} {nulls}, {id}",
            document_field(field)?
        ),
        SortField::Time(field) => format!(
            "({table}.body ->> '{}')::timestamptz {direction} {nulls}, {id}",
            document_field(field)?
        ),
    })
}

fn document_field(field: &'static str) -> Result<&'static str, StorageError> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(field)
    } else {
        Err(StorageError::query(format!("unsupported sort field `{field}`")))
    }
}

fn into_page(rows: Vec<PageRow>) -> RecordPage {
    let total = rows
        .as_slice()
        .first()
        .map_or(0, |row| u64::try_from(row.total).unwrap_or(0));
    let records = rows
        .into_iter()
        .filter_map(|row| {
            Some(StoredRecord {
                id: row.id?,
                body: row.body?,
            })
        })
        .collect();
    RecordPage { records, total }
}

async fn load_one(
    conn: &mut AsyncPgConnection,
    kind: EntityKind,
    id: Uuid,
) -> Result<Option<StoredRecord>, StorageError> {
    let row: Option<EntityRecordRow> = entity_records::table
        .filter(entity_records::entity_kind.eq(kind.as_str()))
        .filter(entity_records::id.eq(id))
        .select(EntityRecordRow::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
    Ok(row.map(StoredRecord::from))
}

async fn apply_all(
    conn: &mut AsyncPgConnection,
    changes: &[StagedChange],
) -> Result<u64, StorageError> {
    let mut affected: u64 = 0;
    for StagedChange { kind, change } in changes {
        let kind_name = kind.as_str();
        let rows = match change {
            RecordChange::Insert(record) => {
                let row = NewEntityRecordRow {
                    entity_kind: kind_name,
                    id: record.id,
                    body: &record.body,
                };
                diesel::insert_into(entity_records::table)
                    .values(&row)
                    .execute(conn)
                    .await
            }
            RecordChange::Update(record) => {
                diesel::update(entity_records::table.find((kind_name, record.id)))
                    .set(entity_records::body.eq(&record.body))
                    .execute(conn)
                    .await
            }
            RecordChange::Delete(id) => {
                diesel::delete(entity_records::table.find((kind_name, *id)))
                    .execute(conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        if rows == 0 {
            return Err(StorageError::conflict(format!(
                "{kind} {} no longer exists",
                change.id()
            )));
        }
        affected = affected.saturating_add(u64::try_from(rows).unwrap_or(u64::MAX));
    }
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn window(sort: SortField, descending: bool) -> RecordWindow {
        RecordWindow {
            sort,
            descending,
            skip: 0,
            take: 10,
        }
    }

    #[rstest]
    #[case(SortField::Id, false, "page.id ASC")]
    #[case(SortField::Id, true, "page.id DESC")]
    #[case(
        SortField::Text("email"),
        false,
        "lower(page.body ->> 'email') COLLATE \"C\" ASC NULLS FIRST, page.id ASC"
    )]
    #[case(
        SortField::Time("updatedAt"),
        true,
        "(page.body ->> 'updatedAt')::timestamptz DESC NULLS LAST, page.id DESC"
    )]
    fn ordering_follows_the_sort_field(
        #[case] sort: SortField,
        #[case] descending: bool,
        #[case] expected: &str,
    ) {
        let clause = order_by("page", &window(sort, descending)).expect("valid field");
        assert_eq!(clause, expected);
    }

    #[rstest]
    fn quoted_field_names_are_rejected() {
        let result = order_by("page", &window(SortField::Text("name' OR '1"), false));
        assert!(matches!(result, Err(StorageError::Query { .. })));
    }

    #[rstest]
    fn page_query_counts_and_windows_the_same_kind() {
        let query = page_sql(&window(SortField::Id, false)).expect("query");
        assert!(query.contains("COUNT(*) AS total FROM entity_records WHERE entity_kind = $1"));
        assert!(query.contains("ORDER BY entity_records.id ASC OFFSET $2 LIMIT $3"));
        assert!(query.ends_with("ORDER BY page.id ASC"));
    }

    #[rstest]
    fn empty_windows_keep_the_total() {
        let id = Uuid::nil();
        let rows = vec![PageRow {
            total: 4,
            id: None,
            body: None,
        }];
        assert_eq!(into_page(rows), RecordPage { records: Vec::new(), total: 4 });

        let rows = vec![PageRow {
            total: 4,
            id: Some(id),
            body: Some(json!({})),
        }];
        let page = into_page(rows);
        assert_eq!(page.total, 4);
        assert_eq!(page.records, vec![StoredRecord { id, body: json!({}) }]);
    }
}
