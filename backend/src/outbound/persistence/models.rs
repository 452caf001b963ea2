//! Internal Diesel row structs for entity documents.
//!
//! These types never leave the persistence adapter.

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Jsonb, Nullable};
use uuid::Uuid;

use crate::domain::ports::StoredRecord;

use super::schema::entity_records;

/// Row read from `entity_records`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = entity_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EntityRecordRow {
    pub id: Uuid,
    pub body: serde_json::Value,
}

impl From<EntityRecordRow> for StoredRecord {
    fn from(row: EntityRecordRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
        }
    }
}

/// Row inserted into `entity_records`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = entity_records)]
pub(crate) struct NewEntityRecordRow<'a> {
    pub entity_kind: &'a str,
    pub id: Uuid,
    pub body: &'a serde_json::Value,
}

/// Row of a windowed page read: the kind's record count, plus one record
/// unless the window is empty.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct PageRow {
    #[diesel(sql_type = BigInt)]
    pub total: i64,
    #[diesel(sql_type = Nullable<diesel::sql_types::Uuid>)]
    pub id: Option<Uuid>,
    #[diesel(sql_type = Nullable<Jsonb>)]
    pub body: Option<serde_json::Value>,
}
