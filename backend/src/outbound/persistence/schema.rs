//! Diesel table definitions for the PostgreSQL schema.
//!
//! Every entity kind is stored as a JSONB document in one table keyed by
//! `(entity_kind, id)`. The table is expected to exist along with a unique
//! expression index for user emails:
//!
//! ```sql
//! CREATE TABLE entity_records (
//!     entity_kind VARCHAR(64) NOT NULL,
//!     id UUID NOT NULL,
//!     body JSONB NOT NULL,
//!     PRIMARY KEY (entity_kind, id)
//! );
//! CREATE UNIQUE INDEX entity_records_user_email
//!     ON entity_records ((body ->> 'email'))
//!     WHERE entity_kind = 'user';
//! ```

diesel::table! {
    /// Entity documents of every kind.
    entity_records (entity_kind, id) {
        /// Storage name of the entity kind, e.g. `user`.
        entity_kind -> Varchar,
        /// Entity identity.
        id -> Uuid,
        /// Serialised entity body.
        body -> Jsonb,
    }
}
