//! Diesel and pool error mapping into [`StorageError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::StorageError;

use super::pool::PoolError;

pub(crate) fn map_pool_error(error: PoolError) -> StorageError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Connect { message } => message,
    };
    StorageError::connection(message)
}

/// Constraint violations become conflicts; dropped connections and
/// serialisation failures are transient; everything else is a query error.
pub(crate) fn map_diesel_error(error: DieselError) -> StorageError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation,
            info,
        ) => StorageError::conflict(info.message()),
        DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::SerializationFailure,
            info,
        ) => StorageError::connection(info.message()),
        DieselError::DatabaseError(_, info) => StorageError::query(info.message()),
        DieselError::NotFound => StorageError::query("record not found"),
        DieselError::SerializationError(err) | DieselError::DeserializationError(err) => {
            StorageError::serialization(err.to_string())
        }
        other => StorageError::query(other.to_string()),
    }
}
