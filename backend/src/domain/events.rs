//! Domain events raised by aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised when a new user is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    /// Unique id of this event occurrence.
    pub event_id: Uuid,
    /// When the user was created.
    pub occurred_on: DateTime<Utc>,
    /// Id of the new user.
    pub user_id: Uuid,
    /// Email of the new user.
    pub email: String,
    /// Name of the new user.
    pub name: String,
}

/// Every event an aggregate can raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// See [`UserCreated`].
    UserCreated(UserCreated),
}

impl DomainEvent {
    /// Event name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UserCreated(_) => "UserCreated",
        }
    }

    /// Id of this event occurrence.
    pub const fn event_id(&self) -> Uuid {
        match self {
            Self::UserCreated(event) => event.event_id,
        }
    }
}
