//! Outward representation of a user.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Entity, User};

/// User as returned to callers. Timestamps are RFC 3339 strings in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub created_by: String,
    #[schema(example = "2026-02-24T10:30:00Z")]
    pub created_at: String,
    pub updated_by: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let audit = user.audit();
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            created_by: audit.created_by.clone(),
            created_at: audit.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            updated_by: audit.updated_by.clone(),
            updated_at: audit
                .updated_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}
