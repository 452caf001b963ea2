//! User aggregate.
//!
//! Users are identified by a UUID and carry a name and an email. Emails are
//! unique across users; the record store enforces this with a unique index on
//! the `email` field. Creating a user through [`User::create`] raises a
//! [`UserCreated`] event that is published after the insert commits.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AuditFields, DomainEvent, Entity, EntityKind, SortField, SortKey, UserCreated,
};

/// Document field backing the unique email index.
pub const USER_EMAIL_FIELD: &str = "email";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only: a single `@` with non-blank text on both sides.
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Whether `email` looks like a deliverable address.
///
/// # Examples
/// ```
/// use user_service::domain::is_valid_email;
///
/// assert!(is_valid_email("ada@example.com"));
/// assert!(!is_valid_email("ada.example.com"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: Uuid,
    name: String,
    email: String,
    #[serde(flatten)]
    audit: AuditFields,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl User {
    /// Create a new user with a fresh id and raise [`UserCreated`].
    pub fn create(
        email: impl Into<String>,
        name: impl Into<String>,
        occurred_on: DateTime<Utc>,
    ) -> Self {
        let mut user = Self::with_id(Uuid::new_v4(), email, name);
        user.events.push(DomainEvent::UserCreated(UserCreated {
            event_id: Uuid::new_v4(),
            occurred_on,
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }));
        user
    }

    /// Rebuild a user with a known id. Raises no events.
    pub fn with_id(id: Uuid, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            audit: AuditFields::default(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Events raised and not yet drained.
    pub fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn change_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> Uuid {
        self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field.to_ascii_lowercase().as_str() {
            "name" => Some(SortKey::text(&self.name)),
            "email" => Some(SortKey::text(&self.email)),
            "createdat" => Some(SortKey::Time(self.audit.created_at)),
            "updatedat" => Some(SortKey::from(self.audit.updated_at)),
            _ => None,
        }
    }

    fn sort_field(field: &str) -> Option<SortField> {
        match field.to_ascii_lowercase().as_str() {
            "name" => Some(SortField::Text("name")),
            "email" => Some(SortField::Text(USER_EMAIL_FIELD)),
            "createdat" => Some(SortField::Time("createdAt")),
            "updatedat" => Some(SortField::Time("updatedAt")),
            _ => None,
        }
    }

    fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Catalogued user errors.
pub mod errors {
    use crate::domain::{Error, messages};

    pub fn id_empty() -> Error {
        Error::validation(messages::USER_ID_EMPTY, messages::USER_ID_EMPTY_MESSAGE)
    }

    pub fn name_empty() -> Error {
        Error::validation(messages::USER_NAME_EMPTY, messages::USER_NAME_EMPTY_MESSAGE)
    }

    pub fn name_too_long() -> Error {
        Error::validation(
            messages::USER_NAME_TOO_LONG,
            messages::USER_NAME_TOO_LONG_MESSAGE,
        )
    }

    pub fn email_empty() -> Error {
        Error::validation(messages::USER_EMAIL_EMPTY, messages::USER_EMAIL_EMPTY_MESSAGE)
    }

    pub fn email_invalid() -> Error {
        Error::validation(
            messages::USER_EMAIL_INVALID,
            messages::USER_EMAIL_INVALID_MESSAGE,
        )
    }

    pub fn email_too_long() -> Error {
        Error::validation(
            messages::USER_EMAIL_TOO_LONG,
            messages::USER_EMAIL_TOO_LONG_MESSAGE,
        )
    }

    pub fn not_found() -> Error {
        Error::not_found(messages::USER_NOT_FOUND, messages::USER_NOT_FOUND_MESSAGE)
    }

    pub fn email_already_exists() -> Error {
        Error::conflict(
            messages::USER_EMAIL_ALREADY_EXISTS,
            messages::USER_EMAIL_ALREADY_EXISTS_MESSAGE,
        )
    }
}
