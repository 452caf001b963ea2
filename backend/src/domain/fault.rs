//! Exceptional failures.
//!
//! A [`Fault`] is anything a caller cannot act on by changing its input:
//! storage outages, cancellation, or a misconfigured dispatcher. Faults never
//! appear inside an [`Outcome`](crate::domain::Outcome); the outermost boundary
//! turns them into a generic internal error.

use crate::domain::ports::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// The record store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The caller cancelled the request.
    #[error("request was cancelled")]
    Cancelled,
    /// No pipeline is registered for the request type.
    #[error("no handler registered for request `{request}`")]
    HandlerNotFound { request: &'static str },
    /// A second handler was registered for the same request type.
    #[error("a handler is already registered for request `{request}`")]
    DuplicateHandler { request: &'static str },
    /// A validation rule is defined with unusable content.
    #[error("validation rule `{rule}` is malformed: {reason}")]
    MalformedRule { rule: &'static str, reason: String },
}

impl Fault {
    /// Whether retrying the whole operation may succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Storage(error) => error.is_transient(),
            _ => false,
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
