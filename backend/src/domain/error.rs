//! Domain-level error taxonomy.
//!
//! Handlers report expected failures as values: a non-empty [`ErrorList`]
//! of [`Error`]s, each tagged with an [`ErrorKind`]. These errors are
//! transport agnostic; the inbound response mapper decides status codes and
//! envelopes. Exceptional conditions travel separately as
//! [`Fault`](crate::domain::Fault).

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    /// Input failed a validation rule.
    Validation,
    /// The request collides with existing state.
    Conflict,
    /// The addressed entity does not exist.
    NotFound,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller may not perform this action.
    Forbidden,
    /// A business rule rejected an otherwise well-formed request.
    Failure,
    /// Anything the other kinds do not describe.
    Unexpected,
}

impl ErrorKind {
    /// Stable name used in logs and error payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::Conflict => "Conflict",
            Self::NotFound => "NotFound",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::Failure => "Failure",
            Self::Unexpected => "Unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single expected failure.
///
/// ## Invariants
/// - `code` is non-empty once trimmed, e.g. `User.NotFound`.
/// - `description` is non-empty once trimmed.
///
/// # Examples
/// ```
/// use user_service::domain::{Error, ErrorKind};
///
/// let err = Error::not_found("User.NotFound", "The user was not found.");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.code(), "User.NotFound");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    #[schema(example = "User.NotFound")]
    code: String,
    #[schema(example = "The user was not found.")]
    description: String,
    kind: ErrorKind,
}

/// Validation errors emitted by [`Error::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The code was blank.
    #[error("error code must not be empty")]
    EmptyCode,
    /// The description was blank.
    #[error("error description must not be empty")]
    EmptyDescription,
}

impl Error {
    /// Build an error without checking its content.
    ///
    /// Every catalogued error goes through here; use [`Error::try_new`] for
    /// codes or descriptions supplied at runtime.
    pub fn new(kind: ErrorKind, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            kind,
        }
    }

    /// Fallible constructor that rejects blank codes and descriptions.
    pub fn try_new(
        kind: ErrorKind,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let error = Self::new(kind, code, description);
        error.check()?;
        Ok(error)
    }

    /// Re-run the content checks performed by [`Error::try_new`].
    pub fn check(&self) -> Result<(), ErrorValidationError> {
        if self.code.trim().is_empty() {
            return Err(ErrorValidationError::EmptyCode);
        }
        if self.description.trim().is_empty() {
            return Err(ErrorValidationError::EmptyDescription);
        }
        Ok(())
    }

    /// Convenience constructor for [`ErrorKind::Validation`].
    pub fn validation(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, description)
    }

    /// Convenience constructor for [`ErrorKind::Conflict`].
    pub fn conflict(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, code, description)
    }

    /// Convenience constructor for [`ErrorKind::NotFound`].
    pub fn not_found(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, description)
    }

    /// Convenience constructor for [`ErrorKind::Unauthorized`].
    pub fn unauthorized(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, code, description)
    }

    /// Convenience constructor for [`ErrorKind::Forbidden`].
    pub fn forbidden(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, code, description)
    }

    /// Convenience constructor for [`ErrorKind::Failure`].
    pub fn failure(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Failure, code, description)
    }

    /// Convenience constructor for [`ErrorKind::Unexpected`].
    pub fn unexpected(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, code, description)
    }

    /// Machine-readable code such as `User.EmailInvalid`.
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Category of the failure.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.kind, self.description)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: String,
    description: String,
    kind: ErrorKind,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            description: value.description,
            kind: value.kind,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            description,
            kind,
        } = value;
        Self::try_new(kind, code, description)
    }
}

/// A non-empty, ordered list of errors.
///
/// The first error is stored apart from the rest so it can be read without
/// a fallible lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorList {
    first: Error,
    rest: Vec<Error>,
}

impl ErrorList {
    /// Start a list with a single error.
    pub const fn new(first: Error) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }

    /// Build a list from `errors`, returning `None` when it is empty.
    pub fn from_vec(errors: Vec<Error>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let first = iter.next()?;
        Some(Self {
            first,
            rest: iter.collect(),
        })
    }

    /// Append an error, keeping insertion order.
    pub fn push(&mut self, error: Error) {
        self.rest.push(error);
    }

    /// The first error recorded.
    pub const fn first(&self) -> &Error {
        &self.first
    }

    /// Errors after the first, in order.
    pub fn rest(&self) -> &[Error] {
        &self.rest
    }

    /// Number of errors; never zero.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    /// Always `false`; present for API symmetry with collections.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over every error in order.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Whether every error has the given kind.
    pub fn all_of_kind(&self, kind: ErrorKind) -> bool {
        self.iter().all(|error| error.kind() == kind)
    }

    /// Flatten into a vector.
    pub fn into_vec(self) -> Vec<Error> {
        let mut errors = Vec::with_capacity(self.len());
        errors.push(self.first);
        errors.extend(self.rest);
        errors
    }
}

impl From<Error> for ErrorList {
    fn from(value: Error) -> Self {
        Self::new(value)
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = Box<dyn Iterator<Item = &'a Error> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl Serialize for ErrorList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for error in &self.rest {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

/// Value-typed result of a handler: either a value or a list of errors.
pub type Outcome<T> = Result<T, ErrorList>;

/// Marker for operations that produce no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Success;
