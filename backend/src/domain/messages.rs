//! Catalogue of error codes and user-facing messages.
//!
//! All error text lives here so codes and wording stay consistent between
//! validation rules, handlers, and the response mapper.

/// Field length limit for user names.
pub const USER_NAME_MAX_LENGTH: usize = 100;
/// Field length limit for user emails.
pub const USER_EMAIL_MAX_LENGTH: usize = 150;

pub const USER_ID_EMPTY: &str = "User.IdEmpty";
pub const USER_ID_EMPTY_MESSAGE: &str = "User id must not be empty.";

pub const USER_NAME_EMPTY: &str = "User.NameEmpty";
pub const USER_NAME_EMPTY_MESSAGE: &str = "Name must not be empty.";

pub const USER_NAME_TOO_LONG: &str = "User.NameTooLong";
pub const USER_NAME_TOO_LONG_MESSAGE: &str = "Name must not exceed 100 characters.";

pub const USER_EMAIL_EMPTY: &str = "User.EmailEmpty";
pub const USER_EMAIL_EMPTY_MESSAGE: &str = "Email must not be empty.";

pub const USER_EMAIL_INVALID: &str = "User.EmailInvalid";
pub const USER_EMAIL_INVALID_MESSAGE: &str = "Email is not a valid email address.";

pub const USER_EMAIL_TOO_LONG: &str = "User.EmailTooLong";
pub const USER_EMAIL_TOO_LONG_MESSAGE: &str = "Email must not exceed 150 characters.";

pub const USER_NOT_FOUND: &str = "User.NotFound";
pub const USER_NOT_FOUND_MESSAGE: &str = "The user was not found.";

pub const USER_EMAIL_ALREADY_EXISTS: &str = "User.EmailAlreadyExists";
pub const USER_EMAIL_ALREADY_EXISTS_MESSAGE: &str = "A user with this email already exists.";

pub const STORAGE_WRITE_REJECTED: &str = "Storage.WriteRejected";

pub const VALIDATION_FAILED: &str = "Validation.Failed";
pub const VALIDATION_FAILED_MESSAGE: &str = "One or more validation errors occurred.";

pub const UNKNOWN_ERROR: &str = "Unknown.Error";
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

pub const INTERNAL_SERVER_ERROR: &str = "Internal.ServerError";
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "An internal server error occurred.";
