//! Envelope and status mapping for handler results.
//!
//! Purpose: turn outcomes and faults into the JSON envelope every endpoint
//! returns, with a status derived only from the error list.
//!
//! Mapping rules for a non-empty error list:
//! - every error is `Validation`: 400 with code `Validation.Failed` and one
//!   `validationErrors` entry per error;
//! - otherwise the first error decides code, message, and status; later
//!   errors are kept under `additionalData.additionalErrors`.
//!
//! Faults become a redacted 500, except a storage conflict which reports as
//! the `Failure` error it stands for.

use std::sync::Arc;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::error;
use utoipa::ToSchema;

use crate::application::HandlerResult;
use crate::domain::ports::StorageError;
use crate::domain::{Error, ErrorKind, Fault, Outcome, Success, TraceId, messages};

/// Response header carrying the request's trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Status for an error kind.
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Failure => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorEntry {
    /// Code of the failed rule, or `Unknown` when blank.
    pub property_name: String,
    pub message: String,
}

impl ValidationErrorEntry {
    fn from_error(error: &Error) -> Self {
        let property_name = if error.code().trim().is_empty() {
            "Unknown".to_owned()
        } else {
            error.code().to_owned()
        };
        Self {
            property_name,
            message: error.description().to_owned(),
        }
    }
}

/// Error section of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[schema(example = "User.NotFound")]
    pub code: String,
    pub message: String,
    pub validation_errors: Vec<ValidationErrorEntry>,
    #[schema(example = 404)]
    pub status_code: u16,
    #[schema(value_type = Object)]
    pub additional_data: Map<String, Value>,
}

impl ErrorDetails {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            validation_errors: Vec::new(),
            status_code: status.as_u16(),
            additional_data: Map::new(),
        }
    }

    /// Details for an ordered error list.
    ///
    /// An empty list yields `Unknown.Error` with status 500.
    pub fn from_errors<'a>(errors: impl IntoIterator<Item = &'a Error>) -> Self {
        let errors: Vec<&Error> = errors.into_iter().collect();
        let Some((primary, rest)) = errors.split_first() else {
            return Self::new(
                messages::UNKNOWN_ERROR,
                messages::UNKNOWN_ERROR_MESSAGE,
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        };

        if errors.iter().all(|e| e.kind() == ErrorKind::Validation) {
            let mut details = Self::new(
                messages::VALIDATION_FAILED,
                messages::VALIDATION_FAILED_MESSAGE,
                StatusCode::BAD_REQUEST,
            );
            details.validation_errors = errors
                .iter()
                .map(|e| ValidationErrorEntry::from_error(e))
                .collect();
            return details;
        }

        let mut details = Self::new(
            primary.code(),
            primary.description(),
            status_for(primary.kind()),
        );
        if !rest.is_empty() {
            let additional: Vec<Value> = rest
                .iter()
                .map(|e| {
                    json!({
                        "code": e.code(),
                        "description": e.description(),
                        "type": e.kind().as_str(),
                    })
                })
                .collect();
            details
                .additional_data
                .insert("additionalErrors".to_owned(), Value::Array(additional));
        }
        details
    }

    /// Status this payload is sent with.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Envelope wrapped around every response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorDetails>,
    pub trace_id: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Builds envelopes and HTTP responses stamped with the current trace id.
#[derive(Clone)]
pub struct ResponseMapper {
    clock: Arc<dyn Clock>,
}

impl ResponseMapper {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn success<T>(&self, data: T) -> ApiResponse<T> {
        ApiResponse {
            is_success: true,
            data: Some(data),
            error: None,
            trace_id: TraceId::current_or_generate().to_string(),
            timestamp: self.clock.utc(),
        }
    }

    pub fn failure(&self, details: ErrorDetails) -> ApiResponse<Value> {
        ApiResponse {
            is_success: false,
            data: None,
            error: Some(details),
            trace_id: TraceId::current_or_generate().to_string(),
            timestamp: self.clock.utc(),
        }
    }

    /// 200 with the value, or the mapped error status.
    pub fn respond<T: Serialize>(&self, outcome: Outcome<T>) -> HttpResponse {
        self.respond_with(StatusCode::OK, outcome)
    }

    /// 201 with the value, or the mapped error status.
    pub fn respond_created<T: Serialize>(&self, outcome: Outcome<T>) -> HttpResponse {
        self.respond_with(StatusCode::CREATED, outcome)
    }

    /// 204 without a body, or the mapped error status.
    pub fn respond_empty(&self, outcome: Outcome<Success>) -> HttpResponse {
        match outcome {
            Ok(Success) => {
                let trace_id = TraceId::current_or_generate().to_string();
                HttpResponse::NoContent()
                    .insert_header((TRACE_ID_HEADER, trace_id))
                    .finish()
            }
            Err(errors) => self.send_failure(ErrorDetails::from_errors(&errors)),
        }
    }

    /// Map a full handler result, faults included.
    pub fn respond_result<T: Serialize>(&self, result: HandlerResult<T>) -> HttpResponse {
        match result {
            Ok(outcome) => self.respond(outcome),
            Err(fault) => self.respond_fault(&fault),
        }
    }

    /// Log `fault` and answer without exposing its details.
    pub fn respond_fault(&self, fault: &Fault) -> HttpResponse {
        if let Fault::Storage(conflict @ StorageError::Conflict { .. }) = fault {
            let rejected = conflict.to_error();
            return self.send_failure(ErrorDetails::from_errors([&rejected]));
        }
        error!(error = %fault, "request failed with a fault");
        self.send_failure(ErrorDetails::new(
            messages::INTERNAL_SERVER_ERROR,
            messages::INTERNAL_SERVER_ERROR_MESSAGE,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }

    fn respond_with<T: Serialize>(&self, status: StatusCode, outcome: Outcome<T>) -> HttpResponse {
        match outcome {
            Ok(data) => {
                let body = self.success(data);
                HttpResponse::build(status)
                    .insert_header((TRACE_ID_HEADER, body.trace_id.clone()))
                    .json(body)
            }
            Err(errors) => self.send_failure(ErrorDetails::from_errors(&errors)),
        }
    }

    fn send_failure(&self, details: ErrorDetails) -> HttpResponse {
        let status = details.status();
        let body = self.failure(details);
        HttpResponse::build(status)
            .insert_header((TRACE_ID_HEADER, body.trace_id.clone()))
            .json(body)
    }
}

#[cfg(test)]
mod tests;
