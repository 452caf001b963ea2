//! HTTP mapping of handler results.
//!
//! Routing and request extraction belong to the hosting application; this
//! module only owns the response contract.

pub mod response;

pub use response::{
    ApiResponse, ErrorDetails, ResponseMapper, TRACE_ID_HEADER, ValidationErrorEntry, status_for,
};
