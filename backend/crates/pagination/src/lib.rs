//! Offset pagination primitives shared by backend list queries.
//!
//! A [`PaginationRequest`] is always normalised on construction: the page
//! number is at least one, the page size is clamped into
//! [`MIN_PAGE_SIZE`]..=[`MAX_PAGE_SIZE`], and a blank sort field falls back
//! to [`DEFAULT_SORT_FIELD`]. [`PaginationMetadata`] derives navigation flags
//! from a request and a total count, and [`PaginatedResult`] pairs one page of
//! items with that metadata.
//!
//! Raw transport input is parsed with [`PaginationQuery`], which accepts any
//! values and only rejects parameters that are not numbers or booleans.

mod metadata;
mod page;
mod query;
mod request;

pub use metadata::PaginationMetadata;
pub use page::PaginatedResult;
pub use query::{PaginationQuery, PaginationQueryError};
pub use request::PaginationRequest;

/// Smallest page size a request may carry.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest page size a request may carry.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size applied when a caller does not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort field applied when a caller supplies a blank one.
pub const DEFAULT_SORT_FIELD: &str = "Id";
