//! Page envelope pairing items with their metadata.

use serde::{Deserialize, Serialize};

use crate::{PaginationMetadata, PaginationRequest};

/// One page of items plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    /// Items on this page, in sort order.
    pub items: Vec<T>,
    /// Navigation metadata for this page.
    pub metadata: PaginationMetadata,
}

impl<T> PaginatedResult<T> {
    /// Wrap `items` as the page described by `request`.
    #[must_use]
    pub fn new(items: Vec<T>, request: &PaginationRequest, total_count: u64) -> Self {
        let current_page_count = u64::try_from(items.len()).unwrap_or(u64::MAX);
        Self {
            metadata: PaginationMetadata::new(request, total_count, current_page_count),
            items,
        }
    }

    /// A page with no items and a zero total count.
    #[must_use]
    pub fn empty(request: &PaginationRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Transform each item while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}
