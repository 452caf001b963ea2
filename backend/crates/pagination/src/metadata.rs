//! Navigation metadata derived from a request and a total count.

use serde::{Deserialize, Serialize};

use crate::PaginationRequest;

/// Page position and navigation flags for one page of results.
///
/// `current_page` is the requested page clamped to the last page, so a
/// request beyond the end reports the final page rather than an empty one.
/// With no items at all there are zero pages and the single (empty) page is
/// both first and last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    /// Page number after clamping against the page count.
    pub current_page: u64,
    /// Requested page size.
    pub page_size: u32,
    /// Number of items across every page.
    pub total_count: u64,
    /// Number of pages; zero when `total_count` is zero.
    pub total_pages: u64,
    /// Number of items on this page.
    pub current_page_count: u64,
    /// Whether a page precedes this one.
    pub has_previous_page: bool,
    /// Whether a page follows this one.
    pub has_next_page: bool,
    /// Whether this is the first page.
    pub is_first_page: bool,
    /// Whether this is the last page.
    pub is_last_page: bool,
}

impl PaginationMetadata {
    /// Derive metadata for `request` given the overall and on-page counts.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PaginationMetadata, PaginationRequest};
    ///
    /// let request = PaginationRequest::new(3, 10, "Id", false);
    /// let metadata = PaginationMetadata::new(&request, 25, 5);
    /// assert_eq!(metadata.total_pages, 3);
    /// assert_eq!(metadata.current_page, 3);
    /// assert!(metadata.is_last_page);
    /// assert!(!metadata.has_next_page);
    /// ```
    #[must_use]
    pub fn new(request: &PaginationRequest, total_count: u64, current_page_count: u64) -> Self {
        let page_size = request.page_size();
        let total_pages = if total_count > 0 {
            total_count.div_ceil(u64::from(page_size.max(1)))
        } else {
            0
        };
        let current_page = u64::from(request.page()).min(total_pages.max(1));

        Self {
            current_page,
            page_size,
            total_count,
            total_pages,
            current_page_count,
            has_previous_page: current_page > 1,
            has_next_page: current_page < total_pages,
            is_first_page: current_page <= 1,
            is_last_page: current_page >= total_pages || total_pages == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn empty_collection_has_no_pages() {
        let metadata = PaginationMetadata::new(&PaginationRequest::default(), 0, 0);
        assert_eq!(metadata.total_pages, 0);
        assert_eq!(metadata.current_page, 1);
        assert!(metadata.is_first_page);
        assert!(metadata.is_last_page);
        assert!(!metadata.has_previous_page);
        assert!(!metadata.has_next_page);
    }

    #[rstest]
    #[case(1, 25, 3, 1, false, true)]
    #[case(2, 25, 3, 2, true, true)]
    #[case(3, 25, 3, 3, true, false)]
    #[case(9, 25, 3, 3, true, false)]
    #[case(1, 10, 1, 1, false, false)]
    #[case(1, 11, 2, 1, false, true)]
    fn navigation_flags_follow_page_position(
        #[case] page: i64,
        #[case] total: u64,
        #[case] expected_pages: u64,
        #[case] expected_current: u64,
        #[case] has_previous: bool,
        #[case] has_next: bool,
    ) {
        let request = PaginationRequest::new(page, 10, "Id", false);
        let metadata = PaginationMetadata::new(&request, total, 0);
        assert_eq!(metadata.total_pages, expected_pages);
        assert_eq!(metadata.current_page, expected_current);
        assert_eq!(metadata.has_previous_page, has_previous);
        assert_eq!(metadata.has_next_page, has_next);
        assert_eq!(metadata.is_first_page, expected_current == 1);
        assert_eq!(metadata.is_last_page, expected_current == expected_pages);
    }

    #[rstest]
    fn serialises_with_camel_case_keys() -> Result<(), serde_json::Error> {
        let request = PaginationRequest::new(2, 10, "Id", false);
        let value = serde_json::to_value(PaginationMetadata::new(&request, 15, 5))?;
        assert_eq!(value.get("currentPage"), Some(&serde_json::json!(2)));
        assert_eq!(value.get("totalPages"), Some(&serde_json::json!(2)));
        assert_eq!(value.get("isLastPage"), Some(&serde_json::json!(true)));
        assert_eq!(value.get("currentPageCount"), Some(&serde_json::json!(5)));
        Ok(())
    }
}
