//! Normalised page requests.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD, MAX_PAGE_SIZE, MIN_PAGE_SIZE, PaginationQuery};

/// A page request whose values are guaranteed to be in range.
///
/// Construction never fails. Out-of-range input is clamped instead of being
/// rejected, so the fields can only be read through accessors.
///
/// # Examples
/// ```
/// use pagination::PaginationRequest;
///
/// let request = PaginationRequest::new(0, 500, "  ", true);
/// assert_eq!(request.page(), 1);
/// assert_eq!(request.page_size(), 100);
/// assert_eq!(request.sort_by(), "Id");
/// assert!(request.sort_descending());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PaginationQuery")]
pub struct PaginationRequest {
    page: u32,
    page_size: u32,
    sort_by: String,
    sort_descending: bool,
}

impl PaginationRequest {
    /// Build a request, clamping the page and page size into range.
    #[must_use]
    pub fn new(page: i64, page_size: i64, sort_by: impl Into<String>, sort_descending: bool) -> Self {
        let requested: String = sort_by.into();
        let trimmed = requested.trim();
        Self {
            page: clamp_to_u32(page, 1, u32::MAX),
            page_size: clamp_to_u32(page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE),
            sort_by: if trimmed.is_empty() {
                DEFAULT_SORT_FIELD.to_owned()
            } else {
                trimmed.to_owned()
            },
            sort_descending,
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Field name used for ordering.
    #[must_use]
    pub fn sort_by(&self) -> &str {
        &self.sort_by
    }

    /// Whether ordering is descending.
    #[must_use]
    pub const fn sort_descending(&self) -> bool {
        self.sort_descending
    }

    /// Number of items preceding this page.
    #[must_use]
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self::new(1, i64::from(DEFAULT_PAGE_SIZE), DEFAULT_SORT_FIELD, false)
    }
}

impl From<PaginationQuery> for PaginationRequest {
    fn from(query: PaginationQuery) -> Self {
        Self::new(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
            query.sort_by.unwrap_or_default(),
            query.sort_descending.unwrap_or(false),
        )
    }
}

fn clamp_to_u32(value: i64, min: u32, max: u32) -> u32 {
    let bounded = value.clamp(i64::from(min), i64::from(max));
    u32::try_from(bounded).unwrap_or(min)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1)]
    #[case(-4, 1)]
    #[case(1, 1)]
    #[case(7, 7)]
    #[case(i64::MAX, u32::MAX)]
    fn page_is_at_least_one(#[case] raw: i64, #[case] expected: u32) {
        assert_eq!(PaginationRequest::new(raw, 10, "Id", false).page(), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(-10, 1)]
    #[case(25, 25)]
    #[case(101, 100)]
    #[case(10_000, 100)]
    fn page_size_is_clamped(#[case] raw: i64, #[case] expected: u32) {
        assert_eq!(PaginationRequest::new(1, raw, "Id", false).page_size(), expected);
    }

    #[rstest]
    #[case("", "Id")]
    #[case("   ", "Id")]
    #[case("name", "name")]
    #[case(" Email ", "Email")]
    fn blank_sort_field_defaults_to_identity(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(PaginationRequest::new(1, 10, raw, false).sort_by(), expected);
    }

    #[rstest]
    fn default_request_uses_first_page_of_ten() {
        let request = PaginationRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 10);
        assert_eq!(request.sort_by(), "Id");
        assert!(!request.sort_descending());
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(3, 10, 20)]
    #[case(2, 100, 100)]
    fn skip_counts_preceding_items(#[case] page: i64, #[case] size: i64, #[case] expected: u64) {
        assert_eq!(PaginationRequest::new(page, size, "Id", false).skip(), expected);
    }

    #[rstest]
    fn deserialising_clamps_values() -> Result<(), serde_json::Error> {
        let request: PaginationRequest =
            serde_json::from_str(r#"{"page":-2,"pageSize":1000,"sortBy":""}"#)?;
        assert_eq!(request, PaginationRequest::new(1, 100, "Id", false));
        Ok(())
    }
}
