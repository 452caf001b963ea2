//! Raw pagination parameters as they arrive from a transport.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::PaginationRequest;

/// Unvalidated pagination parameters.
///
/// Every field is optional; [`PaginationQuery::into_request`] applies defaults
/// and clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    /// Requested one-based page number.
    pub page: Option<i64>,
    /// Requested page size.
    pub page_size: Option<i64>,
    /// Requested sort field.
    pub sort_by: Option<String>,
    /// Requested sort direction.
    pub sort_descending: Option<bool>,
}

/// Errors raised while reading pagination parameters from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationQueryError {
    /// A numeric parameter was not an integer.
    #[error("query parameter `{name}` must be an integer, got `{value}`")]
    InvalidInteger {
        /// Parameter name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// A boolean parameter was not `true` or `false`.
    #[error("query parameter `{name}` must be `true` or `false`, got `{value}`")]
    InvalidBoolean {
        /// Parameter name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

const PAGE: &str = "page";
const PAGE_SIZE: &str = "pageSize";
const SORT_BY: &str = "sortBy";
const SORT_DESCENDING: &str = "sortDescending";

impl PaginationQuery {
    /// Read pagination parameters from the query string of `url`.
    ///
    /// Unknown parameters are ignored. When a parameter repeats, the last
    /// occurrence wins.
    ///
    /// # Errors
    /// Returns [`PaginationQueryError`] when `page`/`pageSize` are not
    /// integers or `sortDescending` is not a boolean.
    ///
    /// # Examples
    /// ```
    /// use pagination::PaginationQuery;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.test/users?page=2&pageSize=5&sortBy=name")
    ///     .map_err(|err| err.to_string())?;
    /// let request = PaginationQuery::from_url(&url)
    ///     .map_err(|err| err.to_string())?
    ///     .into_request();
    /// assert_eq!(request.page(), 2);
    /// assert_eq!(request.page_size(), 5);
    /// assert_eq!(request.sort_by(), "name");
    /// # Ok::<(), String>(())
    /// ```
    pub fn from_url(url: &Url) -> Result<Self, PaginationQueryError> {
        let mut query = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PAGE => query.page = Some(parse_integer(PAGE, &value)?),
                PAGE_SIZE => query.page_size = Some(parse_integer(PAGE_SIZE, &value)?),
                SORT_BY => query.sort_by = Some(value.into_owned()),
                SORT_DESCENDING => {
                    query.sort_descending = Some(parse_boolean(SORT_DESCENDING, &value)?);
                }
                _ => {}
            }
        }
        Ok(query)
    }

    /// Apply defaults and clamping.
    #[must_use]
    pub fn into_request(self) -> PaginationRequest {
        PaginationRequest::from(self)
    }
}

fn parse_integer(name: &'static str, raw: &str) -> Result<i64, PaginationQueryError> {
    raw.trim()
        .parse()
        .map_err(|_| PaginationQueryError::InvalidInteger {
            name,
            value: raw.to_owned(),
        })
}

fn parse_boolean(name: &'static str, raw: &str) -> Result<bool, PaginationQueryError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(PaginationQueryError::InvalidBoolean {
            name,
            value: raw.to_owned(),
        }),
    }
}
