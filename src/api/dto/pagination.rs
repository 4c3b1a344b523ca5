//! Pagination query parameters and list envelopes.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::domain::filter::{DEFAULT_PAGE_SIZE, FilterRequest, Page};

/// Pagination query parameters of the `GET` list endpoints.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Validates pagination parameters and turns them into an unfiltered search.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `page_size`: 20
    ///
    /// # Validation
    ///
    /// - Page must be > 0
    /// - Page size must be between 1 and `max_page_size`
    pub fn to_filter_request(&self, max_page_size: u32) -> Result<FilterRequest, String> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err("Page must be greater than 0".to_string());
        }

        if !(1..=max_page_size).contains(&page_size) {
            return Err(format!("Page size must be between 1 and {max_page_size}"));
        }

        Ok(FilterRequest::page(page, page_size))
    }
}

/// Optional `?row_version=` guard of the delete endpoints.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub row_version: Option<i32>,
}

/// Pagination metadata for responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

/// Paginated list response.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub pagination: PaginationMeta,
    pub items: Vec<T>,
}

impl<E, T: From<E>> From<Page<E>> for ListResponse<T> {
    fn from(page: Page<E>) -> Self {
        let page = page.map(T::from);

        Self {
            pagination: PaginationMeta {
                page: page.page,
                page_size: page.size,
                total_items: page.total_items,
                total_pages: page.total_pages,
            },
            items: page.items,
        }
    }
}
