//! Pagination and search query parameters.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::application::pagination::PageRequest;
use crate::error::AppError;

/// `?page=&limit=&search=` for list endpoints.
///
/// Uses `serde_with` to parse numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,

    #[serde(default)]
    pub search: Option<String>,
}

impl ListQuery {
    /// Validates `page`/`limit` (defaults 1 and 10, limit at most 100).
    pub fn page_request(&self) -> Result<PageRequest, AppError> {
        PageRequest::new(self.page, self.limit)
    }
}

/// Pagination block of list responses.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        Self {
            page: request.page(),
            limit: request.limit(),
            total_items,
            total_pages: request.total_pages(total_items),
        }
    }
}
