//! Page/limit pagination shared by list operations.

use serde_json::json;

use crate::error::AppError;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// A validated page request (`page` starts at 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Validates raw query values, applying defaults for missing ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page < 1`, `limit` is outside
    /// `1..=100`, or the resulting offset does not fit in an `i64`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if page < 1 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                format!("Limit must be between 1 and {MAX_PAGE_LIMIT}"),
                json!({ "limit": limit }),
            ));
        }

        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::bad_request(
                "Page is too large",
                json!({ "page": page }),
            ));
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total_items: i64) -> i64 {
        (total_items + self.limit - 1) / self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PageRequest::new(None, None).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_offset() {
        let page = PageRequest::new(Some(3), Some(20)).unwrap();
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_bounds() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(100)).is_ok());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert!(PageRequest::new(Some(i64::MAX), Some(1)).is_ok());
        assert!(PageRequest::new(Some(i64::MAX), Some(10)).is_err());
    }

    #[test]
    fn test_total_pages() {
        let page = PageRequest::new(None, Some(10)).unwrap();
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
    }
}
