//! Pagination
//!
//! `offset = (page - 1) * pageSize`, `pageCount = ceil(rowCount / pageSize)`.
//! Pages past the end are not clamped: they come back empty while
//! `pageCount` still reports the real total.

use serde::{Deserialize, Serialize};

use super::errors::{QueryError, QueryResult};

/// Page used when the caller omits `page`
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the caller omits `pageSize`
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A requested page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a request, defaulting absent values.
    ///
    /// # Errors
    ///
    /// `InvalidPage` if either value is 0.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> QueryResult<Self> {
        Self::with_default_size(page, page_size, DEFAULT_PAGE_SIZE)
    }

    /// Like [`PageRequest::new`] with a configured default page size
    pub fn with_default_size(
        page: Option<u64>,
        page_size: Option<u64>,
        default_size: u64,
    ) -> QueryResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.unwrap_or(default_size);
        if page == 0 {
            return Err(QueryError::InvalidPage { param: "page" });
        }
        if page_size == 0 {
            return Err(QueryError::InvalidPage { param: "pageSize" });
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows to skip
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Rows to take
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Pagination metadata returned next to a page of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub page: u64,
    pub page_size: u64,
    pub row_count: u64,
    pub page_count: u64,
}

impl PageResult {
    /// Computes page metadata from the filtered row count
    pub fn compute(request: &PageRequest, row_count: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            row_count,
            page_count: row_count.div_ceil(request.page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 10);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let req = PageRequest::new(Some(3), Some(10)).unwrap();
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn test_zero_rejected() {
        assert_eq!(
            PageRequest::new(Some(0), None),
            Err(QueryError::InvalidPage { param: "page" })
        );
        assert_eq!(
            PageRequest::new(None, Some(0)),
            Err(QueryError::InvalidPage { param: "pageSize" })
        );
    }

    #[test]
    fn test_page_count_is_ceiling() {
        for page_size in 1..=12u64 {
            for row_count in 0..=50u64 {
                let req = PageRequest::new(None, Some(page_size)).unwrap();
                let result = PageResult::compute(&req, row_count);
                let expected = (row_count + page_size - 1) / page_size;
                assert_eq!(result.page_count, expected);
                assert_eq!(result.page_count == 0, row_count == 0);
            }
        }
    }

    #[test]
    fn test_page_beyond_end_keeps_true_count() {
        let req = PageRequest::new(Some(3), Some(10)).unwrap();
        let result = PageResult::compute(&req, 20);
        assert_eq!(result.page, 3);
        assert_eq!(result.page_count, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let req = PageRequest::new(Some(2), Some(5)).unwrap();
        let json = serde_json::to_value(PageResult::compute(&req, 11)).unwrap();
        assert_eq!(json["pageSize"], 5);
        assert_eq!(json["rowCount"], 11);
        assert_eq!(json["pageCount"], 3);
    }
}
