use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::MAX_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
}

impl Meta {
    pub fn total(total: i64) -> Self {
        Self {
            total,
            page: None,
            page_size: None,
            total_pages: None,
        }
    }

    pub fn paginated(page: PageRequest, total: i64) -> Self {
        let size = page.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + size - 1) / size
        };

        Self {
            total,
            page: Some(page.page()),
            page_size: Some(size),
            total_pages: Some(total_pages),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Page selector accepted by list endpoints. Page sizes are fixed per listing
/// by `MarketplaceConfig`, so callers only choose the page.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PageQuery {
    pub fn with_size(self, page_size: i64) -> PageRequest {
        PageRequest::new(self.page, page_size)
    }
}

/// A resolved page: number plus the configured size for the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Highest page whose offset still fits in an `i64` at any allowed size
    pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.clamp(1, Self::MAX_PAGE),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offsets() {
        let first = PageRequest::new(1, 6);
        assert_eq!(first.offset(), 0);
        assert_eq!(first.limit(), 6);

        let third = PageRequest::new(3, 20);
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn test_page_request_clamps_page_and_size() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 1);

        let huge = PageRequest::new(-4, 10_000);
        assert_eq!(huge.page(), 1);
        assert_eq!(huge.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_caps_huge_page_numbers() {
        let last = PageRequest::new(i64::MAX, MAX_PAGE_SIZE);
        assert_eq!(last.page(), PageRequest::MAX_PAGE);
        assert!(last.offset() > 0);

        let small = PageRequest::new(i64::MAX, 6);
        assert!(small.offset() > 0);
        assert_eq!(small.offset(), (PageRequest::MAX_PAGE - 1) * 6);
    }

    #[test]
    fn test_meta_total_pages() {
        let meta = Meta::paginated(PageRequest::new(2, 6), 13);
        assert_eq!(meta.total, 13);
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.page_size, Some(6));
        assert_eq!(meta.total_pages, Some(3));

        let empty = Meta::paginated(PageRequest::new(1, 6), 0);
        assert_eq!(empty.total_pages, Some(0));
    }
}
