//! Page-based pagination of list reads.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size a caller may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number starting at 1.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a request, clamping page to at least 1 and limit to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Items across all pages.
    pub total: usize,
    /// This page number.
    pub page: u32,
    /// Number of pages.
    pub total_pages: u32,
}

/// Cuts one page out of an already filtered and sorted list.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let limit = request.limit.max(1) as usize;
    let total_pages = total.div_ceil(limit) as u32;
    let skip = (request.page.max(1) as usize - 1).saturating_mul(limit);
    let items = items.into_iter().skip(skip).take(limit).collect();
    Page {
        items,
        total,
        page: request.page.max(1),
        total_pages,
    }
}
