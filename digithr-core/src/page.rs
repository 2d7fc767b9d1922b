//! Offset pagination for list endpoints

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page request. Construct with [`PageRequest::new`] to get
/// clamped values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Missing or zero page becomes 1; limit is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slice an already-filtered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results. `total` counts every match, not just this page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Pagination block of a list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total.div_ceil(request.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_second_page_of_fifteen() {
        let request = PageRequest::new(Some(2), Some(10));
        let items = request.slice(1..=15);
        assert_eq!(items, vec![11, 12, 13, 14, 15]);
        assert_eq!(PageInfo::new(15, request).total_pages, 2);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let request = PageRequest::new(Some(4), Some(10));
        assert!(request.slice(1..=15).is_empty());
    }

    #[test]
    fn test_total_pages_zero_when_empty() {
        assert_eq!(PageInfo::new(0, PageRequest::default()).total_pages, 0);
    }
}
