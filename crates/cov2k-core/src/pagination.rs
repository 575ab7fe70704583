//! Page window normalisation.
//!
//! Two entry points exist. [`Pagination::optional`] is used by entities
//! that return everything unless both `limit` and `page` are given.
//! [`Pagination::mandatory`] always yields a window and is used by the
//! chain driver and by entities whose store applies `LIMIT/OFFSET` itself.

use serde::Serialize;

use crate::error::CoreError;

pub const DEFAULT_LIMIT: u64 = 200;
pub const DEFAULT_PAGE: u64 = 1;

/// A validated `{limit, page}` pair with a 1-indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageWindow {
    limit: u64,
    page: u64,
}

impl PageWindow {
    pub fn new(limit: u64, page: u64) -> Result<Self, CoreError> {
        if limit == 0 || page == 0 {
            return Err(CoreError::InvalidPaginationValue);
        }
        Ok(Self { limit, page })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn skip(&self) -> u64 {
        self.limit.saturating_mul(self.page - 1)
    }

    pub fn first_idx(&self) -> usize {
        usize::try_from(self.skip()).unwrap_or(usize::MAX)
    }

    pub fn last_idx(&self) -> usize {
        usize::try_from(self.skip().saturating_add(self.limit)).unwrap_or(usize::MAX)
    }

    /// Store pushdown for SQL backends.
    pub fn sql_fragment(&self, order_by: &str) -> String {
        format!(
            "ORDER BY {order_by} LIMIT {} OFFSET {}",
            self.limit,
            self.skip()
        )
    }

    /// Slice `[first_idx, last_idx)` out of `items`; out-of-range pages are empty.
    pub fn slice<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let first = self.first_idx();
        if first >= items.len() {
            return Vec::new();
        }
        items.truncate(self.last_idx());
        items.drain(..first);
        items
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

/// Outcome of normalising optional pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    Disabled,
    Window(PageWindow),
}

impl Pagination {
    pub fn optional(limit: Option<u64>, page: Option<u64>) -> Result<Self, CoreError> {
        match (limit, page) {
            (None, None) => Ok(Pagination::Disabled),
            (Some(limit), Some(page)) => PageWindow::new(limit, page).map(Pagination::Window),
            _ => Err(CoreError::IncompletePaginationParams),
        }
    }

    pub fn mandatory(limit: Option<u64>, page: Option<u64>) -> Result<PageWindow, CoreError> {
        PageWindow::new(limit.unwrap_or(DEFAULT_LIMIT), page.unwrap_or(DEFAULT_PAGE))
    }

    pub fn window(&self) -> Option<PageWindow> {
        match self {
            Pagination::Disabled => None,
            Pagination::Window(w) => Some(*w),
        }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        match self {
            Pagination::Disabled => items,
            Pagination::Window(w) => w.slice(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_window_indices() {
        let w = PageWindow::new(10, 2).unwrap();
        assert_eq!(w.skip(), 10);
        assert_eq!(w.first_idx(), 10);
        assert_eq!(w.last_idx(), 20);
    }

    #[test]
    fn test_optional_requires_both_or_neither() {
        assert_eq!(Pagination::optional(None, None).unwrap(), Pagination::Disabled);
        assert!(matches!(
            Pagination::optional(None, Some(2)),
            Err(CoreError::IncompletePaginationParams)
        ));
        assert!(matches!(
            Pagination::optional(Some(10), None),
            Err(CoreError::IncompletePaginationParams)
        ));
    }

    #[test]
    fn test_disabled_returns_everything() {
        let items: Vec<u32> = (0..500).collect();
        assert_eq!(Pagination::Disabled.apply(items.clone()), items);
    }

    #[test]
    fn test_mandatory_defaults() {
        let w = Pagination::mandatory(None, None).unwrap();
        assert_eq!((w.limit(), w.page()), (200, 1));
        let w = Pagination::mandatory(Some(5), None).unwrap();
        assert_eq!((w.limit(), w.page()), (5, 1));
    }

    #[test_case(0, 1; "zero limit")]
    #[test_case(10, 0; "zero page")]
    fn test_zero_values_are_invalid(limit: u64, page: u64) {
        assert!(matches!(
            PageWindow::new(limit, page),
            Err(CoreError::InvalidPaginationValue)
        ));
    }

    #[test_case(3, 1, vec![0, 1, 2]; "first page")]
    #[test_case(3, 3, vec![6]; "partial last page")]
    #[test_case(3, 4, vec![]; "past the end")]
    fn test_slice(limit: u64, page: u64, expected: Vec<u32>) {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(PageWindow::new(limit, page).unwrap().slice(items), expected);
    }

    #[test]
    fn test_sql_fragment() {
        let w = PageWindow::new(50, 3).unwrap();
        assert_eq!(w.sql_fragment("sequence_id"), "ORDER BY sequence_id LIMIT 50 OFFSET 100");
    }
}
