//! Query-string handling shared by the entity and combine endpoints.

use cov2k_core::{is_pagination_key, CoreError, Filter, PageWindow, Pagination, PaginationPolicy, DEFAULT_PAGE};

/// Query parameters split into pagination values and filter pairs.
#[derive(Debug, Default, PartialEq)]
pub struct RequestParams {
    pub limit: Option<u64>,
    pub page: Option<u64>,
    /// Filter pairs in request order, pagination keys removed.
    pub filters: Vec<(String, String)>,
}

impl RequestParams {
    pub fn split(pairs: Vec<(String, String)>) -> Result<Self, CoreError> {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "limit" => params.limit = Some(positive(&value)?),
                "page" => params.page = Some(positive(&value)?),
                _ => params.filters.push((key, value)),
            }
        }
        Ok(params)
    }

    /// Filter for a single resolver call. A repeated key keeps its last value.
    pub fn filter(&self) -> Filter {
        self.filters
            .iter()
            .fold(Filter::new(), |filter, (key, value)| filter.with(key.as_str(), value.as_str()))
    }

    /// Window for an entity endpoint under its pagination policy.
    pub fn window_for(&self, policy: PaginationPolicy, default_limit: u64) -> Result<Option<PageWindow>, CoreError> {
        match policy {
            PaginationPolicy::Optional => Ok(Pagination::optional(self.limit, self.page)?.window()),
            PaginationPolicy::Mandatory => self.mandatory_window(default_limit).map(Some),
        }
    }

    /// Window of a combine request; always present.
    pub fn mandatory_window(&self, default_limit: u64) -> Result<PageWindow, CoreError> {
        PageWindow::new(
            self.limit.unwrap_or(default_limit),
            self.page.unwrap_or(DEFAULT_PAGE),
        )
    }
}

fn positive(value: &str) -> Result<u64, CoreError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CoreError::InvalidPaginationValue),
    }
}

/// Number of distinct filter keys in a query, pagination keys excluded.
pub fn distinct_filter_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> usize {
    let mut seen: Vec<&str> = keys.into_iter().filter(|k| !is_pagination_key(k)).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
