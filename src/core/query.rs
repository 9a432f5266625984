//! Structured query and page value types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured view query decoded from the URL.
///
/// Never mutated in place by the synchronizer: every change produces a new
/// value that is written back through the codec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Free-text search.
    pub free_text_query: Option<String>,
    /// Active sort field, if any.
    pub sort_field: Option<String>,
    /// Sort direction. Always `false` when `sort_field` is `None`.
    pub sort_descending: bool,
    /// Multi-valued filters keyed by filter name. Empty lists are not stored.
    pub filters: BTreeMap<String, Vec<String>>,
    /// Zero-based page index.
    pub page_index: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl QueryState {
    /// Offset of the first row of this page.
    pub const fn offset(&self) -> u64 {
        self.page_index as u64 * self.page_size as u64
    }

    /// Values for a filter key, empty when the filter is not set.
    pub fn filter(&self, key: &str) -> &[String] {
        self.filters.get(key).map_or(&[], Vec::as_slice)
    }

    /// Whether a row with `value` under `key` passes this query's filter.
    /// An absent filter matches every row.
    pub fn filter_matches(&self, key: &str, value: &str) -> bool {
        let values = self.filter(key);
        values.is_empty() || values.iter().any(|v| v == value)
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in server order.
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Create a page.
    pub const fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    /// An empty page.
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the last page for the given page size (0 when there are no rows).
    pub fn last_page_index(&self, page_size: u32) -> u32 {
        if page_size == 0 || self.total_count == 0 {
            return 0;
        }
        let pages = self.total_count.div_ceil(u64::from(page_size));
        u32::try_from(pages - 1).unwrap_or(u32::MAX)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
