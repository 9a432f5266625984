//! Mapping between URL query parameters and [`QueryState`].
//!
//! Decoding never fails: absent or malformed fields fall back to the view's
//! defaults. Encoding is sparse: fields equal to their default are removed
//! from the parameters instead of being written, and keys the codec does not
//! own are carried over untouched.

use crate::config::{SortConfig, ViewConfig};
use crate::core::QueryState;
use crate::infra::params::RawParams;

/// Free-text search parameter.
pub const PARAM_QUERY: &str = "q";
/// Sort field parameter.
pub const PARAM_SORT_BY: &str = "sort_by";
/// Sort direction parameter (`"true"` / `"false"`).
pub const PARAM_DESCENDING: &str = "descending";
/// One-based page number parameter.
pub const PARAM_PAGE: &str = "page";
/// Page size parameter.
pub const PARAM_ROWS_PER_PAGE: &str = "rows_per_page";

/// Largest page index whose one-based page number still fits the URL field.
pub const MAX_PAGE_INDEX: u32 = u32::MAX - 1;

/// A single change to a [`QueryState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMutation {
    /// Set or clear the free-text search.
    SetSearch(Option<String>),
    /// Sort on a field. Sorting on the active field again flips the direction;
    /// a different field sorts ascending.
    Sort(String),
    /// Set the sort direction explicitly.
    SetSortDirection(bool),
    /// Replace the values of one filter. An empty list clears it.
    SetFilter {
        /// Filter key.
        key: String,
        /// Accepted values, in order.
        values: Vec<String>,
    },
    /// Remove every filter.
    ClearFilters,
    /// Jump to a zero-based page. Leaves every other field as is.
    SetPage(u32),
    /// Advance one page.
    NextPage,
    /// Go back one page, stopping at the first.
    PreviousPage,
    /// Change the page size. Sizes outside the allowed set are ignored.
    SetPageSize(u32),
    /// Return to the view defaults.
    Reset,
}

impl QueryMutation {
    /// Whether this mutation moves back to the first page.
    pub const fn resets_page(&self) -> bool {
        !matches!(self, Self::SetPage(_) | Self::NextPage | Self::PreviousPage)
    }
}

/// Bidirectional codec between raw URL parameters and [`QueryState`] for one view.
#[derive(Debug, Clone)]
pub struct QueryStateCodec {
    default_page_size: u32,
    allowed_page_sizes: Vec<u32>,
    default_sort: Option<SortConfig>,
    filter_keys: Vec<String>,
}

impl QueryStateCodec {
    /// Create a codec from view configuration.
    pub fn new(view: &ViewConfig) -> Self {
        let allowed_page_sizes = if view.allowed_page_sizes.is_empty() {
            vec![view.default_page_size]
        } else {
            view.allowed_page_sizes.clone()
        };
        Self {
            default_page_size: view.default_page_size,
            allowed_page_sizes,
            default_sort: view.default_sort.clone(),
            filter_keys: view.filter_keys.clone(),
        }
    }

    /// Keys decoded as filters.
    pub fn filter_keys(&self) -> &[String] {
        &self.filter_keys
    }

    /// Whether `key` is written by this codec.
    pub fn owns_key(&self, key: &str) -> bool {
        matches!(
            key,
            PARAM_QUERY | PARAM_SORT_BY | PARAM_DESCENDING | PARAM_PAGE | PARAM_ROWS_PER_PAGE
        ) || self.is_filter_key(key)
    }

    /// The query a view shows with an empty URL.
    pub fn defaults(&self) -> QueryState {
        self.decode(&RawParams::new())
    }

    /// Decode raw parameters, applying defaults to absent or malformed fields.
    pub fn decode(&self, raw: &RawParams) -> QueryState {
        let free_text_query = raw
            .get(PARAM_QUERY)
            .filter(|q| !q.trim().is_empty())
            .map(str::to_string);

        let sort_field = raw
            .get(PARAM_SORT_BY)
            .filter(|f| !f.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.default_sort.as_ref().map(|s| s.field.clone()));

        let sort_descending = sort_field.as_deref().is_some_and(|field| {
            match raw.get(PARAM_DESCENDING) {
                Some("true") => true,
                Some("false") => false,
                _ => self.default_direction(field),
            }
        });

        let filters = self
            .filter_keys
            .iter()
            .filter_map(|key| {
                let values = split_tokens(raw.get(key)?);
                (!values.is_empty()).then(|| (key.clone(), values))
            })
            .collect();

        let page_index = raw
            .get(PARAM_PAGE)
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .map_or(0, |p| p - 1);

        let page_size = raw
            .get(PARAM_ROWS_PER_PAGE)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|s| self.allowed_page_sizes.contains(s))
            .unwrap_or(self.default_page_size);

        QueryState {
            free_text_query,
            sort_field,
            sort_descending,
            filters,
            page_index,
            page_size,
        }
    }

    /// Encode `state` on top of `previous`.
    ///
    /// Keys owned by the codec are rewritten sparsely; all other keys of
    /// `previous` are preserved verbatim. An owned key whose decoded value
    /// is unchanged keeps the raw spelling it had in `previous`.
    pub fn encode(&self, state: &QueryState, previous: &RawParams) -> RawParams {
        let state = self.normalize(state.clone());
        let before = self.decode(previous);
        let mut out: RawParams = previous
            .iter()
            .filter(|(k, _)| !self.owns_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut put = |key: &str, unchanged: bool, canonical: String| {
            let value = previous
                .get(key)
                .filter(|_| unchanged)
                .map_or(canonical, str::to_string);
            out.insert(key, value);
        };

        if let Some(q) = &state.free_text_query {
            put(PARAM_QUERY, before.free_text_query == state.free_text_query, q.clone());
        }

        if let Some(field) = &state.sort_field {
            let default_field = self.default_sort.as_ref().map(|s| s.field.as_str());
            let direction_pinned = state.sort_descending != self.default_direction(field);
            let same_sort = before.sort_field == state.sort_field
                && before.sort_descending == state.sort_descending
                && previous.get(PARAM_SORT_BY).is_some_and(|f| !f.trim().is_empty());
            // A direction is never written without its field.
            if default_field != Some(field.as_str()) || direction_pinned {
                put(PARAM_SORT_BY, same_sort, field.clone());
            }
            if direction_pinned {
                put(PARAM_DESCENDING, same_sort, state.sort_descending.to_string());
            }
        }

        for (key, values) in &state.filters {
            put(key.as_str(), before.filters.get(key) == Some(values), values.join(","));
        }

        if state.page_index > 0 {
            put(
                PARAM_PAGE,
                before.page_index == state.page_index,
                (u64::from(state.page_index) + 1).to_string(),
            );
        }

        if state.page_size != self.default_page_size {
            put(
                PARAM_ROWS_PER_PAGE,
                before.page_size == state.page_size,
                state.page_size.to_string(),
            );
        }

        out
    }

    /// Apply `mutation` to `state`, producing a new normalized state.
    pub fn apply(&self, state: &QueryState, mutation: QueryMutation) -> QueryState {
        let mut next = state.clone();
        let resets_page = mutation.resets_page();

        match mutation {
            QueryMutation::SetSearch(text) => {
                next.free_text_query = text.filter(|t| !t.trim().is_empty());
            }
            QueryMutation::Sort(field) => {
                if field.trim().is_empty() {
                    return self.normalize(next);
                }
                if next.sort_field.as_deref() == Some(field.as_str()) {
                    next.sort_descending = !next.sort_descending;
                } else {
                    next.sort_field = Some(field);
                    next.sort_descending = false;
                }
            }
            QueryMutation::SetSortDirection(descending) => {
                next.sort_descending = descending;
            }
            QueryMutation::SetFilter { key, values } => {
                if !self.is_filter_key(&key) {
                    tracing::debug!("ignoring unknown filter key `{}`", key);
                    return self.normalize(next);
                }
                let values = clean_tokens(values);
                if values.is_empty() {
                    next.filters.remove(&key);
                } else {
                    next.filters.insert(key, values);
                }
            }
            QueryMutation::ClearFilters => next.filters.clear(),
            QueryMutation::SetPage(index) => next.page_index = index,
            QueryMutation::NextPage => next.page_index = next.page_index.saturating_add(1),
            QueryMutation::PreviousPage => next.page_index = next.page_index.saturating_sub(1),
            QueryMutation::SetPageSize(size) => {
                if !self.allowed_page_sizes.contains(&size) {
                    tracing::debug!("ignoring page size {} outside the allowed set", size);
                    return self.normalize(next);
                }
                next.page_size = size;
            }
            QueryMutation::Reset => return self.defaults(),
        }

        if resets_page {
            next.page_index = 0;
        }
        self.normalize(next)
    }

    /// Translate a single `key=value` write into a mutation.
    ///
    /// Malformed numbers fail closed to the first page or the default size.
    pub fn mutation_for_param(&self, key: &str, value: &str) -> QueryMutation {
        match key {
            PARAM_QUERY => QueryMutation::SetSearch(Some(value.to_string())),
            PARAM_SORT_BY => QueryMutation::Sort(value.to_string()),
            PARAM_DESCENDING => QueryMutation::SetSortDirection(value == "true"),
            PARAM_PAGE => QueryMutation::SetPage(
                value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .map_or(0, |p| p - 1),
            ),
            PARAM_ROWS_PER_PAGE => QueryMutation::SetPageSize(
                value.trim().parse().unwrap_or(self.default_page_size),
            ),
            _ => QueryMutation::SetFilter {
                key: key.to_string(),
                values: split_tokens(value),
            },
        }
    }

    /// Bring `state` into the canonical form `decode` produces.
    pub fn normalize(&self, mut state: QueryState) -> QueryState {
        state.free_text_query = state.free_text_query.filter(|q| !q.trim().is_empty());
        state.sort_field = state
            .sort_field
            .filter(|f| !f.trim().is_empty())
            .or_else(|| self.default_sort.as_ref().map(|s| s.field.clone()));
        if state.sort_field.is_none() {
            state.sort_descending = false;
        }
        state.filters = std::mem::take(&mut state.filters)
            .into_iter()
            .filter(|(key, _)| self.is_filter_key(key))
            .map(|(key, values)| (key, clean_tokens(values)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        if !self.allowed_page_sizes.contains(&state.page_size) {
            state.page_size = self.default_page_size;
        }
        state.page_index = state.page_index.min(MAX_PAGE_INDEX);
        state
    }

    fn is_filter_key(&self, key: &str) -> bool {
        self.filter_keys.iter().any(|k| k == key)
    }

    /// Direction used for `field` when the URL does not pin one.
    fn default_direction(&self, field: &str) -> bool {
        self.default_sort
            .as_ref()
            .is_some_and(|s| s.field == field && s.descending)
    }
}

fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_tokens(values: Vec<String>) -> Vec<String> {
    values.iter().flat_map(|v| split_tokens(v)).collect()
}
