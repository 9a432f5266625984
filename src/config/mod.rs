//! Configuration models for views and dashboards.

pub mod view;

pub use view::{
    DashboardConfig, SortConfig, ViewConfig, CONFIG_PATH_ENV, DEFAULT_PAGE_SIZE,
    DEFAULT_PAGE_SIZES, DEFAULT_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, POLL_INTERVAL_ENV,
    RESERVED_KEYS,
};
