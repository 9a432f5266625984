//! View and dashboard configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, EntityKind, ExecutionPhase};

/// Page sizes offered by list views unless configured otherwise.
pub const DEFAULT_PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];
/// Page size used when the URL does not carry one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Poll interval for live data.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
/// Lower bound on the poll interval; anything smaller is a busy loop.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
/// Query keys owned by the codec; filter keys may not reuse them.
pub const RESERVED_KEYS: [&str; 5] = ["q", "sort_by", "descending", "page", "rows_per_page"];
/// Environment variable naming the dashboard config JSON file.
pub const CONFIG_PATH_ENV: &str = "LIVE_QUERY_CONFIG";
/// Environment variable overriding every view's poll interval.
pub const POLL_INTERVAL_ENV: &str = "LIVE_QUERY_POLL_INTERVAL_MS";

/// Default sort of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Field sorted on when the URL has no `sort_by`.
    pub field: String,
    /// Direction used when the URL has no `descending`.
    #[serde(default)]
    pub descending: bool,
}

/// Configuration of a single list or detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// View identifier.
    pub name: String,
    /// Entity kind shown by the view.
    #[serde(default)]
    pub entity: Option<EntityKind>,
    /// Page size when the URL does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Page sizes accepted from the URL.
    #[serde(default = "default_allowed_page_sizes")]
    pub allowed_page_sizes: Vec<u32>,
    /// Sort applied when the URL does not specify one.
    #[serde(default)]
    pub default_sort: Option<SortConfig>,
    /// Query keys decoded as comma-joined filters.
    #[serde(default)]
    pub filter_keys: Vec<String>,
    /// Poll interval while data is live.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Statuses considered in-progress.
    #[serde(default = "ExecutionPhase::in_progress_defaults")]
    pub in_progress_statuses: Vec<String>,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_allowed_page_sizes() -> Vec<u32> {
    DEFAULT_PAGE_SIZES.to_vec()
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ViewConfig {
    /// A view with default paging, no sort and no filters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            allowed_page_sizes: default_allowed_page_sizes(),
            default_sort: None,
            filter_keys: Vec::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            in_progress_statuses: ExecutionPhase::in_progress_defaults(),
        }
    }

    /// Preset for a view listing `entity`.
    pub fn for_entity(name: impl Into<String>, entity: EntityKind) -> Self {
        let (sort, descending, filters): (&str, bool, &[&str]) = match entity {
            EntityKind::Execution => ("created_at", true, &["status", "version", "launch_plan"]),
            EntityKind::NodeExecution => ("created_at", false, &["status"]),
            EntityKind::Task | EntityKind::Workflow | EntityKind::LaunchPlan => {
                ("name", false, &["state"])
            }
        };
        Self {
            entity: Some(entity),
            default_sort: Some(SortConfig {
                field: sort.to_string(),
                descending,
            }),
            filter_keys: filters.iter().map(|k| (*k).to_string()).collect(),
            // Definitions never change on their own.
            in_progress_statuses: if entity.has_phase() {
                ExecutionPhase::in_progress_defaults()
            } else {
                Vec::new()
            },
            ..Self::new(name)
        }
    }

    /// Set the default sort.
    #[must_use]
    pub fn with_default_sort(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.default_sort = Some(SortConfig {
            field: field.into(),
            descending,
        });
        self
    }

    /// Replace the filter keys.
    #[must_use]
    pub fn with_filter_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the default page size.
    #[must_use]
    pub const fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Replace the in-progress status set.
    #[must_use]
    pub fn with_in_progress_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.in_progress_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Poll interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate view configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if self.allowed_page_sizes.is_empty() {
            return Err("allowed_page_sizes must not be empty".into());
        }
        if self.allowed_page_sizes.contains(&0) {
            return Err("allowed_page_sizes must be greater than 0".into());
        }
        if !self.allowed_page_sizes.contains(&self.default_page_size) {
            return Err(format!(
                "default_page_size {} is not one of allowed_page_sizes",
                self.default_page_size
            ));
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(format!(
                "poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
            ));
        }
        if let Some(sort) = &self.default_sort {
            if sort.field.trim().is_empty() {
                return Err("default_sort.field must not be empty".into());
            }
        }
        for key in &self.filter_keys {
            if key.is_empty() {
                return Err("filter keys must not be empty".into());
            }
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(format!("filter key `{key}` is reserved"));
            }
        }
        Ok(())
    }
}

/// Root dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Map of view name to configuration.
    pub views: HashMap<String, ViewConfig>,
}

impl DashboardConfig {
    /// Validate all views and ensure at least one view exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.views.is_empty() {
            return Err("at least one view must be defined".into());
        }
        for (name, view) in &self.views {
            view.validate()
                .map_err(|e| format!("view `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Look up a view by name.
    pub fn view(&self, name: &str) -> Option<&ViewConfig> {
        self.views.get(name)
    }

    /// Parse dashboard configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the file named by `LIVE_QUERY_CONFIG`, after
    /// reading `.env` if present. `LIVE_QUERY_POLL_INTERVAL_MS` overrides the
    /// poll interval of every view.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read dashboard config `{path}`"))?;
        let mut cfg = Self::from_json_str(&raw).map_err(anyhow::Error::msg)?;

        if let Ok(value) = std::env::var(POLL_INTERVAL_ENV) {
            let interval: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{POLL_INTERVAL_ENV} must be an integer"))?;
            cfg.override_poll_interval(interval);
            cfg.validate().map_err(anyhow::Error::msg)?;
        }
        tracing::info!("loaded {} dashboard views from {}", cfg.views.len(), path);
        Ok(cfg)
    }

    /// Apply one poll interval to every view.
    pub fn override_poll_interval(&mut self, poll_interval_ms: u64) {
        for view in self.views.values_mut() {
            view.poll_interval_ms = poll_interval_ms;
        }
    }
}
