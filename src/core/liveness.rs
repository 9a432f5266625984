//! Liveness checks deciding whether fetched data is still worth polling.
//!
//! All checks are pure: no I/O, no clocks, and any input (including stale or
//! empty data) yields a verdict. Absent data is never live.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::ViewConfig;
use crate::core::{Page, StatusBearing};

/// Result of a liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessVerdict {
    /// Whether the data may still change on its own.
    pub live: bool,
    /// Number of in-progress items found (0 or 1 for a single resource).
    pub in_progress: usize,
    /// Suggested delay before checking again; `None` when not live.
    pub next_check: Option<Duration>,
}

impl LivenessVerdict {
    /// Verdict for data that will not change without user action.
    pub const fn settled() -> Self {
        Self {
            live: false,
            in_progress: 0,
            next_check: None,
        }
    }
}

/// Status-set based liveness predicate shared by resource and page checks.
#[derive(Debug, Clone)]
pub struct LivenessPredicate {
    in_progress: HashSet<String>,
    interval: Duration,
}

impl LivenessPredicate {
    /// Build a predicate from in-progress statuses. Matching is case-insensitive.
    pub fn new<I, S>(in_progress: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            in_progress: in_progress
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            interval,
        }
    }

    /// Build a predicate from a view's status set and poll interval.
    pub fn from_config(view: &ViewConfig) -> Self {
        Self::new(&view.in_progress_statuses, view.poll_interval())
    }

    /// Whether `status` belongs to the in-progress set.
    pub fn is_in_progress(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| self.in_progress.contains(&s.trim().to_ascii_lowercase()))
    }

    /// A single resource is live while its status is in progress.
    pub fn is_live_resource<R: StatusBearing>(&self, resource: &R) -> bool {
        self.is_in_progress(resource.status())
    }

    /// A page is live if any item on it is in progress.
    pub fn is_live_page<R: StatusBearing>(&self, page: &Page<R>) -> bool {
        page.items.iter().any(|item| self.is_live_resource(item))
    }

    fn verdict(&self, in_progress: usize) -> LivenessVerdict {
        if in_progress == 0 {
            return LivenessVerdict::settled();
        }
        LivenessVerdict {
            live: true,
            in_progress,
            next_check: Some(self.interval),
        }
    }
}

/// Liveness check for one kind of fetched data.
pub trait Liveness<T>: Send + Sync + 'static {
    /// Verdict for fetched data.
    fn verdict(&self, data: &T) -> LivenessVerdict;

    /// Verdict for possibly absent data. Absent data is never live.
    fn verdict_of(&self, data: Option<&T>) -> LivenessVerdict {
        data.map_or_else(LivenessVerdict::settled, |d| self.verdict(d))
    }

    /// Shorthand for `verdict(data).live`.
    fn is_live(&self, data: &T) -> bool {
        self.verdict(data).live
    }
}

/// Liveness of a single resource (detail views).
#[derive(Debug, Clone)]
pub struct ResourceLiveness(LivenessPredicate);

impl ResourceLiveness {
    /// Wrap a predicate.
    pub const fn new(predicate: LivenessPredicate) -> Self {
        Self(predicate)
    }
}

impl<R: StatusBearing + 'static> Liveness<R> for ResourceLiveness {
    fn verdict(&self, data: &R) -> LivenessVerdict {
        self.0.verdict(usize::from(self.0.is_live_resource(data)))
    }
}

/// Liveness of a page of summaries (list views).
#[derive(Debug, Clone)]
pub struct PageLiveness(LivenessPredicate);

impl PageLiveness {
    /// Wrap a predicate.
    pub const fn new(predicate: LivenessPredicate) -> Self {
        Self(predicate)
    }
}

impl<R: StatusBearing + 'static> Liveness<Page<R>> for PageLiveness {
    fn verdict(&self, data: &Page<R>) -> LivenessVerdict {
        let count = data
            .items
            .iter()
            .filter(|item| self.0.is_live_resource(*item))
            .count();
        self.0.verdict(count)
    }
}

/// Liveness for data that never changes on its own (task or workflow lists).
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverLive;

impl<T> Liveness<T> for NeverLive {
    fn verdict(&self, _data: &T) -> LivenessVerdict {
        LivenessVerdict::settled()
    }
}
