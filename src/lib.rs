//! # Live Query
//!
//! Live query synchronization core for dashboards that list and monitor
//! long-running server-side jobs (tasks, workflows and their executions).
//!
//! Every list and detail view of such a dashboard needs the same loop: read a
//! structured query from the URL, fetch a page (or a single resource), drop any
//! stale request when the query changes, and keep polling while the data is
//! still changing. This crate implements that loop once.
//!
//! ## Components
//!
//! - **`QueryStateCodec`**: sparse, idempotent mapping between URL parameters
//!   and a structured [`core::QueryState`]
//! - **`LivenessPredicate`**: pure check deciding whether fetched data is
//!   still worth polling
//! - **`RequestSupersessionController`**: at most one outstanding request per
//!   consumer; superseded results are discarded by token identity
//! - **`PollScheduler`**: a single, non-overlapping repeating timer with an
//!   idempotent `reschedule` entry point
//! - **`ResultSynchronizer`**: the view-facing state machine composing all of
//!   the above
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use live_query::builders::SynchronizerBuilder;
//! use live_query::config::ViewConfig;
//! use live_query::core::{EntityKind, FnFetcher, LivenessPredicate, Page, PageLiveness};
//! use live_query::infra::params::{InMemoryParamStore, RawParams};
//! use live_query::runtime::TokioSpawner;
//!
//! let view = ViewConfig::for_entity("executions", EntityKind::Execution);
//! let params = Arc::new(InMemoryParamStore::new(RawParams::parse("?status=running")));
//! let liveness = PageLiveness::new(LivenessPredicate::from_config(&view));
//!
//! let sync = SynchronizerBuilder::new(view)
//!     .build(params, fetcher, liveness, TokioSpawner::current())?;
//!
//! let mut snapshots = sync.subscribe();
//! sync.set_sort("name")?;
//! sync.next_page()?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Query codec, liveness, supersession, polling and the synchronizer.
pub mod core;
/// Configuration models for views and dashboards.
pub mod config;
/// Builders to construct synchronizers from configuration.
pub mod builders;
/// Infrastructure adapters for the URL parameter store.
pub mod infra;
/// Runtime adapters and view-facing snapshot models.
pub mod runtime;
/// Shared utilities.
pub mod util;
