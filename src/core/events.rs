//! Synchronizer lifecycle events and sinks.
//!
//! Events mirror what the synchronizer does with each fetch and timer, which
//! makes supersession and teardown observable without reaching into its state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEventKind {
    /// A fetch cycle started.
    FetchStarted,
    /// A fetch result replaced the visible data.
    FetchApplied,
    /// A fetch failed and its message was surfaced.
    FetchFailed,
    /// A fetch outcome was dropped (superseded, cancelled or disposed).
    FetchDiscarded,
    /// The poll timer was armed.
    PollArmed,
    /// The poll timer was disarmed.
    PollDisarmed,
    /// A poll tick fired.
    PollTick,
    /// The synchronizer was torn down.
    Disposed,
}

impl fmt::Display for SyncEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchStarted => "fetch_started",
            Self::FetchApplied => "fetch_applied",
            Self::FetchFailed => "fetch_failed",
            Self::FetchDiscarded => "fetch_discarded",
            Self::PollArmed => "poll_armed",
            Self::PollDisarmed => "poll_disarmed",
            Self::PollTick => "poll_tick",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Synchronizer event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Synchronizer that emitted the event.
    pub synchronizer_id: Uuid,
    /// View name.
    pub view: String,
    /// What happened.
    pub kind: SyncEventKind,
    /// Fetch generation, for fetch events.
    pub generation: Option<u64>,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Event sink abstraction.
pub trait SyncEventSink: Send {
    /// Record an event.
    fn record(&mut self, event: SyncEvent);
}

/// Bounded in-memory sink for tests and dev. Clones share one buffer.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<SyncEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events` events.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Number of stored events of `kind`.
    pub fn count(&self, kind: SyncEventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Kinds of stored events, oldest first.
    pub fn kinds(&self) -> Vec<SyncEventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }
}

impl SyncEventSink for InMemoryEventSink {
    fn record(&mut self, event: SyncEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink forwarding every event to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl SyncEventSink for TracingEventSink {
    fn record(&mut self, event: SyncEvent) {
        tracing::debug!(
            synchronizer = %event.synchronizer_id,
            view = %event.view,
            kind = %event.kind,
            generation = event.generation,
            detail = event.detail.as_deref(),
            "sync event"
        );
    }
}

/// Helper to build an event from context.
pub fn build_sync_event(
    synchronizer_id: Uuid,
    view: impl Into<String>,
    kind: SyncEventKind,
    generation: Option<u64>,
    detail: Option<String>,
) -> SyncEvent {
    SyncEvent {
        event_id: Uuid::new_v4(),
        synchronizer_id,
        view: view.into(),
        kind,
        generation,
        created_at_ms: now_ms(),
        detail,
    }
}
