//! View-facing state machine composing codec, supersession, liveness and polling.
//!
//! ```text
//! Idle -> Loading -> {Ready, Failed}
//! Ready | Failed -> Loading        (param change or poll tick)
//! any -> Disposed                  (absorbing)
//! ```
//!
//! The URL parameter store is the only durable input. Every cycle decodes it
//! afresh, and every mutator goes through the codec and writes back to it; the
//! store's change notification then drives the next cycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::events::{build_sync_event, SyncEventKind, SyncEventSink};
use super::poll::{tick_fn, PollScheduler, PollStats};
use super::supersession::{ControllerStats, RequestSupersessionController};
use super::{
    FetchError, FetchScope, Liveness, QueryFetcher, QueryMutation, QueryState, QueryStateCodec,
    Spawn, SyncError,
};
use crate::config::ViewConfig;
use crate::infra::params::ParamStore;

/// Lifecycle phase of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Nothing fetched yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Last fetch succeeded.
    Ready,
    /// Last fetch failed; previous data, if any, is still visible.
    Failed,
    /// Torn down; no further transitions.
    Disposed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// What a view renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot<T> {
    /// Query decoded for the latest cycle.
    pub query: QueryState,
    /// Last successfully fetched data.
    pub data: Option<T>,
    /// Lifecycle phase.
    pub phase: SyncPhase,
    /// Whether a fetch is in flight.
    pub is_loading: bool,
    /// Message of the last transient failure, until dismissed or replaced.
    pub error_message: Option<String>,
    /// Whether the last applied data was live.
    pub live: bool,
    /// Incremented on every state change.
    pub version: u64,
}

impl<T> SyncSnapshot<T> {
    fn initial(query: QueryState) -> Self {
        Self {
            query,
            data: None,
            phase: SyncPhase::Idle,
            is_loading: false,
            error_message: None,
            live: false,
            version: 0,
        }
    }
}

/// What started a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleCause {
    Initial,
    ParamsChanged,
    PollTick,
    Manual,
}

impl fmt::Display for CycleCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::ParamsChanged => "params_changed",
            Self::PollTick => "poll_tick",
            Self::Manual => "manual",
        };
        f.write_str(name)
    }
}

type SharedSink = Arc<Mutex<Box<dyn SyncEventSink>>>;

struct Inner<T, S> {
    id: Uuid,
    view: String,
    codec: QueryStateCodec,
    scope: FetchScope,
    params: Arc<dyn ParamStore>,
    controller: RequestSupersessionController<T>,
    poll: PollScheduler<S>,
    liveness: Arc<dyn Liveness<T>>,
    spawner: S,
    state: watch::Sender<SyncSnapshot<T>>,
    events: Option<SharedSink>,
    lifecycle: CancellationToken,
    disposed: AtomicBool,
}

/// Orchestrates fetching, supersession and polling for one view.
///
/// Dropping the synchronizer disposes it.
pub struct ResultSynchronizer<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<T, S>>,
}

impl<T, S> ResultSynchronizer<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a synchronizer and start its first cycle.
    ///
    /// Prefer [`SynchronizerBuilder`](crate::builders::SynchronizerBuilder).
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        view: &ViewConfig,
        scope: FetchScope,
        params: Arc<dyn ParamStore>,
        fetcher: Arc<dyn QueryFetcher<T>>,
        liveness: Arc<dyn Liveness<T>>,
        spawner: S,
        events: Option<Box<dyn SyncEventSink>>,
    ) -> Self {
        let codec = QueryStateCodec::new(view);
        let initial_query = codec.decode(&params.snapshot());
        let (state, _rx) = watch::channel(SyncSnapshot::initial(initial_query));

        let inner = Arc::new(Inner {
            id: Uuid::new_v4(),
            view: view.name.clone(),
            codec,
            scope,
            params,
            controller: RequestSupersessionController::new(fetcher),
            poll: PollScheduler::new(spawner.clone()),
            liveness,
            spawner,
            state,
            events: events.map(|sink| Arc::new(Mutex::new(sink))),
            lifecycle: CancellationToken::new(),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        inner.poll.configure(
            view.poll_interval(),
            tick_fn(move || {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.emit(SyncEventKind::PollTick, None, None);
                        let _ = inner.cycle(CycleCause::PollTick).await;
                    }
                }
            }),
        );

        info!(view = %inner.view, id = %inner.id, "synchronizer started");
        Inner::watch_params(&inner);
        Inner::spawn_cycle(&inner, CycleCause::Initial);
        Self { inner }
    }

    /// Identifier used in logs and events.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// View name.
    pub fn view(&self) -> &str {
        &self.inner.view
    }

    /// Codec used for this view.
    pub fn codec(&self) -> &QueryStateCodec {
        &self.inner.codec
    }

    /// Current state.
    pub fn snapshot(&self) -> SyncSnapshot<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot<T>> {
        self.inner.state.subscribe()
    }

    /// Query decoded for the latest cycle.
    pub fn query_state(&self) -> QueryState {
        self.inner.state.borrow().query.clone()
    }

    /// Last successfully fetched data.
    pub fn data(&self) -> Option<T> {
        self.inner.state.borrow().data.clone()
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// Message of the last transient failure.
    pub fn error_message(&self) -> Option<String> {
        self.inner.state.borrow().error_message.clone()
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SyncPhase {
        self.inner.state.borrow().phase
    }

    /// Whether the poll timer is armed.
    pub fn is_polling(&self) -> bool {
        self.inner.poll.is_armed()
    }

    /// Poll timer counters.
    pub fn poll_stats(&self) -> PollStats {
        self.inner.poll.stats()
    }

    /// Supersession counters.
    pub fn controller_stats(&self) -> ControllerStats {
        self.inner.controller.stats()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Apply `mutation` through the codec and write the result to the URL.
    /// The write triggers the next fetch cycle.
    pub fn mutate(&self, mutation: QueryMutation) -> Result<QueryState, SyncError> {
        self.inner.ensure_active()?;
        let previous = self.inner.params.snapshot();
        let current = self.inner.codec.decode(&previous);
        let next = self.inner.codec.apply(&current, mutation);
        self.inner
            .params
            .write(self.inner.codec.encode(&next, &previous));
        Ok(next)
    }

    /// Write a single URL parameter, interpreted by the codec.
    pub fn set_query_param(&self, key: &str, value: &str) -> Result<QueryState, SyncError> {
        let mutation = self.inner.codec.mutation_for_param(key, value);
        self.mutate(mutation)
    }

    /// Set the free-text search. An empty string clears it.
    pub fn set_search(&self, text: impl Into<String>) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::SetSearch(Some(text.into())))
    }

    /// Sort on `field`, flipping the direction if it is already active.
    pub fn set_sort(&self, field: impl Into<String>) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::Sort(field.into()))
    }

    /// Set the sort direction.
    pub fn set_sort_direction(&self, descending: bool) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::SetSortDirection(descending))
    }

    /// Replace one filter's values.
    pub fn set_filter<I, V>(&self, key: impl Into<String>, values: I) -> Result<QueryState, SyncError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.mutate(QueryMutation::SetFilter {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Remove all filters.
    pub fn clear_filters(&self) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::ClearFilters)
    }

    /// Jump to a zero-based page.
    pub fn set_page(&self, page_index: u32) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::SetPage(page_index))
    }

    /// Advance one page.
    pub fn next_page(&self) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::NextPage)
    }

    /// Go back one page.
    pub fn previous_page(&self) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::PreviousPage)
    }

    /// Change the page size.
    pub fn set_page_size(&self, page_size: u32) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::SetPageSize(page_size))
    }

    /// Return to the view defaults.
    pub fn reset(&self) -> Result<QueryState, SyncError> {
        self.mutate(QueryMutation::Reset)
    }

    /// Start a fetch cycle for the current URL without changing it.
    pub fn refresh(&self) -> Result<(), SyncError> {
        self.inner.ensure_active()?;
        Inner::spawn_cycle(&self.inner, CycleCause::Manual);
        Ok(())
    }

    /// Run a fetch cycle for the current URL and wait for it to settle.
    ///
    /// Resolves to `Err(SyncError::Cancelled)` if a newer cycle superseded it.
    pub async fn sync_now(&self) -> Result<(), SyncError> {
        self.inner.cycle(CycleCause::Manual).await
    }

    /// Clear the error message, keeping data and phase.
    pub fn dismiss_error(&self) {
        if self.inner.is_disposed() {
            return;
        }
        self.inner.state.send_if_modified(|s| {
            if s.error_message.is_none() {
                return false;
            }
            s.error_message = None;
            s.version += 1;
            true
        });
    }

    /// Tear down: cancel the fetch in flight, stop polling and stop watching
    /// the URL. Runs once; later calls do nothing.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<T, S> Drop for ResultSynchronizer<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<T, S> Inner<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_active(&self) -> Result<(), SyncError> {
        if self.is_disposed() {
            return Err(SyncError::Disposed);
        }
        Ok(())
    }

    fn watch_params(this: &Arc<Self>) {
        let mut rx = this.params.subscribe();
        let weak: Weak<Self> = Arc::downgrade(this);
        let lifecycle = this.lifecycle.clone();
        let span = info_span!("url_watch", view = %this.view);

        this.spawner.spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;
                        () = lifecycle.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                    let Some(inner) = weak.upgrade() else { break };
                    Self::spawn_cycle(&inner, CycleCause::ParamsChanged);
                }
                debug!("url watcher exited");
            }
            .instrument(span),
        );
    }

    fn spawn_cycle(this: &Arc<Self>, cause: CycleCause) {
        let inner = Arc::clone(this);
        let span = info_span!("sync_cycle", view = %this.view, %cause);
        this.spawner.spawn(
            async move {
                let _ = inner.cycle(cause).await;
            }
            .instrument(span),
        );
    }

    async fn cycle(&self, cause: CycleCause) -> Result<(), SyncError> {
        self.ensure_active()?;
        // Claim the generation before reading the URL so a write that lands
        // after this read always starts a newer cycle.
        let token = self.controller.begin()?;
        let generation = token.generation();
        let query = self.codec.decode(&self.params.snapshot());

        debug!(generation, %cause, "fetch cycle started");
        self.state.send_if_modified(|s| {
            if s.phase == SyncPhase::Disposed || !self.controller.is_current(&token) {
                return false;
            }
            s.query = query.clone();
            s.phase = SyncPhase::Loading;
            s.is_loading = true;
            s.version += 1;
            true
        });
        self.emit(
            SyncEventKind::FetchStarted,
            Some(generation),
            Some(cause.to_string()),
        );

        let result = self
            .controller
            .run_with(token, query, self.scope.clone(), |outcome| {
                self.commit(generation, outcome);
            })
            .await;

        if let Err(err) = &result {
            debug!(generation, %err, "fetch outcome discarded");
            self.emit(
                SyncEventKind::FetchDiscarded,
                Some(generation),
                Some(err.to_string()),
            );
        }
        result
    }

    /// Apply the outcome of the current fetch. Runs under the controller lock.
    fn commit(&self, generation: u64, outcome: Result<T, FetchError>) {
        if self.is_disposed() {
            debug!(generation, "outcome dropped after dispose");
            return;
        }
        match outcome {
            Ok(data) => {
                let verdict = self.liveness.verdict(&data);
                self.state.send_modify(|s| {
                    s.data = Some(data);
                    s.error_message = None;
                    s.phase = SyncPhase::Ready;
                    s.is_loading = false;
                    s.live = verdict.live;
                    s.version += 1;
                });
                self.emit(SyncEventKind::FetchApplied, Some(generation), None);
                self.reschedule(verdict.live);
            }
            Err(FetchError::Failed(message)) => {
                warn!(view = %self.view, generation, "fetch failed: {}", message);
                self.state.send_modify(|s| {
                    s.error_message = Some(message.clone());
                    s.phase = SyncPhase::Failed;
                    s.is_loading = false;
                    s.version += 1;
                });
                // Polling stays as it is: a failing endpoint is not assumed
                // live, but an armed timer keeps probing for recovery.
                self.emit(SyncEventKind::FetchFailed, Some(generation), Some(message));
            }
            Err(FetchError::Cancelled) => {
                self.state.send_modify(|s| {
                    s.phase = if s.error_message.is_some() {
                        SyncPhase::Failed
                    } else if s.data.is_some() {
                        SyncPhase::Ready
                    } else {
                        SyncPhase::Idle
                    };
                    s.is_loading = false;
                    s.version += 1;
                });
                self.emit(
                    SyncEventKind::FetchDiscarded,
                    Some(generation),
                    Some("aborted by transport".into()),
                );
            }
        }
    }

    fn reschedule(&self, live: bool) {
        let was_armed = self.poll.is_armed();
        self.poll.reschedule(live);
        match (was_armed, self.poll.is_armed()) {
            (false, true) => self.emit(SyncEventKind::PollArmed, None, None),
            (true, false) => self.emit(SyncEventKind::PollDisarmed, None, None),
            _ => {}
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.lifecycle.cancel();
        self.controller.dispose();
        self.poll.stop();
        self.state.send_modify(|s| {
            s.phase = SyncPhase::Disposed;
            s.is_loading = false;
            s.version += 1;
        });
        self.emit(SyncEventKind::Disposed, None, None);
        info!(view = %self.view, id = %self.id, "synchronizer disposed");
    }

    fn emit(&self, kind: SyncEventKind, generation: Option<u64>, detail: Option<String>) {
        if let Some(sink) = self.events.as_ref() {
            sink.lock().record(build_sync_event(
                self.id,
                self.view.clone(),
                kind,
                generation,
                detail,
            ));
        }
    }
}
