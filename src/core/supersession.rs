//! Request supersession: at most one outstanding logical request per consumer.
//!
//! Every run takes a fresh [`FetchToken`] and cancels the one before it.
//! Whether a result may be applied is decided by comparing token generations
//! at resolution time, never by completion order, so a slow superseded
//! request can not overwrite the result of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

use super::{FetchError, FetchScope, QueryFetcher, QueryState, SyncError};

/// Cancellation handle owned by one in-flight fetch.
#[derive(Debug, Clone)]
pub struct FetchToken {
    generation: u64,
    cancel: CancellationToken,
}

impl FetchToken {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
        }
    }

    /// Issuance number; later fetches have larger generations.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this fetch has been superseded or its owner disposed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes once the token is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Underlying token, for transports that take a [`CancellationToken`].
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

struct ControllerState {
    active: Option<FetchToken>,
    next_generation: u64,
    disposed: bool,
}

/// Counters describing controller activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Fetches started.
    pub issued: u64,
    /// Fetches whose outcome was discarded.
    pub discarded: u64,
}

/// Wraps a [`QueryFetcher`] so that only the latest run can deliver a result.
pub struct RequestSupersessionController<T> {
    fetcher: Arc<dyn QueryFetcher<T>>,
    state: Mutex<ControllerState>,
    issued: AtomicU64,
    discarded: AtomicU64,
}

impl<T: Send + 'static> RequestSupersessionController<T> {
    /// Create a controller around `fetcher`.
    pub fn new(fetcher: Arc<dyn QueryFetcher<T>>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(ControllerState {
                active: None,
                next_generation: 1,
                disposed: false,
            }),
            issued: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Run `query`, superseding any run still in flight.
    ///
    /// Superseded runs resolve to [`SyncError::Cancelled`], runs after
    /// [`dispose`](Self::dispose) to [`SyncError::Disposed`]. Both are meant
    /// to be dropped silently.
    pub async fn run(&self, query: QueryState, scope: FetchScope) -> Result<T, SyncError> {
        self.run_then(query, scope, |outcome| outcome)
            .await?
            .map_err(SyncError::from)
    }

    /// Run `query` and hand the outcome of the fetch to `commit`.
    ///
    /// `commit` is only called for the most recently started run, and it runs
    /// while the controller is locked: no newer run can start between the
    /// identity check and whatever `commit` writes. It receives
    /// `Err(FetchError::Cancelled)` only when the transport aborted on its own.
    pub async fn run_then<F, R>(
        &self,
        query: QueryState,
        scope: FetchScope,
        commit: F,
    ) -> Result<R, SyncError>
    where
        F: FnOnce(Result<T, FetchError>) -> R,
    {
        let token = self.begin()?;
        self.run_with(token, query, scope, commit).await
    }

    /// Like [`run_then`](Self::run_then) with a token obtained from
    /// [`begin`](Self::begin), for callers that need the generation up front.
    pub async fn run_with<F, R>(
        &self,
        token: FetchToken,
        query: QueryState,
        scope: FetchScope,
        commit: F,
    ) -> Result<R, SyncError>
    where
        F: FnOnce(Result<T, FetchError>) -> R,
    {
        let generation = token.generation();

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(FetchError::Cancelled),
            result = self.fetcher.fetch(query, scope, token.clone()) => result,
        };

        let mut state = self.state.lock();
        if state.disposed {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(generation, "dropping fetch outcome after dispose");
            return Err(SyncError::Disposed);
        }
        if state.active.as_ref().map(FetchToken::generation) != Some(generation) {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(generation, "dropping superseded fetch outcome");
            return Err(SyncError::Cancelled);
        }
        state.active = None;
        Ok(commit(outcome))
    }

    /// Issue a new token, cancelling the active one.
    pub fn begin(&self) -> Result<FetchToken, SyncError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(SyncError::Disposed);
        }
        let token = FetchToken::new(state.next_generation);
        state.next_generation += 1;
        if let Some(previous) = state.active.replace(token.clone()) {
            debug!(
                superseded = previous.generation(),
                generation = token.generation(),
                "superseding in-flight fetch"
            );
            previous.cancel();
        }
        self.issued.fetch_add(1, Ordering::Relaxed);
        Ok(token)
    }

    /// Whether `token` is the one currently allowed to deliver.
    pub fn is_current(&self, token: &FetchToken) -> bool {
        let state = self.state.lock();
        !state.disposed
            && state
                .active
                .as_ref()
                .is_some_and(|active| active.generation() == token.generation())
    }

    /// Generation of the fetch in flight, if any.
    pub fn active_generation(&self) -> Option<u64> {
        self.state.lock().active.as_ref().map(FetchToken::generation)
    }

    /// Cancel the fetch in flight without disposing.
    pub fn cancel(&self) {
        if let Some(active) = self.state.lock().active.take() {
            debug!(generation = active.generation(), "cancelling in-flight fetch");
            active.cancel();
        }
    }

    /// Cancel the fetch in flight and refuse further runs. Idempotent.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        if let Some(active) = state.active.take() {
            active.cancel();
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    /// Activity counters.
    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            issued: self.issued.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}
