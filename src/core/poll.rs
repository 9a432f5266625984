//! Repeating poll timer with an idempotent `reschedule` entry point.
//!
//! A scheduler owns at most one [`PollHandle`]. Each handle drives one spawned
//! loop that awaits every tick to completion before waiting for the next
//! interval, so ticks never overlap. Intervals that elapse while a tick is
//! still running are skipped rather than queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Spawn;

/// Future returned by a poll tick.
pub type TickFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked on every tick.
pub type Tick = Arc<dyn Fn() -> TickFuture + Send + Sync + 'static>;

/// Wrap an async closure as a [`Tick`].
pub fn tick_fn<F, Fut>(f: F) -> Tick
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as TickFuture)
}

/// Owns a running timer loop. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    id: u64,
    cancel: CancellationToken,
}

impl PollHandle {
    /// Identifier of this arming.
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Whether a timer is currently armed.
    pub armed: bool,
    /// Number of times a timer was armed.
    pub arms: u64,
    /// Number of ticks that ran.
    pub ticks: u64,
    /// Number of intervals skipped because a tick was still running.
    pub skipped: u64,
}

#[derive(Default)]
struct PollCounters {
    arms: AtomicU64,
    ticks: AtomicU64,
    skipped: AtomicU64,
}

struct PollConfig {
    interval: Duration,
    tick: Tick,
}

struct PollState {
    config: Option<PollConfig>,
    handle: Option<PollHandle>,
    next_id: u64,
}

/// Manages a single repeating timer.
pub struct PollScheduler<S> {
    spawner: S,
    state: Mutex<PollState>,
    counters: Arc<PollCounters>,
}

impl<S> PollScheduler<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create an unconfigured, disarmed scheduler.
    pub fn new(spawner: S) -> Self {
        Self {
            spawner,
            state: Mutex::new(PollState {
                config: None,
                handle: None,
                next_id: 1,
            }),
            counters: Arc::new(PollCounters::default()),
        }
    }

    /// Create a scheduler configured with `interval` and `tick`, not yet armed.
    pub fn with_tick(spawner: S, interval: Duration, tick: Tick) -> Self {
        let scheduler = Self::new(spawner);
        scheduler.configure(interval, tick);
        scheduler
    }

    /// Set the interval and callback used by later arming. An armed timer
    /// keeps its old settings until it is re-armed.
    pub fn configure(&self, interval: Duration, tick: Tick) {
        self.state.lock().config = Some(PollConfig { interval, tick });
    }

    /// Configure and arm, replacing any armed timer.
    pub fn start(&self, interval: Duration, tick: Tick) {
        let mut state = self.state.lock();
        state.config = Some(PollConfig { interval, tick });
        state.handle = None;
        self.arm_locked(&mut state);
    }

    /// Disarm. Safe to call any number of times, including from teardown.
    pub fn stop(&self) {
        let handle = self.state.lock().handle.take();
        if let Some(handle) = handle {
            info!(poll_id = handle.id(), "poll timer disarmed");
        }
    }

    /// Arm when `should_be_live` and disarmed, disarm when not live and
    /// armed, otherwise do nothing.
    pub fn reschedule(&self, should_be_live: bool) {
        let mut state = self.state.lock();
        match (should_be_live, state.handle.is_some()) {
            (true, false) => self.arm_locked(&mut state),
            (false, true) => {
                if let Some(handle) = state.handle.take() {
                    info!(poll_id = handle.id(), "poll timer disarmed, data settled");
                }
            }
            _ => {}
        }
    }

    /// Whether a timer is armed.
    pub fn is_armed(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> PollStats {
        PollStats {
            armed: self.is_armed(),
            arms: self.counters.arms.load(Ordering::Relaxed),
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    fn arm_locked(&self, state: &mut PollState) {
        let Some(config) = state.config.as_ref() else {
            warn!("poll timer requested before it was configured");
            return;
        };
        let id = state.next_id;
        state.next_id += 1;

        let cancel = CancellationToken::new();
        let interval = config.interval;
        let tick = Arc::clone(&config.tick);
        let counters = Arc::clone(&self.counters);
        let loop_cancel = cancel.clone();

        self.spawner
            .spawn(run_timer(id, interval, tick, counters, loop_cancel));
        self.counters.arms.fetch_add(1, Ordering::Relaxed);
        info!(poll_id = id, interval = ?interval, "poll timer armed");

        state.handle = Some(PollHandle { id, cancel });
    }
}

impl<S> Drop for PollScheduler<S> {
    fn drop(&mut self) {
        self.state.get_mut().handle.take();
    }
}

async fn run_timer(
    id: u64,
    interval: Duration,
    tick: Tick,
    counters: Arc<PollCounters>,
    cancel: CancellationToken,
) {
    let period = interval.max(Duration::from_millis(1));
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            scheduled = timer.tick() => {
                // Fired while the previous tick was still running: coalesce.
                if scheduled.elapsed() > period / 2 {
                    counters.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!(poll_id = id, "poll tick skipped");
                    continue;
                }
            }
        }

        counters.ticks.fetch_add(1, Ordering::Relaxed);
        debug!(poll_id = id, "poll tick");
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tick() => {}
        }
    }
    debug!(poll_id = id, "poll loop exited");
}
