//! Query codec, liveness, supersession, polling and the synchronizer.

pub mod codec;
pub mod entity;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod liveness;
pub mod poll;
pub mod query;
pub mod spawn;
pub mod supersession;
pub mod synchronizer;

pub use codec::{QueryMutation, QueryStateCodec};
pub use entity::{EntityKind, ExecutionPhase, ExecutionSummary, StatusBearing};
pub use error::{AppResult, FetchError, SyncError};
pub use events::{
    build_sync_event, InMemoryEventSink, SyncEvent, SyncEventKind, SyncEventSink,
    TracingEventSink,
};
pub use fetcher::{FetchScope, FnFetcher, QueryFetcher};
pub use liveness::{
    Liveness, LivenessPredicate, LivenessVerdict, NeverLive, PageLiveness, ResourceLiveness,
};
pub use poll::{tick_fn, PollHandle, PollScheduler, PollStats, Tick, TickFuture};
pub use query::{Page, QueryState};
pub use spawn::Spawn;
pub use supersession::{ControllerStats, FetchToken, RequestSupersessionController};
pub use synchronizer::{ResultSynchronizer, SyncPhase, SyncSnapshot};
