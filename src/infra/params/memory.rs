//! In-memory parameter store backed by a watch channel.

use tokio::sync::watch;

use super::{ParamStore, RawParams};

/// In-process URL parameter store.
///
/// Stands in for the browser location in tests and in hosts that keep the
/// location themselves.
pub struct InMemoryParamStore {
    tx: watch::Sender<RawParams>,
}

impl InMemoryParamStore {
    /// Create a store holding `initial`.
    pub fn new(initial: RawParams) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Parse `query` and create a store holding it.
    pub fn from_query(query: &str) -> Self {
        Self::new(RawParams::parse(query))
    }

    /// Current parameters rendered as a query string.
    pub fn query_string(&self) -> String {
        self.tx.borrow().to_query_string()
    }
}

impl Default for InMemoryParamStore {
    fn default() -> Self {
        Self::new(RawParams::new())
    }
}

impl ParamStore for InMemoryParamStore {
    fn snapshot(&self) -> RawParams {
        self.tx.borrow().clone()
    }

    fn write(&self, params: RawParams) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == params {
                return false;
            }
            *current = params;
            true
        });
        if changed {
            tracing::debug!("url params changed: {}", self.tx.borrow().to_string());
        }
    }

    fn subscribe(&self) -> watch::Receiver<RawParams> {
        self.tx.subscribe()
    }
}
