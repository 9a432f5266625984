//! Builders to construct synchronizers and codecs from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{DashboardConfig, ViewConfig};
use crate::core::{
    FetchScope, Liveness, QueryFetcher, QueryStateCodec, ResultSynchronizer, Spawn, SyncError,
    SyncEventSink,
};
use crate::infra::params::ParamStore;

/// Build one codec per configured view.
pub fn build_codecs(cfg: &DashboardConfig) -> Result<HashMap<String, QueryStateCodec>, SyncError> {
    cfg.validate().map_err(SyncError::InvalidConfig)?;
    Ok(cfg
        .views
        .iter()
        .map(|(name, view)| (name.clone(), QueryStateCodec::new(view)))
        .collect())
}

/// Builder for a [`ResultSynchronizer`] bound to one view.
///
/// # Example
///
/// ```rust,ignore
/// let sync = SynchronizerBuilder::new(ViewConfig::for_entity("executions", EntityKind::Execution))
///     .with_scope(FetchScope::new("flytesnacks", "development"))
///     .with_event_sink(TracingEventSink)
///     .build(params, api, PageLiveness::new(predicate), TokioSpawner::current())?;
/// ```
pub struct SynchronizerBuilder {
    view: ViewConfig,
    scope: FetchScope,
    events: Option<Box<dyn SyncEventSink>>,
}

impl SynchronizerBuilder {
    /// Start from a view configuration.
    pub fn new(view: ViewConfig) -> Self {
        Self {
            view,
            scope: FetchScope::default(),
            events: None,
        }
    }

    /// Start from a named view of a dashboard configuration.
    pub fn from_dashboard(cfg: &DashboardConfig, view: &str) -> Result<Self, SyncError> {
        cfg.view(view)
            .cloned()
            .map(Self::new)
            .ok_or_else(|| SyncError::InvalidConfig(format!("unknown view `{view}`")))
    }

    /// Bind to a project/domain scope.
    #[must_use]
    pub fn with_scope(mut self, scope: FetchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Attach an event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: impl SyncEventSink + 'static) -> Self {
        self.events = Some(Box::new(sink));
        self
    }

    /// View configuration being built.
    pub const fn view(&self) -> &ViewConfig {
        &self.view
    }

    /// Validate the view and start the synchronizer.
    pub fn build<T, S, P, F, L>(
        self,
        params: Arc<P>,
        fetcher: F,
        liveness: L,
        spawner: S,
    ) -> Result<ResultSynchronizer<T, S>, SyncError>
    where
        T: Clone + Send + Sync + 'static,
        S: Spawn + Clone + Send + Sync + 'static,
        P: ParamStore + 'static,
        F: QueryFetcher<T>,
        L: Liveness<T>,
    {
        self.build_shared(params, Arc::new(fetcher), Arc::new(liveness), spawner)
    }

    /// Like [`build`](Self::build) with already shared components.
    pub fn build_shared<T, S>(
        self,
        params: Arc<dyn ParamStore>,
        fetcher: Arc<dyn QueryFetcher<T>>,
        liveness: Arc<dyn Liveness<T>>,
        spawner: S,
    ) -> Result<ResultSynchronizer<T, S>, SyncError>
    where
        T: Clone + Send + Sync + 'static,
        S: Spawn + Clone + Send + Sync + 'static,
    {
        self.view
            .validate()
            .map_err(|e| SyncError::InvalidConfig(format!("view `{}`: {e}", self.view.name)))?;

        Ok(ResultSynchronizer::start(
            &self.view,
            self.scope,
            params,
            fetcher,
            liveness,
            spawner,
            self.events,
        ))
    }
}
