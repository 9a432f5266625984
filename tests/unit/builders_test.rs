//! Tests for builder modules

use std::collections::HashMap;
use std::sync::Arc;

use live_query::builders::{build_codecs, SynchronizerBuilder};
use live_query::config::{DashboardConfig, ViewConfig};
use live_query::core::{
    EntityKind, FetchError, FetchScope, FetchToken, FnFetcher, NeverLive, QueryState, SyncError,
};
use live_query::infra::params::InMemoryParamStore;
use live_query::runtime::TokioSpawner;

fn dashboard() -> DashboardConfig {
    let mut views = HashMap::new();
    views.insert(
        "executions".to_string(),
        ViewConfig::for_entity("executions", EntityKind::Execution),
    );
    views.insert(
        "tasks".to_string(),
        ViewConfig::for_entity("tasks", EntityKind::Task),
    );
    DashboardConfig { views }
}

#[test]
fn test_synchronizer_builder_from_dashboard() {
    let builder = SynchronizerBuilder::from_dashboard(&dashboard(), "executions").unwrap();
    assert_eq!(builder.view().name, "executions");
    assert_eq!(builder.view().entity, Some(EntityKind::Execution));
}

#[test]
fn test_synchronizer_builder_unknown_view() {
    let err = SynchronizerBuilder::from_dashboard(&dashboard(), "launch_plans")
        .err()
        .expect("unknown view must fail");
    assert!(matches!(err, SyncError::InvalidConfig(_)));
}

#[test]
fn test_build_codecs() {
    let codecs = build_codecs(&dashboard()).unwrap();
    assert_eq!(codecs.len(), 2);
    let executions = &codecs["executions"];
    assert_eq!(executions.defaults().sort_field.as_deref(), Some("created_at"));
    assert!(executions.defaults().sort_descending);
}

#[tokio::test]
async fn test_build_rejects_invalid_view() {
    let view = ViewConfig::new("broken").with_default_page_size(7);
    let fetcher = FnFetcher::<_, u32>::new(|_q: QueryState, _s: FetchScope, _t: FetchToken| async move {
        Ok::<_, FetchError>(0_u32)
    });

    let result = SynchronizerBuilder::new(view).build(
        Arc::new(InMemoryParamStore::default()),
        fetcher,
        NeverLive,
        TokioSpawner::current(),
    );
    assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
}
