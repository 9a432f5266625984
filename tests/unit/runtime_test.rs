//! Tests for tokio spawner and view-facing models

use std::collections::HashMap;

use live_query::config::{DashboardConfig, ViewConfig};
use live_query::core::{EntityKind, Spawn};
use live_query::runtime::tokio_spawner::TokioSpawner;
use live_query::runtime::list_views;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_none());
}

#[test]
fn test_list_views_sorted() {
    let mut views = HashMap::new();
    views.insert("workflows".to_string(), ViewConfig::for_entity("workflows", EntityKind::Workflow));
    views.insert("executions".to_string(), ViewConfig::for_entity("executions", EntityKind::Execution));
    let cfg = DashboardConfig { views };

    let listed = list_views(&cfg);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "executions");
    assert_eq!(listed[0].entity, Some(EntityKind::Execution));
    assert_eq!(listed[1].name, "workflows");
    assert_eq!(listed[1].default_page_size, 25);
}
