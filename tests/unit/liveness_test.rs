//! Tests for liveness checks

use std::time::Duration;

use live_query::config::ViewConfig;
use live_query::core::{
    EntityKind, ExecutionPhase, ExecutionSummary, Liveness, LivenessPredicate, NeverLive, Page,
    PageLiveness, ResourceLiveness,
};

fn execution(name: &str, phase: ExecutionPhase) -> ExecutionSummary {
    ExecutionSummary {
        name: name.to_string(),
        project: "flytesnacks".to_string(),
        domain: "development".to_string(),
        phase,
        created_at_ms: 0,
    }
}

fn predicate() -> LivenessPredicate {
    LivenessPredicate::from_config(&ViewConfig::for_entity(
        "executions",
        EntityKind::Execution,
    ))
}

#[test]
fn test_page_with_running_item_is_live() {
    let liveness = PageLiveness::new(predicate());
    let page = Page::new(
        vec![
            execution("a", ExecutionPhase::Succeeded),
            execution("b", ExecutionPhase::Running),
            execution("c", ExecutionPhase::Queued),
        ],
        3,
    );

    let verdict = liveness.verdict(&page);
    assert!(verdict.live);
    assert_eq!(verdict.in_progress, 2);
    assert_eq!(verdict.next_check, Some(Duration::from_millis(10_000)));
}

#[test]
fn test_settled_page_is_not_live() {
    let liveness = PageLiveness::new(predicate());
    let page = Page::new(
        vec![
            execution("a", ExecutionPhase::Succeeded),
            execution("b", ExecutionPhase::Failed),
            execution("c", ExecutionPhase::Aborted),
        ],
        3,
    );
    assert!(!liveness.is_live(&page));
    assert!(!liveness.is_live(&Page::<ExecutionSummary>::empty()));
}

#[test]
fn test_resource_liveness() {
    let liveness = ResourceLiveness::new(predicate());
    assert!(liveness.is_live(&execution("a", ExecutionPhase::Aborting)));
    assert!(!liveness.is_live(&execution("a", ExecutionPhase::TimedOut)));
    assert!(!liveness.verdict_of(None::<&ExecutionSummary>).live);
}

#[test]
fn test_unknown_status_is_not_live() {
    let liveness = ResourceLiveness::new(predicate());
    assert!(!liveness.is_live(&None::<ExecutionPhase>));
    assert!(!liveness.is_live(&ExecutionPhase::Undefined));
}

#[test]
fn test_custom_status_set() {
    let predicate = LivenessPredicate::new(["PENDING"], Duration::from_secs(2));
    assert!(predicate.is_in_progress(Some("pending")));
    assert!(!predicate.is_in_progress(Some("running")));
    assert!(!predicate.is_in_progress(None));
}

#[test]
fn test_never_live() {
    assert!(!NeverLive.is_live(&Page::new(vec![execution("a", ExecutionPhase::Running)], 1)));
}
