//! Tests for sync event sinks

use live_query::core::{
    build_sync_event, InMemoryEventSink, SyncEventKind, SyncEventSink, TracingEventSink,
};
use uuid::Uuid;

#[test]
fn test_in_memory_event_sink() {
    let mut sink = InMemoryEventSink::new(10);
    let id = Uuid::new_v4();

    let event = build_sync_event(
        id,
        "executions",
        SyncEventKind::FetchFailed,
        Some(3),
        Some("timeout".to_string()),
    );

    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].synchronizer_id, id);
    assert_eq!(events[0].view, "executions");
    assert_eq!(events[0].kind, SyncEventKind::FetchFailed);
    assert_eq!(events[0].generation, Some(3));
    assert_eq!(events[0].detail.as_deref(), Some("timeout"));
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_event_sink_overflow() {
    let mut sink = InMemoryEventSink::new(2);
    let id = Uuid::new_v4();

    sink.record(build_sync_event(id, "v", SyncEventKind::FetchStarted, Some(1), None));
    sink.record(build_sync_event(id, "v", SyncEventKind::FetchStarted, Some(2), None));
    sink.record(build_sync_event(id, "v", SyncEventKind::FetchStarted, Some(3), None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].generation, Some(2)); // First one popped
    assert_eq!(events[1].generation, Some(3));
}

#[test]
fn test_tracing_sink_accepts_events() {
    live_query::util::init_tracing();
    live_query::util::init_tracing();
    let mut sink = TracingEventSink;
    sink.record(build_sync_event(
        Uuid::new_v4(),
        "tasks",
        SyncEventKind::Disposed,
        None,
        None,
    ));
}

#[test]
fn test_event_serializes() {
    let event = build_sync_event(Uuid::new_v4(), "v", SyncEventKind::PollArmed, None, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "poll_armed");
    assert_eq!(json["view"], "v");
}
