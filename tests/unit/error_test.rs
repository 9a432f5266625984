//! Tests for error types

use live_query::core::{FetchError, SyncError};

#[test]
fn test_fetch_failed_error() {
    let err = FetchError::failed("connection refused");
    assert_eq!(format!("{}", err), "fetch failed: connection refused");
}

#[test]
fn test_cancelled_error() {
    assert_eq!(format!("{}", FetchError::Cancelled), "fetch cancelled");
    assert_eq!(format!("{}", SyncError::Cancelled), "request superseded");
}

#[test]
fn test_fetch_message_is_shown_verbatim() {
    let err = SyncError::from(FetchError::failed("503 service unavailable"));
    assert_eq!(err, SyncError::Fetch("503 service unavailable".to_string()));
    assert_eq!(format!("{}", err), "503 service unavailable");
}

#[test]
fn test_silent_errors() {
    assert!(SyncError::Cancelled.is_silent());
    assert!(SyncError::Disposed.is_silent());
    assert!(SyncError::from(FetchError::Cancelled).is_silent());
    assert!(!SyncError::Fetch("boom".into()).is_silent());
    assert!(!SyncError::InvalidConfig("bad".into()).is_silent());
}
