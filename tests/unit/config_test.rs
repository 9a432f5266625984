//! Tests for configuration validation

use std::collections::HashMap;

use live_query::config::{
    DashboardConfig, ViewConfig, CONFIG_PATH_ENV, DEFAULT_PAGE_SIZE, POLL_INTERVAL_ENV,
};
use live_query::core::EntityKind;

#[test]
fn test_view_config_validation() {
    let valid = ViewConfig::new("tasks").with_filter_keys(["state"]);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_view_config_invalid_default_page_size() {
    let invalid = ViewConfig::new("tasks").with_default_page_size(33);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_view_config_invalid_poll_interval() {
    let invalid = ViewConfig::new("tasks").with_poll_interval_ms(10);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_view_config_reserved_filter_key() {
    let invalid = ViewConfig::new("tasks").with_filter_keys(["status", "page"]);
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("reserved"), "{err}");
}

#[test]
fn test_view_config_empty_page_sizes() {
    let mut invalid = ViewConfig::new("tasks");
    invalid.allowed_page_sizes.clear();
    assert!(invalid.validate().is_err());
}

#[test]
fn test_dashboard_config_validation() {
    let mut views = HashMap::new();
    views.insert(
        "executions".to_string(),
        ViewConfig::for_entity("executions", EntityKind::Execution),
    );

    let config = DashboardConfig { views };
    assert!(config.validate().is_ok());
    assert!(config.view("executions").is_some());
    assert!(config.view("missing").is_none());
}

#[test]
fn test_dashboard_config_empty_views() {
    let config = DashboardConfig {
        views: HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_dashboard_config_from_json() {
    let json = r#"{
        "views": {
            "executions": {
                "name": "executions",
                "entity": "execution",
                "default_sort": { "field": "created_at", "descending": true },
                "filter_keys": ["status", "version"],
                "poll_interval_ms": 5000
            }
        }
    }"#;

    let config = DashboardConfig::from_json_str(json).unwrap();
    let view = config.view("executions").unwrap();
    assert_eq!(view.entity, Some(EntityKind::Execution));
    assert_eq!(view.default_page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(view.allowed_page_sizes, vec![10, 25, 50, 100]);
    assert_eq!(view.poll_interval_ms, 5000);
    assert!(view.in_progress_statuses.contains(&"running".to_string()));
}

#[test]
fn test_dashboard_config_from_json_rejects_invalid_view() {
    let json = r#"{
        "views": {
            "tasks": { "name": "tasks", "default_page_size": 7 }
        }
    }"#;

    let err = DashboardConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("view `tasks` invalid"), "{err}");
}

#[test]
fn test_dashboard_config_from_env() {
    let path = std::env::temp_dir().join(format!("live_query_{}.json", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"{ "views": { "tasks": { "name": "tasks", "filter_keys": ["state"] } } }"#,
    )
    .unwrap();

    std::env::set_var(CONFIG_PATH_ENV, &path);
    std::env::set_var(POLL_INTERVAL_ENV, "2500");
    let config = DashboardConfig::from_env().unwrap();
    std::env::remove_var(CONFIG_PATH_ENV);
    std::env::remove_var(POLL_INTERVAL_ENV);
    let _ = std::fs::remove_file(&path);

    let view = config.view("tasks").unwrap();
    assert_eq!(view.poll_interval_ms, 2_500);
    assert_eq!(view.filter_keys, vec!["state".to_string()]);
}
