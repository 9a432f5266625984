//! View-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;
use crate::core::{EntityKind, QueryState, ResultSynchronizer, Spawn, SyncPhase};

/// Serializable state of one view, for hosts that render over a wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStateResponse {
    /// View name.
    pub view: String,
    /// Decoded query of the latest cycle.
    pub query: QueryState,
    /// Lifecycle phase.
    pub phase: SyncPhase,
    /// Whether a fetch is in flight.
    pub is_loading: bool,
    /// Last transient failure, if not dismissed.
    pub error_message: Option<String>,
    /// Whether the data is still changing and being polled.
    pub live: bool,
    /// State version.
    pub version: u64,
    /// Last fetched data.
    pub data: Option<serde_json::Value>,
}

/// Configured view, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    /// View identifier.
    pub name: String,
    /// Entity kind shown.
    pub entity: Option<EntityKind>,
    /// Default page size.
    pub default_page_size: u32,
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
}

/// Build the serializable state of a synchronizer.
pub fn view_state<T, S>(
    sync: &ResultSynchronizer<T, S>,
) -> Result<ViewStateResponse, serde_json::Error>
where
    T: Clone + Send + Sync + Serialize + 'static,
    S: Spawn + Clone + Send + Sync + 'static,
{
    let snapshot = sync.snapshot();
    let data = snapshot.data.as_ref().map(serde_json::to_value).transpose()?;
    Ok(ViewStateResponse {
        view: sync.view().to_string(),
        query: snapshot.query,
        phase: snapshot.phase,
        is_loading: snapshot.is_loading,
        error_message: snapshot.error_message,
        live: snapshot.live,
        version: snapshot.version,
        data,
    })
}

/// List configured views, sorted by name.
pub fn list_views(cfg: &DashboardConfig) -> Vec<ViewDescriptor> {
    let mut views: Vec<ViewDescriptor> = cfg
        .views
        .iter()
        .map(|(name, view)| ViewDescriptor {
            name: name.clone(),
            entity: view.entity,
            default_page_size: view.default_page_size,
            poll_interval_ms: view.poll_interval_ms,
        })
        .collect();
    views.sort_by(|a, b| a.name.cmp(&b.name));
    views
}
