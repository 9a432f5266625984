//! Runtime adapters and view-facing snapshot models.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use api::{list_views, view_state, ViewDescriptor, ViewStateResponse};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
