//! Error types for fetch and synchronization operations.

use thiserror::Error;

/// Outcome of a failed call across the fetch boundary.
///
/// Transports must report an aborted request as [`FetchError::Cancelled`] so
/// it can be dropped silently instead of being shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request was aborted through its cancellation token.
    #[error("fetch cancelled")]
    Cancelled,
    /// Network or server failure.
    #[error("fetch failed: {0}")]
    Failed(String),
}

impl FetchError {
    /// Convenience constructor for [`FetchError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors produced by the supersession controller and the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request was superseded by a newer one.
    #[error("request superseded")]
    Cancelled,
    /// The owner was torn down; no further work is accepted.
    #[error("synchronizer disposed")]
    Disposed,
    /// Transient fetch failure, surfaced to the view as an error message.
    #[error("{0}")]
    Fetch(String),
    /// Configuration rejected during build.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Whether this outcome must be swallowed rather than shown to the user.
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Disposed)
    }
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => Self::Cancelled,
            FetchError::Failed(message) => Self::Fetch(message),
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
