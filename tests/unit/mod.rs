//! Unit tests for individual components

mod error_test;
mod events_test;
mod config_test;
#[cfg(feature = "tokio-runtime")]
mod builders_test;
#[cfg(feature = "tokio-runtime")]
mod runtime_test;
mod codec_test;
mod liveness_test;
