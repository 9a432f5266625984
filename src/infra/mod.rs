//! Infrastructure adapters for the URL parameter store.

pub mod params;

pub use params::{InMemoryParamStore, ParamStore, RawParams};
