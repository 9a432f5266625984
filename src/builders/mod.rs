//! Builders to construct synchronizers and codecs from configuration.

pub mod synchronizer_builder;

pub use synchronizer_builder::{build_codecs, SynchronizerBuilder};
