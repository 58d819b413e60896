//! Observability: `tracing` subscriber setup for the `conftree` binary.
//!
//! The library only emits events; installing a subscriber is left to the
//! application.

pub mod logging;

pub use logging::{LogFormat, init_logging};
