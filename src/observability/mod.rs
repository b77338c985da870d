//! Observability module for the bridge.
//!
//! The bridge emits `tracing` events and spans; applications that do not
//! install their own subscriber can call [`init_tracing`].

mod logging;

pub use logging::{init_tracing, loggable_body, redact_client_key, LogConfig, LogLevel};
