//! Imperative shell of the purr API: configuration, tracing, storage
//! backends and the hosting adapters around the `purr_core` dispatcher.

pub mod app;
pub mod config;
pub mod handlers;
pub mod lambda;
pub mod local;
pub mod state;
pub mod storage;
pub mod telemetry;
