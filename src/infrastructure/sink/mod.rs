//! Destinations for rendered access-log records.
//!
//! Provides a [`LogSink`] trait with three implementations:
//! - [`HttpSink`] - HTTP ingestion endpoint (Loggly-compatible)
//! - [`TracingSink`] - Process log via `tracing`
//! - [`NullSink`] - Discards records

mod http_sink;
mod null_sink;
mod service;
mod tracing_sink;

pub use http_sink::HttpSink;
pub use null_sink::NullSink;
pub use service::{LogSink, SinkError, SinkResult};
pub use tracing_sink::{ACCESS_LOG_TARGET, TracingSink};
