//! Log sink trait and error types.

use async_trait::async_trait;

use crate::domain::LogRecord;

/// Errors that can occur while handing a record to a sink.
///
/// These never reach the request being logged; the middleware reports them
/// through `tracing` and drops the record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sink rejected record with status {0}")]
    Status(u16),

    #[error("Invalid sink URL: {0}")]
    InvalidUrl(String),
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for rendered access-log records.
///
/// Called once per logged exchange, off the request path: the middleware
/// spawns the call and never awaits it, so implementations may block on
/// network I/O but must not assume their result is observed by anyone but
/// the diagnostics log.
///
/// # Implementations
///
/// - [`crate::infrastructure::sink::HttpSink`] - HTTP ingestion endpoint (Loggly-compatible)
/// - [`crate::infrastructure::sink::TracingSink`] - Writes records as `tracing` events
/// - [`crate::infrastructure::sink::NullSink`] - Discards records
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Delivers one record with its tag set.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if delivery fails. No retry is attempted.
    async fn send(&self, record: &LogRecord, tags: &[String]) -> SinkResult<()>;
}
