//! Sink writing records to the process log.

use super::service::{LogSink, SinkResult};
use crate::domain::LogRecord;
use async_trait::async_trait;

/// Target of the events emitted by [`TracingSink`].
pub const ACCESS_LOG_TARGET: &str = "access_log";

/// Emits each record as an `INFO` event on the [`ACCESS_LOG_TARGET`] target.
///
/// Used when no remote sink is configured. Filter it like any other target,
/// e.g. `RUST_LOG=info,access_log=off`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl LogSink for TracingSink {
    async fn send(&self, record: &LogRecord, tags: &[String]) -> SinkResult<()> {
        tracing::info!(
            target: ACCESS_LOG_TARGET,
            tags = %tags.join(","),
            structured = record.is_structured(),
            "{}",
            record
        );
        Ok(())
    }
}
