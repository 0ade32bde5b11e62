//! No-op sink for testing or disabled shipping.

use super::service::{LogSink, SinkResult};
use crate::domain::LogRecord;
use async_trait::async_trait;
use tracing::debug;

/// A sink that discards every record.
pub struct NullSink;

impl NullSink {
    /// Creates a new NullSink instance.
    pub fn new() -> Self {
        debug!("Using NullSink (records are discarded)");
        Self
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for NullSink {
    async fn send(&self, _record: &LogRecord, _tags: &[String]) -> SinkResult<()> {
        Ok(())
    }
}
