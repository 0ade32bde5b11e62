//! HTTP ingestion sink.

use super::service::{LogSink, SinkError, SinkResult};
use crate::domain::LogRecord;
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Posts each record to an HTTP ingestion endpoint.
///
/// The URL layout follows Loggly's input API:
///
/// ```text
/// POST {base_url}/inputs/{token}/tag/{tag1},{tag2}/
/// ```
///
/// Field records are sent as `application/json`, plain lines as
/// `text/plain`. Delivery is attempted once.
pub struct HttpSink {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpSink {
    /// Creates a sink for one ingestion endpoint.
    ///
    /// # Arguments
    ///
    /// - `base_url` - Scheme and host of the endpoint, e.g. `https://logs-01.loggly.com`
    /// - `token` - Customer token placed in the input path
    /// - `timeout` - Total timeout of one delivery
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidUrl`] if `base_url` is not an absolute
    /// HTTP URL, [`SinkError::Request`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> SinkResult<Self> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| SinkError::InvalidUrl(base_url.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    /// Input URL for a given tag set. Empty tags are dropped.
    ///
    /// The token and the joined tags are each one path segment, so `/`,
    /// `?`, `#` and `%` inside them are percent-encoded.
    pub fn endpoint(&self, tags: &[String]) -> String {
        let tags: Vec<&str> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["inputs", self.token.as_str()]);
            if !tags.is_empty() {
                segments.extend(["tag", tags.join(",").as_str()]);
            }
            segments.push("");
        }
        url.into()
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(&self, record: &LogRecord, tags: &[String]) -> SinkResult<()> {
        let response = self
            .client
            .post(self.endpoint(tags))
            .header(CONTENT_TYPE, record.content_type())
            .body(record.to_body())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        debug!(status = %status, "Record delivered to sink");
        Ok(())
    }
}
