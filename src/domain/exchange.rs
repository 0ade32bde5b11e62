//! Read-only snapshots of the request and response being logged.
//!
//! Tokens only ever see these views, so nothing a token does can alter the
//! exchange it describes.

#[cfg(test)]
use axum::body::HttpBody;
use axum::extract::{ConnectInfo, OriginalUri};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri, Version, header};
use std::net::SocketAddr;
use std::time::Instant;

use super::timeline::RequestTimeline;

/// Snapshot of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestView {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
    remote_address: Option<String>,
    started_at: Option<Instant>,
}

impl RequestView {
    /// Captures method, URI, version, headers and peer address of a request.
    ///
    /// When the request was routed through a nested router, the URI recorded
    /// is the [`OriginalUri`] rather than the stripped one.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| req.uri().clone());

        let peer_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: req.method().clone(),
            uri,
            version: req.version(),
            headers: req.headers().clone(),
            peer_addr,
            remote_address: None,
            started_at: None,
        }
    }

    /// Attaches the start instant and captured address of an exchange.
    pub fn with_timeline(mut self, timeline: &RequestTimeline) -> Self {
        self.started_at = Some(timeline.start_monotonic());
        self.remote_address = timeline.remote_address().map(str::to_string);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path and query as received, e.g. `/people?page=2`.
    pub fn url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query().filter(|q| !q.is_empty())
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup; repeated headers are joined with `", "`.
    pub fn header(&self, name: &str) -> Option<String> {
        join_header_values(&self.headers, name)
    }

    /// Host name the client addressed, without port.
    ///
    /// Prefers the URI authority (absolute-form and HTTP/2 requests), then
    /// the `Host` header.
    pub fn hostname(&self) -> Option<&str> {
        self.uri
            .host()
            .or_else(|| self.host_header().map(split_host_port).map(|(host, _)| host))
            .filter(|h| !h.is_empty())
    }

    /// Raw `Host` header value.
    pub fn host_header(&self) -> Option<&str> {
        self.headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
    }

    /// Socket address of the connection, if the server recorded one.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Client address captured when the exchange was intercepted.
    pub fn captured_remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }
}

/// Snapshot of a response, or of its absence.
#[derive(Debug, Clone, Default)]
pub struct ResponseView {
    status: Option<StatusCode>,
    headers: HeaderMap,
    finished_at: Option<Instant>,
}

impl ResponseView {
    /// A response that has not been produced yet.
    ///
    /// Used when logging immediately on request arrival; status-dependent
    /// tokens render their unresolved placeholder.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Captures status and headers of a response whose body may still be
    /// streaming. The result has no finish time until [`Self::finished`].
    pub fn from_head<B>(res: &Response<B>) -> Self {
        Self {
            status: Some(res.status()),
            headers: res.headers().clone(),
            finished_at: None,
        }
    }

    /// Marks the body as fully sent after `body_len` bytes.
    ///
    /// Hyper computes `Content-Length` while writing, so when the header is
    /// not set it is filled in from the number of bytes actually sent.
    pub fn finished(mut self, finished_at: Instant, body_len: u64) -> Self {
        if self.headers_sent() && !self.headers.contains_key(header::CONTENT_LENGTH) {
            self.headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(body_len));
        }
        self.finished_at = Some(finished_at);
        self
    }

    /// Head and finish time of a buffered response, sized from its exact
    /// size hint.
    #[cfg(test)]
    pub(crate) fn from_response<B: HttpBody>(res: &Response<B>, finished_at: Instant) -> Self {
        let len = res.body().size_hint().exact().unwrap_or_default();
        Self::from_head(res).finished(finished_at, len)
    }

    /// Status code once headers are final.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns true once the response head has been produced.
    pub fn headers_sent(&self) -> bool {
        self.status.is_some()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup; repeated headers are joined with `", "`.
    ///
    /// Always `None` before the response exists.
    pub fn header(&self, name: &str) -> Option<String> {
        if !self.headers_sent() {
            return None;
        }
        join_header_values(&self.headers, name)
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }
}

/// Splits `host[:port]`, keeping bracketed IPv6 literals intact.
pub(crate) fn split_host_port(value: &str) -> (&str, Option<&str>) {
    if let Some(rest) = value.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => (value, None),
        };
    }

    match value.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (value, None),
    }
}

fn join_header_values(headers: &HeaderMap, name: &str) -> Option<String> {
    let name = name.to_ascii_lowercase();
    let values: Vec<String> = headers
        .get_all(name.as_str())
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
