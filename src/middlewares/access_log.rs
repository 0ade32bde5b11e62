//! Access-log middleware.
//!
//! Renders one line per exchange with the configured format and hands the
//! resulting record to a [`LogSink`].

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use super::logged_body::LoggedBody;
use crate::domain::{LogRecord, RequestTimeline, RequestView, ResponseView};
use crate::error::LoggerError;
use crate::format::{FormatCatalog, FormatSpec, LineFormatter, compile};
use crate::infrastructure::sink::{LogSink, TracingSink};

/// Tag sent with every record, ahead of the configured ones.
pub const DEFAULT_TAG: &str = "iis";

/// Predicate deciding whether an exchange is left out of the access log.
pub type SkipFn = Arc<dyn Fn(&RequestView, &ResponseView) -> bool + Send + Sync>;

/// Access logger shared by all requests passing through [`layer`].
///
/// Cheap to clone; all clones share one formatter and one sink.
#[derive(Clone)]
pub struct AccessLogger {
    inner: Arc<Inner>,
}

struct Inner {
    formatter: Arc<dyn LineFormatter>,
    immediate: bool,
    skip: Option<SkipFn>,
    tags: Arc<[String]>,
    structured: bool,
    sink: Arc<dyn LogSink>,
}

impl AccessLogger {
    /// Starts configuring a logger whose formats come from `catalog`.
    pub fn builder(catalog: Arc<FormatCatalog>) -> AccessLoggerBuilder {
        AccessLoggerBuilder {
            catalog,
            format: FormatSpec::Template(String::new()),
            immediate: false,
            skip: None,
            tags: Vec::new(),
            structured: true,
            sink: None,
        }
    }

    /// Returns true if lines are written on request arrival.
    pub fn is_immediate(&self) -> bool {
        self.inner.immediate
    }

    pub fn tags(&self) -> &[String] {
        &self.inner.tags
    }

    /// Produces the record for one exchange.
    ///
    /// Returns `None` when the exchange is skipped, the formatter suppresses
    /// the line, or rendering fails. Render failures are logged and never
    /// propagate to the request.
    pub fn record(&self, req: &RequestView, res: &ResponseView) -> Option<LogRecord> {
        if let Some(skip) = &self.inner.skip
            && skip(req, res)
        {
            debug!(method = %req.method(), url = req.url(), "Skipped request");
            return None;
        }

        let line = match self.inner.formatter.format(req, res) {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(method = %req.method(), url = req.url(), "Skipped line");
                return None;
            }
            Err(e) => {
                error!(
                    error = %e,
                    method = %req.method(),
                    url = req.url(),
                    "Failed to render access log line"
                );
                return None;
            }
        };

        if self.inner.structured {
            Some(LogRecord::normalize(line))
        } else {
            Some(LogRecord::Line(line))
        }
    }

    /// Renders one exchange and ships the record without waiting for the sink.
    ///
    /// Returns true if a record was handed to the sink.
    pub fn log(&self, req: &RequestView, res: &ResponseView) -> bool {
        let Some(record) = self.record(req, res) else {
            return false;
        };

        // Response bodies can be dropped after the runtime shut down
        let Ok(runtime) = Handle::try_current() else {
            warn!(record = %record, "No runtime to deliver access log record");
            return false;
        };

        let sink = self.inner.sink.clone();
        let tags = self.inner.tags.clone();
        runtime.spawn(async move {
            match sink.send(&record, &tags).await {
                Ok(()) => debug!(record = %record, "Log record delivered"),
                Err(e) => warn!(error = %e, "Failed to deliver access log record"),
            }
        });

        true
    }
}

impl fmt::Debug for AccessLogger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccessLogger")
            .field("immediate", &self.inner.immediate)
            .field("skip", &self.inner.skip.is_some())
            .field("tags", &self.inner.tags)
            .field("structured", &self.inner.structured)
            .finish()
    }
}

/// Builder for [`AccessLogger`].
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(TokenRegistry::with_builtins());
/// let catalog = Arc::new(FormatCatalog::with_builtins(registry));
///
/// let logger = AccessLogger::builder(catalog)
///     .format("combined")
///     .skip(|req, _res| req.uri().path() == "/health")
///     .tags(["web"])
///     .build()?;
///
/// let app = Router::new()
///     .route("/", get(home))
///     .layer(middleware::from_fn_with_state(logger, access_log::layer));
/// ```
pub struct AccessLoggerBuilder {
    catalog: Arc<FormatCatalog>,
    format: FormatSpec,
    immediate: bool,
    skip: Option<SkipFn>,
    tags: Vec<String>,
    structured: bool,
    sink: Option<Arc<dyn LogSink>>,
}

impl AccessLoggerBuilder {
    /// Format name, template, or formatter. Defaults to the catalog default.
    pub fn format(mut self, format: impl Into<FormatSpec>) -> Self {
        self.format = format.into();
        self
    }

    /// Log on request arrival instead of once the response body is sent.
    ///
    /// Response-dependent tokens then render their unresolved placeholder.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Leaves exchanges for which `skip` returns true out of the log.
    pub fn skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&RequestView, &ResponseView) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Extra tags sent with every record, after [`DEFAULT_TAG`].
    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Parse labelled `key=value|...` lines into field records (default: on).
    pub fn structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    /// Destination of records. Defaults to [`TracingSink`].
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Resolves the format and builds the logger.
    ///
    /// Templates referencing tokens that are not registered yet are accepted
    /// with a warning; names are resolved again on every render.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::EmptyFormat`] if no format is given and the
    /// catalog has no default.
    pub fn build(self) -> Result<AccessLogger, LoggerError> {
        let formatter: Arc<dyn LineFormatter> = match self.format {
            FormatSpec::Function(formatter) => formatter,
            FormatSpec::Template(name) => match self.catalog.get(&name)? {
                FormatSpec::Function(formatter) => formatter,
                FormatSpec::Template(template) => {
                    let compiled = compile(&template, self.catalog.registry().clone());
                    let missing = compiled.unresolved_tokens();
                    if !missing.is_empty() {
                        warn!(
                            tokens = ?missing,
                            "Access log format references unregistered tokens"
                        );
                    }
                    Arc::new(compiled)
                }
            },
        };

        Ok(AccessLogger {
            inner: Arc::new(Inner {
                formatter,
                immediate: self.immediate,
                skip: self.skip,
                tags: with_default_tag(self.tags).into(),
                structured: self.structured,
                sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            }),
        })
    }
}

/// Puts [`DEFAULT_TAG`] first and drops blank and repeated tags.
fn with_default_tag(tags: Vec<String>) -> Vec<String> {
    let mut merged = vec![DEFAULT_TAG.to_string()];
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !merged.iter().any(|t| t == tag) {
            merged.push(tag.to_string());
        }
    }
    merged
}

/// Logs each exchange passing through it.
///
/// In deferred mode (the default) the response body is wrapped in a
/// [`LoggedBody`] and the line is rendered once the body has been fully
/// sent or dropped, so status, response headers, bytes sent and response
/// time are known. In immediate mode it is rendered before the request is
/// forwarded. The request is always forwarded, whatever happens to its log
/// line.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/people", get(people))
///     .layer(middleware::from_fn_with_state(logger, access_log::layer));
/// ```
pub async fn layer(State(logger): State<AccessLogger>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let mut timeline = RequestTimeline::start(peer);
    let view = RequestView::from_request(&req).with_timeline(&timeline);

    if logger.is_immediate() {
        logger.log(&view, &ResponseView::pending());
        return next.run(req).await;
    }

    timeline.activate();
    let response = next.run(req).await;
    let head = ResponseView::from_head(&response);

    response.map(|body| Body::new(LoggedBody::new(body, logger, view, head, timeline)))
}
