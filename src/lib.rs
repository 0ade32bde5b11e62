//! # Access Logger
//!
//! Template-driven HTTP access logging for Axum, with pluggable sinks.
//!
//! ## Architecture
//!
//! - **Tokens** ([`tokens`]) - Named values rendered from one exchange (`:method`, `:status`, ...)
//! - **Formats** ([`format`]) - Template compiler and the `combined`, `iis` and `dev` formats
//! - **Domain** ([`domain`]) - Request/response snapshots, timeline, and log records
//! - **Middleware** ([`middlewares`]) - The access-log layer and process tracing
//! - **Infrastructure** ([`infrastructure`]) - Sinks receiving log records
//!
//! ## Templates
//!
//! A template mixes literal text with tokens written `label:name[arg]`.
//! The label is optional and, when the token renders a non-empty value,
//! produces `label=value`:
//!
//! ```text
//! :method :url :status              -> GET /people 200
//! cs-method:method|sc-status:status -> cs-method=GET|sc-status=200
//! :date-time[iso]                   -> 2024-03-05T09:30:00.000Z
//! ```
//!
//! Labelled `key=value|key=value` lines are sent as JSON objects when
//! structured output is enabled.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let registry = Arc::new(TokenRegistry::with_builtins());
//! let catalog = Arc::new(FormatCatalog::with_builtins(registry));
//! let logger = AccessLogger::builder(catalog).format("combined").build()?;
//!
//! let app = Router::new()
//!     .route("/", get(|| async { "home" }))
//!     .layer(middleware::from_fn_with_state(logger, access_log::layer));
//! ```
//!
//! ## Configuration
//!
//! The demo server is configured from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod domain;
pub mod error;
pub mod format;
pub mod infrastructure;
pub mod middlewares;
pub mod tokens;

pub mod config;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::LoggerError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::domain::{LogRecord, RequestView, ResponseView};
    pub use crate::error::LoggerError;
    pub use crate::format::{FormatCatalog, FormatSpec, LineFormatter};
    pub use crate::infrastructure::sink::{HttpSink, LogSink, NullSink, SinkResult, TracingSink};
    pub use crate::middlewares::access_log::{self, AccessLogger};
    pub use crate::tokens::{HostInfo, TokenRegistry};
}
