//! HTTP middleware.
//!
//! - [`access_log`] - Template-driven access log
//! - [`logged_body`] - Response body that logs the exchange at end-of-stream
//! - [`tracing`] - Request spans for the process log

pub mod access_log;
pub mod logged_body;
pub mod tracing;
