//! Per-exchange data observed by the access logger.
//!
//! Nothing in this module knows about templates or sinks. It captures what a
//! single request/response exchange looks like at the moment a line is
//! rendered, and the record produced from that line.
//!
//! - [`exchange`] - Read-only request and response snapshots handed to tokens
//! - [`timeline`] - Start timestamps and lifecycle phase of one exchange
//! - [`record`] - The rendered record and its structured normalization

pub mod exchange;
pub mod record;
pub mod timeline;

pub use exchange::{RequestView, ResponseView};
pub use record::LogRecord;
pub use timeline::{Phase, RequestTimeline};
