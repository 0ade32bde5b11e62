//! Infrastructure layer for external integrations.
//!
//! # Modules
//!
//! - [`sink`] - Log sinks receiving rendered access-log records
pub mod sink;
