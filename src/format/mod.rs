//! Log line formats.
//!
//! - [`compiler`] - Compiles templates into [`CompiledFormat`]s
//! - [`catalog`] - [`FormatCatalog`] of named formats (`combined`, `iis`, `dev`)
//! - [`dev`] - Colorized development format

pub mod catalog;
pub mod compiler;
pub mod dev;

pub use catalog::{DEFAULT_FORMAT, FormatCatalog, FormatSpec};
pub use compiler::{CompiledFormat, Segment, compile};
pub use dev::{DevFormat, StatusClass};

use crate::domain::{RequestView, ResponseView};
use crate::error::LoggerError;

/// Renders one exchange into a log line.
///
/// `Ok(None)` suppresses the line for this exchange; this is different from
/// rendering an empty line.
pub trait LineFormatter: Send + Sync {
    fn format(&self, req: &RequestView, res: &ResponseView) -> Result<Option<String>, LoggerError>;
}

impl<F> LineFormatter for F
where
    F: Fn(&RequestView, &ResponseView) -> Result<Option<String>, LoggerError> + Send + Sync,
{
    fn format(&self, req: &RequestView, res: &ResponseView) -> Result<Option<String>, LoggerError> {
        self(req, res)
    }
}
