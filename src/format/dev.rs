//! Colorized development format.

use axum::http::StatusCode;
use std::sync::{Arc, OnceLock};

use super::LineFormatter;
use super::compiler::{CompiledFormat, compile};
use crate::domain::{RequestView, ResponseView};
use crate::error::LoggerError;
use crate::tokens::TokenRegistry;

/// Status classes with a distinct color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ServerError,
    ClientError,
    Redirection,
    Success,
    /// Informational, or no response yet.
    Other,
}

impl StatusClass {
    const COUNT: usize = 5;

    pub fn of(status: Option<StatusCode>) -> Self {
        match status {
            Some(s) if s.is_server_error() => Self::ServerError,
            Some(s) if s.is_client_error() => Self::ClientError,
            Some(s) if s.is_redirection() => Self::Redirection,
            Some(s) if s.is_success() => Self::Success,
            _ => Self::Other,
        }
    }

    /// ANSI SGR color code.
    pub fn color(self) -> u8 {
        match self {
            Self::ServerError => 31,
            Self::ClientError => 33,
            Self::Redirection => 36,
            Self::Success => 32,
            Self::Other => 0,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::ServerError => 0,
            Self::ClientError => 1,
            Self::Redirection => 2,
            Self::Success => 3,
            Self::Other => 4,
        }
    }
}

/// Concise, colored output for development:
///
/// ```text
/// GET /people \x1b[32m 200\x1b[0m 0.412 ms - 6\x1b[0m
/// ```
///
/// The status is colored by class (red 5xx, yellow 4xx, cyan 3xx,
/// green 2xx). One template per class is compiled on first use and reused.
pub struct DevFormat {
    registry: Arc<TokenRegistry>,
    compiled: [OnceLock<CompiledFormat>; StatusClass::COUNT],
}

impl DevFormat {
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self {
            registry,
            compiled: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    /// Template used for one status class.
    pub fn template(class: StatusClass) -> String {
        format!(
            ":method :url \x1b[{}m :status\x1b[0m :response-time ms - :res[content-length]\x1b[0m",
            class.color()
        )
    }

    fn compiled(&self, class: StatusClass) -> &CompiledFormat {
        self.compiled[class.index()]
            .get_or_init(|| compile(&Self::template(class), self.registry.clone()))
    }
}

impl LineFormatter for DevFormat {
    fn format(&self, req: &RequestView, res: &ResponseView) -> Result<Option<String>, LoggerError> {
        let class = StatusClass::of(res.status());
        self.compiled(class).render(req, res).map(Some)
    }
}
