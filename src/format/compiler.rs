//! Template compiler.
//!
//! A template mixes literal text with token references of the form
//! `[label]:name[argument]`:
//!
//! ```text
//! :method :url :status                 -> GET /people 200
//! cs-method:method|sc-status:status    -> cs-method=GET|sc-status=200
//! :agent:user-agent                    -> agent=curl/8.5.0
//! :req[user-agent] :date-time[iso]     -> curl/8.5.0 2024-03-05T00:00:00.000Z
//! ```
//!
//! Label and name are at least two characters from `[-0-9A-Za-z_]`; a label
//! may carry a leading colon of its own (`:label:name`).
//! Compiling splits the template into an ordered list of [`Segment`]s;
//! rendering walks that list and resolves each token name in the registry.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::LineFormatter;
use crate::domain::{RequestView, ResponseView};
use crate::error::LoggerError;
use crate::tokens::{RenderContext, TokenRegistry, apply_label};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?::?([-0-9A-Za-z_]{2,}))?:([-0-9A-Za-z_]{2,})(?:\[([^\]]+)\])?")
        .expect("token pattern is valid")
});

/// One piece of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output verbatim.
    Literal(String),
    /// Reference to a registered token.
    Token {
        label: Option<String>,
        name: String,
        arg: Option<String>,
    },
}

/// Splits a template into literal and token segments.
pub fn parse(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in TOKEN_PATTERN.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        if whole.start() > last {
            segments.push(Segment::Literal(template[last..whole.start()].to_string()));
        }

        segments.push(Segment::Token {
            label: caps.get(1).map(|m| m.as_str().to_string()),
            name: caps[2].to_string(),
            arg: caps.get(3).map(|m| m.as_str().to_string()),
        });

        last = whole.end();
    }

    if last < template.len() {
        segments.push(Segment::Literal(template[last..].to_string()));
    }

    segments
}

/// Compiles a template against a token registry.
///
/// Token names are not checked here; an unknown name fails the render that
/// reaches it with [`LoggerError::UnknownToken`]. Use
/// [`CompiledFormat::unresolved_tokens`] to inspect a format ahead of time.
pub fn compile(template: &str, registry: Arc<TokenRegistry>) -> CompiledFormat {
    CompiledFormat {
        template: template.to_string(),
        segments: parse(template).into(),
        registry,
    }
}

/// A template ready to be rendered against exchanges.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    template: String,
    segments: Arc<[Segment]>,
    registry: Arc<TokenRegistry>,
}

impl CompiledFormat {
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Token names referenced by the template but not currently registered.
    pub fn unresolved_tokens(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Token { name, .. } if !self.registry.contains(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Renders one line.
    ///
    /// Segments are concatenated in template order; a token rendering no
    /// value contributes an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnknownToken`] for the first token name that is
    /// not registered at the time of the call.
    pub fn render(&self, req: &RequestView, res: &ResponseView) -> Result<String, LoggerError> {
        let ctx = RenderContext {
            request: req,
            response: res,
            now: self.registry.now(),
            host: self.registry.host(),
        };

        let mut line = String::with_capacity(self.template.len() * 2);
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Token { label, name, arg } => {
                    let token = self
                        .registry
                        .resolve(name)
                        .ok_or_else(|| LoggerError::UnknownToken(name.clone()))?;
                    let value = apply_label(label.as_deref(), token.render(&ctx, arg.as_deref()));
                    if let Some(value) = value {
                        line.push_str(&value);
                    }
                }
            }
        }

        Ok(line)
    }
}

impl LineFormatter for CompiledFormat {
    fn format(&self, req: &RequestView, res: &ResponseView) -> Result<Option<String>, LoggerError> {
        self.render(req, res).map(Some)
    }
}
