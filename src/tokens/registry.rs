//! Token registry shared by compiled formats.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use super::builtin::{BuiltinToken, RenderContext};
use super::host::HostInfo;
use crate::domain::{RequestView, ResponseView};

/// Handler of a user-defined token.
///
/// Receives the request, the response and the optional bracketed template
/// argument. Returning `None` renders nothing.
///
/// Handlers return the bare value and never see the template label: the
/// compiled format adds the `label=` prefix, and only when the value is
/// non-empty.
pub type TokenFn =
    Arc<dyn Fn(&RequestView, &ResponseView, Option<&str>) -> Option<String> + Send + Sync>;

/// Source of the wall clock used by date tokens.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A registered token.
#[derive(Clone)]
pub enum Token {
    Builtin(BuiltinToken),
    Custom(TokenFn),
}

impl Token {
    pub fn render(&self, ctx: &RenderContext<'_>, arg: Option<&str>) -> Option<String> {
        match self {
            Self::Builtin(token) => token.render(ctx, arg),
            Self::Custom(handler) => handler(ctx.request, ctx.response, arg),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Builtin(token) => f.debug_tuple("Builtin").field(token).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Mapping from token name to token.
///
/// Built once at startup and shared as `Arc<TokenRegistry>` between the
/// format catalog, compiled formats and the middleware. Registration takes
/// `&self`, so tokens added after a format was compiled are still seen by
/// that format: names are resolved on every render.
///
/// # Examples
///
/// ```ignore
/// let registry = Arc::new(TokenRegistry::with_builtins());
/// registry.register("tenant", |req, _res, _arg| req.header("x-tenant-id"));
/// ```
pub struct TokenRegistry {
    tokens: DashMap<String, Token>,
    host: HostInfo,
    clock: Clock,
}

impl TokenRegistry {
    /// Creates a registry with no tokens.
    pub fn new(host: HostInfo) -> Self {
        Self {
            tokens: DashMap::new(),
            host,
            clock: Arc::new(Utc::now),
        }
    }

    /// Creates a registry holding every [`BuiltinToken`], with the server
    /// identity detected from the running host.
    pub fn with_builtins() -> Self {
        Self::with_host(HostInfo::detect())
    }

    /// Creates a registry holding every [`BuiltinToken`] for a given host.
    pub fn with_host(host: HostInfo) -> Self {
        let registry = Self::new(host);
        for token in BuiltinToken::ALL {
            registry
                .tokens
                .insert(token.name().to_string(), Token::Builtin(token));
        }
        registry
    }

    /// Replaces the wall clock used by date tokens.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Registers a user-defined token, replacing any token with the same name.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&RequestView, &ResponseView, Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .tokens
            .insert(name.clone(), Token::Custom(Arc::new(handler)))
            .is_some()
        {
            tracing::debug!(token = %name, "Token handler replaced");
        }
    }

    /// Looks up a token by exact name.
    pub fn resolve(&self, name: &str) -> Option<Token> {
        self.tokens.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    /// Registered token names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tokens.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    /// Current wall clock reading.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("tokens", &self.names())
            .field("host", &self.host)
            .finish()
    }
}

/// Prefixes a rendered value with `label=` when both are non-empty.
pub fn apply_label(label: Option<&str>, value: Option<String>) -> Option<String> {
    match (label, value) {
        (Some(label), Some(value)) if !label.is_empty() && !value.is_empty() => {
            Some(format!("{label}={value}"))
        }
        (_, value) => value,
    }
}
