//! Named, reusable formats.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use super::compiler::compile;
use super::dev::DevFormat;
use super::LineFormatter;
use crate::error::LoggerError;
use crate::tokens::TokenRegistry;

/// Name of the format used when none is given.
pub const DEFAULT_FORMAT: &str = "iis";

/// Apache combined-style fields, pipe-delimited.
pub const COMBINED: &str = ":remote-addr|:date-time[apache]|:method|:url|:http-version|:status|:res[content-length]|:referrer :user-agent";

/// IIS W3C extended fields, labelled and pipe-delimited.
pub const IIS: &str = concat!(
    "severity:level|s-port:port|cs-Referer:referrer|cs-method:method|",
    "s-computername:computer-name|sc-status:status|time-taken:response-time|",
    "cs-version:http-version|EventTime:date-time[web]|cs-User-Agent:user-agent|",
    "cs-bytes:req[content-length]|cs-host:host|date:date-time[date]|",
    "c-ip:remote-addr|s-ip:server-ip|sc-bytes:res[content-length]|",
    "cs-uri-stem:url|cs-query:query|time:date-time[time]|host:hostname"
);

/// A format definition: a template string or a formatter.
#[derive(Clone)]
pub enum FormatSpec {
    Template(String),
    Function(Arc<dyn LineFormatter>),
}

impl FormatSpec {
    /// Wraps a formatter.
    pub fn function<F: LineFormatter + 'static>(formatter: F) -> Self {
        Self::Function(Arc::new(formatter))
    }
}

impl From<&str> for FormatSpec {
    fn from(value: &str) -> Self {
        Self::Template(value.to_string())
    }
}

impl From<String> for FormatSpec {
    fn from(value: String) -> Self {
        Self::Template(value)
    }
}

impl fmt::Debug for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Catalog of named formats.
///
/// Lookup by name falls back to treating the name itself as a template, so
/// `"iis"` and `":method :url"` are both valid format arguments.
pub struct FormatCatalog {
    formats: DashMap<String, FormatSpec>,
    registry: Arc<TokenRegistry>,
    default: String,
}

impl FormatCatalog {
    /// Creates an empty catalog with [`DEFAULT_FORMAT`] as the default name.
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self {
            formats: DashMap::new(),
            registry,
            default: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Creates a catalog holding the `combined`, `iis` and `dev` formats.
    pub fn with_builtins(registry: Arc<TokenRegistry>) -> Self {
        let catalog = Self::new(registry.clone());
        catalog.define("combined", COMBINED);
        catalog.define("iis", IIS);
        catalog.define("dev", FormatSpec::function(DevFormat::new(registry)));
        catalog
    }

    /// Changes the name used when an empty name is looked up.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = name.into();
        self
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    /// Stores a named format, replacing any previous definition.
    pub fn define(&self, name: impl Into<String>, spec: impl Into<FormatSpec>) {
        self.formats.insert(name.into(), spec.into());
    }

    /// Looks up a format.
    ///
    /// Resolution order:
    /// 1. A format defined under `name`
    /// 2. `name` itself, as a template
    /// 3. The default format, when `name` is empty
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::EmptyFormat`] when `name` is empty and the
    /// default name is empty too.
    pub fn get(&self, name: &str) -> Result<FormatSpec, LoggerError> {
        if let Some(spec) = self.formats.get(name) {
            return Ok(spec.value().clone());
        }

        if !name.is_empty() {
            return Ok(FormatSpec::Template(name.to_string()));
        }

        if self.default.is_empty() {
            return Err(LoggerError::EmptyFormat);
        }

        Ok(self
            .formats
            .get(&self.default)
            .map(|spec| spec.value().clone())
            .unwrap_or_else(|| FormatSpec::Template(self.default.clone())))
    }

    /// Looks up a format by name and turns it into a formatter.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LineFormatter>, LoggerError> {
        match self.get(name)? {
            FormatSpec::Template(template) => Ok(Arc::new(compile(&template, self.registry.clone()))),
            FormatSpec::Function(formatter) => Ok(formatter),
        }
    }

    /// Defined format names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formats.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FormatCatalog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FormatCatalog")
            .field("formats", &self.names())
            .field("default", &self.default)
            .finish()
    }
}
