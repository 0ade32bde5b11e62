//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ## Example
//!
//! ```bash
//! export ACCESS_LOG_FORMAT="combined"
//! export ACCESS_LOG_TAGS="web,combined"
//! export SINK_TOKEN="0b1c2d3e-..."
//! ```
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Process log format: `text` or `json` (default: `text`)
//! - `ACCESS_LOG_FORMAT` - Format name or template (default: `iis`)
//! - `ACCESS_LOG_IMMEDIATE` - Log on request arrival (default: `false`)
//! - `ACCESS_LOG_STRUCTURED` - Send labelled lines as JSON fields (default: `true`)
//! - `ACCESS_LOG_TAGS` - Comma-separated extra sink tags; `iis` is always sent first
//! - `ACCESS_LOG_SKIP_PATHS` - Comma-separated paths left out of the log
//! - `SINK_URL` - Ingestion base URL (default: `https://logs-01.loggly.com`)
//! - `SINK_TOKEN` - Ingestion token; records go to the process log when unset
//! - `SINK_TIMEOUT_SECS` - Delivery timeout (default: 5, max: 300)
//! - `SERVER_IP` - Address rendered by `:server-ip`; pins the interface on
//!   multi-homed hosts (default: source address of the default route)

use anyhow::{Context, Result};
use std::env;
use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_SINK_URL: &str = "https://logs-01.loggly.com";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,

    // ── Access log ──────────────────────────────────────────────────────────
    /// Format name from the catalog or a literal template.
    pub access_log_format: String,
    pub access_log_immediate: bool,
    pub access_log_structured: bool,
    /// Tags sent after the always-present `iis` tag.
    pub access_log_tags: Vec<String>,
    /// Request paths never written to the access log, e.g. `/health`.
    pub access_log_skip_paths: Vec<String>,

    // ── Sink ────────────────────────────────────────────────────────────────
    pub sink_url: String,
    /// Ingestion token. When `None`, records are written to the process log.
    pub sink_token: Option<String>,
    pub sink_timeout_secs: u64,

    // ── Host ────────────────────────────────────────────────────────────────
    /// Overrides the detected server address.
    pub server_ip: Option<IpAddr>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a boolean or numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let access_log_format =
            env::var("ACCESS_LOG_FORMAT").unwrap_or_else(|_| "iis".to_string());

        let access_log_immediate =
            load_bool("ACCESS_LOG_IMMEDIATE", false).context("Invalid ACCESS_LOG_IMMEDIATE")?;
        let access_log_structured =
            load_bool("ACCESS_LOG_STRUCTURED", true).context("Invalid ACCESS_LOG_STRUCTURED")?;

        let access_log_tags = env::var("ACCESS_LOG_TAGS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let access_log_skip_paths = env::var("ACCESS_LOG_SKIP_PATHS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let sink_url = env::var("SINK_URL").unwrap_or_else(|_| DEFAULT_SINK_URL.to_string());
        let sink_token = env::var("SINK_TOKEN").ok().filter(|t| !t.trim().is_empty());

        let sink_timeout_secs = match env::var("SINK_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("SINK_TIMEOUT_SECS must be a number, got '{v}'"))?,
            Err(_) => 5,
        };

        let server_ip = match env::var("SERVER_IP") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("SERVER_IP must be an IP address, got '{v}'"))?,
            ),
            _ => None,
        };

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            access_log_format,
            access_log_immediate,
            access_log_structured,
            access_log_tags,
            access_log_skip_paths,
            sink_url,
            sink_token,
            sink_timeout_secs,
            server_ip,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is invalid
    /// - `sink_url` is not an `http(s)` URL
    /// - `sink_timeout_secs` is outside `1..=300`
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if !self.sink_url.starts_with("http://") && !self.sink_url.starts_with("https://") {
            anyhow::bail!(
                "SINK_URL must start with 'http://' or 'https://', got '{}'",
                self.sink_url
            );
        }

        if self.sink_timeout_secs == 0 || self.sink_timeout_secs > 300 {
            anyhow::bail!(
                "SINK_TIMEOUT_SECS must be between 1 and 300, got {}",
                self.sink_timeout_secs
            );
        }

        Ok(())
    }

    /// Returns whether records are shipped to a remote sink.
    pub fn is_remote_sink_enabled(&self) -> bool {
        self.sink_token.is_some()
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  Access log format: {}", self.access_log_format);
        tracing::info!(
            "  Access log mode: {}",
            if self.access_log_immediate {
                "immediate"
            } else {
                "deferred"
            }
        );
        tracing::info!(
            "  Access log tags: iis (always), extra [{}]",
            self.access_log_tags.join(",")
        );

        if let Some(ip) = self.server_ip {
            tracing::info!("  Server IP: {} (configured)", ip);
        }

        if let Some(ref token) = self.sink_token {
            tracing::info!("  Sink: {} (token {})", self.sink_url, mask_token(token));
        } else {
            tracing::info!("  Sink: process log");
        }
    }
}

/// Parses a boolean variable, accepting `true`/`false`/`1`/`0` in any case.
fn load_bool(name: &str, default: bool) -> Result<bool> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => anyhow::bail!("{name} must be a boolean, got '{other}'"),
    }
}

/// Splits a comma-separated list, dropping empty entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Masks a secret token for logging, keeping the first four characters.
///
/// - `0b1c2d3e-aaaa` → `0b1c***`
/// - `abc` → `***`
fn mask_token(token: &str) -> String {
    match token.char_indices().nth(4) {
        Some((idx, _)) if token.len() > 8 => format!("{}***", &token[..idx]),
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "ACCESS_LOG_FORMAT",
        "ACCESS_LOG_IMMEDIATE",
        "ACCESS_LOG_STRUCTURED",
        "ACCESS_LOG_TAGS",
        "ACCESS_LOG_SKIP_PATHS",
        "SINK_URL",
        "SINK_TOKEN",
        "SINK_TIMEOUT_SECS",
        "LOG_FORMAT",
        "SERVER_IP",
    ];

    fn clear_env() {
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn valid_config() -> Config {
        Config {
            listen_addr: "0.0.0.0:3000".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            access_log_format: "iis".to_string(),
            access_log_immediate: false,
            access_log_structured: true,
            access_log_tags: Vec::new(),
            access_log_skip_paths: Vec::new(),
            sink_url: DEFAULT_SINK_URL.to_string(),
            sink_token: None,
            sink_timeout_secs: 5,
            server_ip: None,
        }
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("0b1c2d3e-aaaa-bbbb"), "0b1c***");
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token(""), "***");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" web, iis ,,"), vec!["web", "iis"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        // Test invalid log format
        config.log_format = "invalid".to_string();
        assert!(config.validate().is_err());

        config.log_format = "json".to_string();
        assert!(config.validate().is_ok());

        // Test invalid listen address
        config.listen_addr = "3000".to_string();
        assert!(config.validate().is_err());

        config.listen_addr = "0.0.0.0:3000".to_string();

        // Test invalid sink URL
        config.sink_url = "ftp://logs.example.com".to_string();
        assert!(config.validate().is_err());

        config.sink_url = DEFAULT_SINK_URL.to_string();

        // Test out-of-range timeout
        config.sink_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.sink_timeout_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.access_log_format, "iis");
        assert!(!config.access_log_immediate);
        assert!(config.access_log_structured);
        assert!(config.access_log_tags.is_empty());
        assert!(config.access_log_skip_paths.is_empty());
        assert_eq!(config.sink_url, DEFAULT_SINK_URL);
        assert!(!config.is_remote_sink_enabled());
        assert_eq!(config.sink_timeout(), Duration::from_secs(5));
        assert!(config.server_ip.is_none());
    }

    #[test]
    #[serial]
    fn test_access_log_from_env() {
        clear_env();
        // SAFETY: Tests are run serially due to #[serial], so no concurrent access
        unsafe {
            env::set_var("ACCESS_LOG_FORMAT", "combined");
            env::set_var("ACCESS_LOG_IMMEDIATE", "TRUE");
            env::set_var("ACCESS_LOG_STRUCTURED", "0");
            env::set_var("ACCESS_LOG_TAGS", "web, combined");
            env::set_var("ACCESS_LOG_SKIP_PATHS", "/health,/metrics");
            env::set_var("SINK_TOKEN", "0b1c2d3e-aaaa");
            env::set_var("SINK_TIMEOUT_SECS", "10");
            env::set_var("SERVER_IP", " 192.168.1.20 ");
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.access_log_format, "combined");
        assert!(config.access_log_immediate);
        assert!(!config.access_log_structured);
        assert_eq!(config.access_log_tags, vec!["web", "combined"]);
        assert_eq!(config.access_log_skip_paths, vec!["/health", "/metrics"]);
        assert_eq!(config.sink_token.as_deref(), Some("0b1c2d3e-aaaa"));
        assert_eq!(config.sink_timeout_secs, 10);
        assert_eq!(config.server_ip, Some("192.168.1.20".parse().unwrap()));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_token_disables_remote_sink() {
        clear_env();
        // SAFETY: Tests are run serially
        unsafe {
            env::set_var("SINK_TOKEN", "   ");
        }

        let config = Config::from_env().unwrap();
        assert!(!config.is_remote_sink_enabled());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        // SAFETY: Tests are run serially
        unsafe {
            env::set_var("ACCESS_LOG_IMMEDIATE", "sometimes");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var("SINK_TIMEOUT_SECS", "soon");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var("SERVER_IP", "web-01");
        }
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
