//! HTTP server initialization and runtime setup.
//!
//! Handles token and format setup, sink selection, and Axum server lifecycle.

use crate::config::Config;
use crate::format::FormatCatalog;
use crate::infrastructure::sink::{HttpSink, LogSink, TracingSink};
use crate::middlewares::access_log::AccessLogger;
use crate::routes::app_router;
use crate::tokens::{HostInfo, TokenRegistry};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

/// Selects the sink described by the configuration.
///
/// Uses [`HttpSink`] when a token is configured and [`TracingSink`] otherwise.
///
/// # Errors
///
/// Returns an error if the sink URL is invalid or the HTTP client cannot be
/// built.
pub fn build_sink(config: &Config) -> Result<Arc<dyn LogSink>> {
    if let Some(token) = &config.sink_token {
        let sink = HttpSink::new(&config.sink_url, token, config.sink_timeout())
            .context("Failed to create HTTP sink")?;
        tracing::info!("Access log sink enabled ({})", config.sink_url);
        Ok(Arc::new(sink))
    } else {
        tracing::info!("Access log sink disabled, writing to process log");
        Ok(Arc::new(TracingSink))
    }
}

/// Detects host details, applying the configured server address if any.
pub fn detect_host(config: &Config) -> HostInfo {
    let host = detect_host(&config);
    match config.server_ip {
        Some(ip) => host.with_server_ip(ip),
        None => host,
    }
}

/// Builds the access logger described by the configuration.
///
/// # Errors
///
/// Returns an error if the sink cannot be created or the format cannot be
/// resolved.
pub fn build_logger(config: &Config, catalog: Arc<FormatCatalog>) -> Result<AccessLogger> {
    let skip_paths: HashSet<String> = config.access_log_skip_paths.iter().cloned().collect();

    let mut builder = AccessLogger::builder(catalog)
        .format(config.access_log_format.as_str())
        .immediate(config.access_log_immediate)
        .structured(config.access_log_structured)
        .tags(config.access_log_tags.iter().cloned())
        .sink(build_sink(config)?);

    if !skip_paths.is_empty() {
        builder = builder.skip(move |req, _res| skip_paths.contains(req.uri().path()));
    }

    builder.build().context("Failed to build access logger")
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Token registry with built-in tokens and detected host details
/// - Format catalog (`combined`, `iis`, `dev`)
/// - Access log sink
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - The access logger cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let host = detect_host(&config);
    tracing::info!(
        computer_name = host.computer_name().unwrap_or("-"),
        server_ip = ?host.server_ip(),
        "Host details detected"
    );

    let registry = Arc::new(TokenRegistry::with_host(host));
    let catalog = Arc::new(FormatCatalog::with_builtins(registry));

    let logger = build_logger(&config, catalog)?;
    let app = app_router(logger);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
