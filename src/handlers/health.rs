//! Handler for health check endpoint.

use axum::Json;
use serde::Serialize;

/// Body of the health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Returns service liveness.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
///
/// Usually listed in `ACCESS_LOG_SKIP_PATHS` so probes stay out of the
/// access log.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
