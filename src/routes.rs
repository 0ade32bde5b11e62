//! Router of the demo server.
//!
//! # Route Structure
//!
//! - `GET /`         - Home page
//! - `GET /people`   - People page
//! - `GET /services` - Services page
//! - `GET /health`   - Liveness probe
//!
//! # Middleware
//!
//! - **Access log** - One templated line per exchange, shipped to the sink
//! - **Tracing** - Request spans for the process log

use crate::handlers::{health_handler, home_handler, people_handler, services_handler};
use crate::middlewares::access_log::{self, AccessLogger};
use crate::middlewares::tracing;
use axum::routing::get;
use axum::{Router, middleware};
use tower::ServiceBuilder;

/// Constructs the demo router with all routes and middleware.
///
/// The access log wraps every route, so requests answered by the fallback
/// (404) are logged too.
pub fn app_router(logger: AccessLogger) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/people", get(people_handler))
        .route("/services", get(services_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(tracing::layer())
                .layer(middleware::from_fn_with_state(logger, access_log::layer)),
        )
}
