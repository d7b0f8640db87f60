//! Stateless JSON API over the cost engine.
//!
//! - `POST /tco`: cost one scenario
//! - `POST /compare`: cost and compare all four scenarios
//! - `GET /stress-tests`: stress test catalog
//! - `POST /stress`: run every stress test
//! - `POST /stress/{id}`: run one stress test
//! - `POST /sensitivity`: sweep assumptions and rank them
//! - `GET /registry`: assumption registry
//!
//! Every failure, including an undecodable body, is a 400 with an
//! `{"error": ...}` body.

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::engine::TcoEngine;
use crate::registry::Registry;

pub use types::{ErrorResponse, SensitivityRequest, StressTestInfo};

/// Read-only state shared by every handler.
pub struct AppState {
    pub engine: TcoEngine,
    pub registry: Registry,
}

impl AppState {
    pub fn new(engine: TcoEngine) -> Self {
        let registry = Registry::from_defaults(engine.defaults());
        Self { engine, registry }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tco", post(handlers::post_tco))
        .route("/compare", post(handlers::post_compare))
        .route("/stress-tests", get(handlers::get_stress_tests))
        .route("/stress", post(handlers::post_stress_all))
        .route("/stress/{id}", post(handlers::post_stress_one))
        .route("/sensitivity", post(handlers::post_sensitivity))
        .route("/registry", get(handlers::get_registry))
        .with_state(state)
}

/// Binds to `addr` and serves until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
