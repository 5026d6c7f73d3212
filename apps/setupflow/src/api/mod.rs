//! # setupflow HTTP API Module
//!
//! This module exposes the wizard to a presentation layer using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /state` - Latest wizard snapshot with gating affordances
//! - `POST /run` - Run phases until the flow needs the user
//! - `POST /confirm` - Continue past bypassable failures
//! - `POST /decline` - Refuse to continue past failures
//! - `POST /next` - The "next" button
//! - `POST /rerun` - Rerun the current phase
//!
//! Actions that are not legal in the current flow state answer `409 Conflict`.
//!
//! ## Configuration (Environment Variables)
//!
//! - `SETUPFLOW_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `setupflow::api::*`)
pub use handlers::{
    confirm_handler, decline_handler, health_handler, next_handler, rerun_handler, run_handler,
    state_handler,
};
pub use types::{ActionResponse, HealthResponse};

use crate::wizard::{Wizard, WizardSnapshot};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use setupflow_core::WizardError;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The wizard, locked for the duration of an action.
    pub wizard: Arc<Mutex<Wizard>>,
    /// Latest snapshot, readable while an action is in flight.
    pub snapshots: watch::Receiver<WizardSnapshot>,
}

impl AppState {
    #[must_use]
    pub fn new(wizard: Wizard) -> Self {
        let snapshots = wizard.subscribe();
        Self {
            wizard: Arc::new(Mutex::new(wizard)),
            snapshots,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `SETUPFLOW_CORS_ORIGINS`.
///
/// - "*": allows all origins
/// - not set: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("SETUPFLOW_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (SETUPFLOW_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in SETUPFLOW_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/state", get(handlers::state_handler))
        .route("/run", post(handlers::run_handler))
        .route("/confirm", post(handlers::confirm_handler))
        .route("/decline", post(handlers::decline_handler))
        .route("/next", post(handlers::next_handler))
        .route("/rerun", post(handlers::rerun_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer()),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, wizard: Wizard) -> Result<(), WizardError> {
    let router = create_router(AppState::new(wizard));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WizardError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("setupflow HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| WizardError::IoError(format!("Server error: {}", e)))
}
