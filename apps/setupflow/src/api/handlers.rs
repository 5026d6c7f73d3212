//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads come from the snapshot channel and never wait on a running phase.
//! Actions take the wizard lock and return once the flow needs the user
//! again.

use super::{
    AppState,
    types::{ActionResponse, HealthResponse},
};
use crate::wizard::Wizard;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use setupflow_core::{FlowState, WizardError};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATE HANDLER
// =============================================================================

/// Latest wizard snapshot with gating affordances.
pub async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshots.borrow().clone();
    (StatusCode::OK, Json(snapshot))
}

// =============================================================================
// ACTION HANDLERS
// =============================================================================

fn status_for(error: &WizardError) -> StatusCode {
    match error {
        WizardError::InvalidTransition { .. } => StatusCode::CONFLICT,
        WizardError::InvalidConfig(_) | WizardError::DeserializationError(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond(
    wizard: &Wizard,
    action: &str,
    result: Result<FlowState, WizardError>,
) -> (StatusCode, Json<ActionResponse>) {
    match result {
        Ok(flow) => {
            tracing::debug!(action, %flow, "Action applied");
            (StatusCode::OK, Json(ActionResponse::success(wizard.snapshot())))
        }
        Err(e) => {
            tracing::warn!(action, error = %e, "Action rejected");
            (status_for(&e), Json(ActionResponse::error(e.to_string())))
        }
    }
}

/// Run phases until the flow needs the user.
pub async fn run_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let result = wizard.run().await;
    respond(&wizard, "run", result)
}

/// Continue past bypassable failures.
pub async fn confirm_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let result = wizard.confirm().await;
    respond(&wizard, "confirm", result)
}

/// Refuse to continue past failures.
pub async fn decline_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let result = wizard.decline();
    respond(&wizard, "decline", result)
}

/// The "next" button.
pub async fn next_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let result = wizard.next().await;
    respond(&wizard, "next", result)
}

/// Rerun the current phase.
pub async fn rerun_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let result = wizard.rerun().await;
    respond(&wizard, "rerun", result)
}
