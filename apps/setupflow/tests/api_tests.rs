//! Integration tests for the setupflow HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use setupflow::api::{ActionResponse, AppState, HealthResponse, create_router};
use setupflow::{InstantClock, MemoryFlags, Wizard, WizardSnapshot};
use setupflow_core::{DeploymentMode, FlowState, InstallConfig, Phase, PolicyFlags};
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a test server around a wizard on an instant clock.
fn create_test_server(mode: DeploymentMode, flags: PolicyFlags) -> TestServer {
    let wizard = Wizard::new(
        mode,
        InstallConfig::default(),
        Arc::new(MemoryFlags::new(flags)),
        Arc::new(InstantClock::new()),
    );
    TestServer::new(create_router(AppState::new(wizard))).expect("test server")
}

fn soft_failure_flags() -> PolicyFlags {
    PolicyFlags {
        fail_preflights: true,
        ..PolicyFlags::default()
    }
}

fn snapshot_of(response: &ActionResponse) -> &WizardSnapshot {
    response.snapshot.as_ref().expect("snapshot")
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server(DeploymentMode::Kubernetes, PolicyFlags::default());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_initial_state_is_idle() {
    let server = create_test_server(DeploymentMode::Linux, PolicyFlags::default());

    let response = server.get("/state").await;

    response.assert_status_ok();
    let snapshot: WizardSnapshot = response.json();
    assert_eq!(snapshot.flow, FlowState::Idle { phase: Phase::Hosts });
    assert_eq!(snapshot.phases.len(), 4);
    assert!(!snapshot.complete);
}

#[tokio::test]
async fn test_state_json_shape() {
    let server = create_test_server(DeploymentMode::Kubernetes, soft_failure_flags());
    server.post("/run").await.assert_status_ok();

    let body: Value = server.get("/state").await.json();

    assert_eq!(body["flow"]["state"], "awaiting-confirmation");
    assert_eq!(body["flow"]["phase"], "preflights");
    let preflights = &body["phases"][0];
    assert_eq!(preflights["state"]["status"], "failed");
    assert_eq!(preflights["affordances"]["showConfirmationModal"], true);
    assert_eq!(
        preflights["state"]["result"]["report"]["storage"]["success"],
        false
    );
    assert!(preflights["state"]["result"]["report"]["storage"]["isStrict"].is_null());
}

// =============================================================================
// ACTION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_run_default_flags_completes() {
    let server = create_test_server(DeploymentMode::Kubernetes, PolicyFlags::default());

    let response = server.post("/run").await;

    response.assert_status_ok();
    let action: ActionResponse = response.json();
    assert!(action.success);
    assert!(snapshot_of(&action).complete);

    let snapshot: WizardSnapshot = server.get("/state").await.json();
    assert_eq!(snapshot.flow, FlowState::Complete);
}

#[tokio::test]
async fn test_confirm_after_soft_failure() {
    let server = create_test_server(DeploymentMode::Kubernetes, soft_failure_flags());

    let action: ActionResponse = server.post("/run").await.json();
    assert_eq!(
        snapshot_of(&action).flow,
        FlowState::AwaitingConfirmation {
            phase: Phase::Preflights
        }
    );

    let response = server.post("/confirm").await;
    response.assert_status_ok();
    let action: ActionResponse = response.json();
    assert_eq!(snapshot_of(&action).flow, FlowState::Complete);
}

#[tokio::test]
async fn test_decline_then_rerun() {
    let server = create_test_server(DeploymentMode::Kubernetes, soft_failure_flags());
    server.post("/run").await.assert_status_ok();

    let action: ActionResponse = server.post("/decline").await.json();
    assert_eq!(
        snapshot_of(&action).flow,
        FlowState::Declined {
            phase: Phase::Preflights
        }
    );

    // Same flags, so the rerun lands on the same prompt.
    let action: ActionResponse = server.post("/rerun").await.json();
    let snapshot = snapshot_of(&action);
    assert_eq!(
        snapshot.flow,
        FlowState::AwaitingConfirmation {
            phase: Phase::Preflights
        }
    );
    assert_eq!(
        snapshot
            .phase(Phase::Preflights)
            .map(|p| p.state.attempts),
        Some(2)
    );
}

#[tokio::test]
async fn test_invalid_action_is_conflict() {
    let server = create_test_server(DeploymentMode::Kubernetes, PolicyFlags::default());

    let response = server.post("/confirm").await;

    response.assert_status(StatusCode::CONFLICT);
    let action: ActionResponse = response.json();
    assert!(!action.success);
    assert!(action.snapshot.is_none());
    assert!(
        action
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Cannot confirm"))
    );
}

#[tokio::test]
async fn test_strict_failure_cannot_be_confirmed() {
    let server = create_test_server(
        DeploymentMode::Kubernetes,
        PolicyFlags {
            fail_preflights: true,
            make_preflights_strict: true,
            ..PolicyFlags::default()
        },
    );

    let action: ActionResponse = server.post("/run").await.json();
    let snapshot = snapshot_of(&action);
    assert_eq!(
        snapshot.flow,
        FlowState::Blocked {
            phase: Phase::Preflights
        }
    );
    let preflights = snapshot.phase(Phase::Preflights).expect("preflights");
    assert!(!preflights.affordances.show_confirmation_modal);

    server
        .post("/confirm")
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .post("/next")
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_next_with_manual_advance() {
    let mut flags = PolicyFlags::default();
    flags.manual_advance.insert(Phase::Hosts);
    let server = create_test_server(DeploymentMode::Linux, flags);

    let action: ActionResponse = server.post("/run").await.json();
    let snapshot = snapshot_of(&action);
    assert_eq!(
        snapshot.flow,
        FlowState::AwaitingAdvance { phase: Phase::Hosts }
    );
    assert_eq!(
        snapshot
            .phase(Phase::Hosts)
            .map(|p| p.affordances.next_button_label.as_str()),
        Some("Next: Install Infrastructure")
    );

    let action: ActionResponse = server.post("/next").await.json();
    assert_eq!(snapshot_of(&action).flow, FlowState::Complete);
}
