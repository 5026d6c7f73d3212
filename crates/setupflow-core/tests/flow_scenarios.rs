//! # Flow Scenario Tests
//!
//! End-to-end walks through the flow controller with literal policy
//! flags, grouped by the preflight outcome they exercise.
//!
//! ## Groups
//! - clean: default flags auto-advance
//! - bypassable: soft failures gated by confirmation
//! - strict: strict failures only recover through rerun

use setupflow_core::{
    ComponentStatus, Decision, DeploymentMode, FlowController, FlowState, InstallConfig,
    InstallationStatus, Phase, PhaseResult, PolicyFlags, StatusPatch, Started, can_proceed,
    environment_report, should_show_confirmation_modal,
};

fn run_preflights(flow: &mut FlowController, flags: &PolicyFlags) -> Decision {
    assert_eq!(flow.begin(flags).expect("begin"), Started::Run(Phase::Preflights));
    let report = environment_report(&InstallConfig::default(), flags);
    flow.resolve(PhaseResult::Validation(report), flags)
        .expect("resolve")
}

fn completed_application() -> PhaseResult {
    let mut status = InstallationStatus::for_phase(Phase::Application);
    for component in Phase::Application.components() {
        status.apply(&StatusPatch::new().component(*component, ComponentStatus::Completed));
    }
    PhaseResult::Installation(status)
}

// =============================================================================
// CLEAN
// =============================================================================

mod clean {
    use super::*;

    /// Default flags: preflights pass and the flow heads for the application phase.
    #[test]
    fn default_flags_auto_advance() {
        let flags = PolicyFlags::default();
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);

        assert_eq!(run_preflights(&mut flow, &flags), Decision::Advance);
        assert_eq!(
            flow.state(),
            FlowState::Advancing {
                from: Phase::Preflights,
                to: Phase::Application
            }
        );
        let state = flow.phase_state(Phase::Preflights).expect("preflights");
        assert!(can_proceed(state, &flags));
        assert!(!should_show_confirmation_modal(state, &flags));
    }

    /// The last phase completing finishes the flow.
    #[test]
    fn application_completion_finishes() {
        let flags = PolicyFlags::default();
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);
        run_preflights(&mut flow, &flags);
        flow.advance().expect("advance");
        flow.begin(&flags).expect("begin");

        let decision = flow
            .resolve(completed_application(), &flags)
            .expect("resolve");
        assert_eq!(decision, Decision::Complete);
        assert!(flow.is_complete());
    }
}

// =============================================================================
// BYPASSABLE
// =============================================================================

mod bypassable {
    use super::*;

    fn flags() -> PolicyFlags {
        PolicyFlags {
            fail_preflights: true,
            make_preflights_strict: false,
            block_on_app_preflights: false,
            ..PolicyFlags::default()
        }
    }

    /// Non-strict failures prompt, and confirming continues to the application phase.
    #[test]
    fn confirmation_continues() {
        let flags = flags();
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);

        assert_eq!(run_preflights(&mut flow, &flags), Decision::AwaitConfirmation);
        let state = flow.phase_state(Phase::Preflights).expect("preflights");
        assert!(should_show_confirmation_modal(state, &flags));

        assert_eq!(flow.confirm(&flags).expect("confirm"), Decision::Advance);
        assert_eq!(flow.advance().expect("advance"), Phase::Application);
        assert_eq!(flow.begin(&flags).expect("begin"), Started::Run(Phase::Application));
    }

    /// With the block flag, the same failures cannot be bypassed.
    #[test]
    fn block_flag_blocks() {
        let flags = PolicyFlags {
            block_on_app_preflights: true,
            ..flags()
        };
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);

        assert_eq!(run_preflights(&mut flow, &flags), Decision::Blocked);
        assert!(flow.confirm(&flags).is_err());
    }

    /// Declining, then pressing next again, still continues.
    #[test]
    fn confirm_after_decline() {
        let flags = flags();
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);
        run_preflights(&mut flow, &flags);
        flow.decline().expect("decline");

        let state = flow.phase_state(Phase::Preflights).expect("preflights");
        assert!(!should_show_confirmation_modal(state, &flags));
        assert_eq!(flow.confirm(&flags).expect("confirm"), Decision::Advance);
    }
}

// =============================================================================
// STRICT
// =============================================================================

mod strict {
    use super::*;

    /// Strict permissions failure blocks regardless of the block flag.
    #[test]
    fn strict_failure_blocks_either_way() {
        for block in [false, true] {
            let flags = PolicyFlags {
                fail_preflights: true,
                make_preflights_strict: true,
                block_on_app_preflights: block,
                ..PolicyFlags::default()
            };
            let mut flow = FlowController::new(DeploymentMode::Kubernetes);

            assert_eq!(run_preflights(&mut flow, &flags), Decision::Blocked);
            let state = flow.phase_state(Phase::Preflights).expect("preflights");
            assert!(!can_proceed(state, &flags));
            assert!(!should_show_confirmation_modal(state, &flags));

            let Some(PhaseResult::Validation(report)) = &state.result else {
                unreachable!("preflights resolve with a validation report");
            };
            let permissions = report.get("permissions").expect("permissions");
            assert!(!permissions.success && permissions.is_strict);
        }
    }

    /// Rerun with fixed flags recovers.
    #[test]
    fn rerun_recovers() {
        let strict = PolicyFlags {
            fail_preflights: true,
            make_preflights_strict: true,
            ..PolicyFlags::default()
        };
        let mut flow = FlowController::new(DeploymentMode::Kubernetes);
        run_preflights(&mut flow, &strict);

        flow.rerun().expect("rerun");
        let fixed = PolicyFlags::default();
        assert_eq!(run_preflights(&mut flow, &fixed), Decision::Advance);
        let state = flow.phase_state(Phase::Preflights).expect("preflights");
        assert_eq!(state.attempts, 2);
    }
}
