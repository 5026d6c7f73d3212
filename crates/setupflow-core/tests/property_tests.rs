//! # Property-Based Tests
//!
//! Invariants of the decision tables, status merging and gating that must
//! hold for every combination of policy flags.

use proptest::collection::vec;
use proptest::prelude::*;
use setupflow_core::{
    Component, ComponentStatus, EnvironmentCheck, FlowController, HostCheck, InstallConfig,
    InstallationStatus, Phase, PhaseResult, PhaseState, PhaseStatus, PolicyFlags, StatusPatch,
    can_proceed, environment_report, host_report, should_show_confirmation_modal,
};

fn flags_from(bits: &[bool]) -> PolicyFlags {
    let bit = |i: usize| bits.get(i).copied().unwrap_or(false);
    PolicyFlags {
        fail_host_preflights: bit(0),
        make_host_preflights_strict: bit(1),
        block_on_host_preflights: bit(2),
        skip_host_preflights: bit(3),
        fail_preflights: bit(4),
        make_preflights_strict: bit(5),
        many_preflight_failures: bit(6),
        block_on_app_preflights: bit(7),
        skip_app_preflights: bit(8),
        fail_installation: bit(9),
        ..PolicyFlags::default()
    }
}

fn resolved(phase: Phase, result: PhaseResult) -> PhaseState {
    let mut state = PhaseState::new(phase);
    state.status = if result.outcome().is_failure() {
        PhaseStatus::Failed
    } else {
        PhaseStatus::Completed
    };
    state.result = Some(result);
    state
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Every environment check has an entry, whatever the flags.
    #[test]
    fn environment_report_has_every_check(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        let report = environment_report(&InstallConfig::default(), &flags);

        prop_assert_eq!(report.len(), EnvironmentCheck::ALL.len());
        for check in EnvironmentCheck::ALL {
            prop_assert!(report.get(check.spec().name).is_some());
        }
    }

    /// Every host gets every host check.
    #[test]
    fn host_report_has_every_check(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        let config = InstallConfig::default();
        let report = host_report(&config, &flags);

        prop_assert_eq!(report.len(), config.hosts.len());
        for (_, checks) in report.iter() {
            for check in HostCheck::ALL {
                prop_assert!(checks.get(check.spec().name).is_some());
            }
        }
    }

    /// Without the fail flag nothing fails.
    #[test]
    fn no_fail_flag_means_no_failures(bits in vec(any::<bool>(), 10)) {
        let mut flags = flags_from(&bits);
        flags.fail_preflights = false;
        let report = environment_report(&InstallConfig::default(), &flags);
        prop_assert_eq!(report.failure_count(), 0);
    }

    /// Only declared-strictable checks are ever strict.
    #[test]
    fn strictness_follows_declaration(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        let report = environment_report(&InstallConfig::default(), &flags);
        for check in EnvironmentCheck::ALL {
            let spec = check.spec();
            if let Some(result) = report.get(spec.name) {
                prop_assert!(!result.is_strict || spec.strictable);
                prop_assert!(!result.is_strict || !result.success);
            }
        }
    }

    /// Strict failures are never bypassable.
    #[test]
    fn strict_failure_blocks_proceeding(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        let report = environment_report(&InstallConfig::default(), &flags);
        let strict = report.has_strict_failure();
        let state = resolved(Phase::Preflights, PhaseResult::Validation(report));

        if strict {
            prop_assert!(!can_proceed(&state, &flags));
            prop_assert!(!should_show_confirmation_modal(&state, &flags));
        }
    }

    /// A running phase can never proceed.
    #[test]
    fn running_phase_never_proceeds(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        for phase in [Phase::Hosts, Phase::Infrastructure, Phase::Preflights, Phase::Application] {
            let mut state = PhaseState::new(phase);
            state.status = PhaseStatus::Running;
            prop_assert!(!can_proceed(&state, &flags));
        }
    }

    /// Merged progress never decreases, whatever order patches arrive in.
    #[test]
    fn merged_progress_is_monotonic(values in vec(0u8..=255, 0..40)) {
        let mut status = InstallationStatus::for_phase(Phase::Application);
        let mut last = status.progress();
        for value in values {
            status.apply(&StatusPatch::new().progress(value));
            prop_assert!(status.progress() >= last);
            prop_assert!(status.progress() <= 100);
            last = status.progress();
        }
    }

    /// `overall` is completed only when every component is.
    #[test]
    fn overall_completed_requires_all_components(
        updates in vec((0usize..3, 0usize..4), 0..20)
    ) {
        let components = [Component::Database, Component::Core, Component::Plugins];
        let statuses = [
            ComponentStatus::Pending,
            ComponentStatus::InProgress,
            ComponentStatus::Completed,
            ComponentStatus::Failed,
        ];
        let mut status = InstallationStatus::for_phase(Phase::Application);
        for (c, s) in updates {
            status.apply(&StatusPatch::new().component(components[c], statuses[s]));
            let all_done = status.components().all(|(_, s)| s == ComponentStatus::Completed);
            prop_assert_eq!(status.is_completed(), all_done);
        }
    }

    /// Begin/resolve never leaves two phases running.
    #[test]
    fn at_most_one_phase_running(bits in vec(any::<bool>(), 10)) {
        let flags = flags_from(&bits);
        let mut flow = FlowController::new(setupflow_core::DeploymentMode::Linux);
        let _ = flow.begin(&flags);
        let running = flow
            .phase_states()
            .filter(|s| s.status == PhaseStatus::Running)
            .count();
        prop_assert!(running <= 1);
        prop_assert!(flow.begin(&flags).is_err());
    }
}
