//! # Navigation Gating
//!
//! Pure decisions about what the user may do next, recomputed from the
//! current phase's state and the policy flags on every render.
//!
//! Nothing here mutates state, so evaluating the same inputs twice always
//! yields the same affordances.

use crate::flow::{Outcome, PhaseState, PromptAnswer};
use crate::{DeploymentMode, Phase, PolicyFlags};
use serde::{Deserialize, Serialize};

/// Whether the flow may move past this phase.
///
/// False while the phase is pending or running and whenever a strict
/// failure, an install failure or an unexpected error is recorded. Soft
/// failures pass only if the phase's block flag is unset.
#[must_use]
pub fn can_proceed(state: &PhaseState, flags: &PolicyFlags) -> bool {
    match state.outcome() {
        None => false,
        Some(Outcome::Passed | Outcome::Skipped) => true,
        Some(Outcome::SoftFailure) => !flags.blocks_on_failure(state.phase),
        Some(Outcome::StrictFailure | Outcome::InstallFailure | Outcome::Error) => false,
    }
}

/// Whether to ask the user to continue despite failures.
#[must_use]
pub fn should_show_confirmation_modal(state: &PhaseState, flags: &PolicyFlags) -> bool {
    state.outcome() == Some(Outcome::SoftFailure)
        && !flags.blocks_on_failure(state.phase)
        && state.prompt == PromptAnswer::Unanswered
}

/// Whether the "next" button is shown.
#[must_use]
pub fn should_show_next_button(state: &PhaseState, flags: &PolicyFlags) -> bool {
    state.status.is_resolved() && can_proceed(state, flags)
}

/// Label of the "next" button on `phase`: the name of the upcoming phase.
#[must_use]
pub fn next_button_label(phase: Phase, mode: DeploymentMode) -> &'static str {
    let phases = mode.phases();
    let next = phases
        .iter()
        .position(|p| *p == phase)
        .and_then(|i| phases.get(i.saturating_add(1)));

    match next {
        Some(Phase::Hosts) => "Next: Validate Hosts",
        Some(Phase::Infrastructure) => "Next: Install Infrastructure",
        Some(Phase::Preflights) => "Next: Validate Application",
        Some(Phase::Application) => "Next: Start Installation",
        None => "Finish",
    }
}

/// All affordances of one phase, as the presentation layer consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordances {
    pub can_proceed: bool,
    pub show_next_button: bool,
    pub next_button_label: String,
    pub show_confirmation_modal: bool,
}

impl Affordances {
    #[must_use]
    pub fn evaluate(mode: DeploymentMode, state: &PhaseState, flags: &PolicyFlags) -> Self {
        Self {
            can_proceed: can_proceed(state, flags),
            show_next_button: should_show_next_button(state, flags),
            next_button_label: next_button_label(state.phase, mode).to_string(),
            show_confirmation_modal: should_show_confirmation_modal(state, flags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::environment_report;
    use crate::flow::{PhaseResult, PhaseStatus};
    use crate::InstallConfig;

    fn resolved_preflights(flags: &PolicyFlags) -> PhaseState {
        let report = environment_report(&InstallConfig::default(), flags);
        let mut state = PhaseState::new(Phase::Preflights);
        state.status = if report.has_failures() {
            PhaseStatus::Failed
        } else {
            PhaseStatus::Completed
        };
        state.result = Some(PhaseResult::Validation(report));
        state
    }

    #[test]
    fn running_phase_cannot_proceed() {
        let mut state = PhaseState::new(Phase::Preflights);
        state.status = PhaseStatus::Running;
        assert!(!can_proceed(&state, &PolicyFlags::default()));
        assert!(!should_show_next_button(&state, &PolicyFlags::default()));
    }

    #[test]
    fn soft_failure_offers_modal_once() {
        let flags = PolicyFlags {
            fail_preflights: true,
            ..PolicyFlags::default()
        };
        let mut state = resolved_preflights(&flags);
        assert!(can_proceed(&state, &flags));
        assert!(should_show_confirmation_modal(&state, &flags));

        state.prompt = PromptAnswer::Declined;
        assert!(!should_show_confirmation_modal(&state, &flags));
        assert!(can_proceed(&state, &flags));
    }

    #[test]
    fn block_flag_removes_bypass() {
        let flags = PolicyFlags {
            fail_preflights: true,
            block_on_app_preflights: true,
            ..PolicyFlags::default()
        };
        let state = resolved_preflights(&flags);
        assert!(!can_proceed(&state, &flags));
        assert!(!should_show_confirmation_modal(&state, &flags));
    }

    #[test]
    fn strict_failure_blocks_even_without_block_flag() {
        let flags = PolicyFlags {
            fail_preflights: true,
            make_preflights_strict: true,
            ..PolicyFlags::default()
        };
        let state = resolved_preflights(&flags);
        assert!(!can_proceed(&state, &flags));
        assert!(!should_show_confirmation_modal(&state, &flags));
        assert!(!should_show_next_button(&state, &flags));
    }

    #[test]
    fn labels_name_the_upcoming_phase() {
        assert_eq!(
            next_button_label(Phase::Hosts, DeploymentMode::Linux),
            "Next: Install Infrastructure"
        );
        assert_eq!(
            next_button_label(Phase::Infrastructure, DeploymentMode::Linux),
            "Next: Validate Application"
        );
        assert_eq!(
            next_button_label(Phase::Preflights, DeploymentMode::Kubernetes),
            "Next: Start Installation"
        );
        assert_eq!(
            next_button_label(Phase::Application, DeploymentMode::Kubernetes),
            "Finish"
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let flags = PolicyFlags {
            fail_preflights: true,
            ..PolicyFlags::default()
        };
        let state = resolved_preflights(&flags);
        let first = Affordances::evaluate(DeploymentMode::Kubernetes, &state, &flags);
        let second = Affordances::evaluate(DeploymentMode::Kubernetes, &state, &flags);
        assert_eq!(first, second);
    }
}
