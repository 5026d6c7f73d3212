//! # Installation Flow Controller
//!
//! The finite state machine that sequences the phases of one deployment
//! mode. It is synchronous and owns no clock: the runtime starts a phase,
//! runs the matching simulator, feeds the result back, and performs the
//! auto-advance delay itself.
//!
//! ## Transition Table
//!
//! Every resolved phase is classified into an [`Outcome`]; [`decide`] maps
//! the outcome and the phase's [`Gate`] to a [`Decision`]:
//!
//! | Outcome | last phase | manual advance | bypass blocked | Decision |
//! |---------|------------|----------------|----------------|----------|
//! | passed / skipped | yes | - | - | complete |
//! | passed / skipped | no | yes | - | await advance |
//! | passed / skipped | no | no | - | advance |
//! | soft failure | - | - | no | await confirmation |
//! | soft failure | - | - | yes | blocked |
//! | strict failure | - | - | - | blocked |
//! | install failure | - | - | - | blocked |
//! | error | - | - | - | blocked |
//!
//! Confirming a soft failure continues exactly like a clean pass.
//! A blocked or declined phase only moves again through [`FlowController::rerun`].

use crate::{
    DeploymentMode, HostValidationReport, InstallationStatus, Phase, PolicyFlags,
    ValidationReport, WizardError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PHASE RESULTS & OUTCOMES
// =============================================================================

/// What a simulator produced for a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "report", rename_all = "kebab-case")]
pub enum PhaseResult {
    Hosts(HostValidationReport),
    Validation(ValidationReport),
    Installation(InstallationStatus),
}

impl PhaseResult {
    /// Classify the result.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            PhaseResult::Hosts(report) => {
                validation_outcome(report.has_failures(), report.has_strict_failure())
            }
            PhaseResult::Validation(report) => {
                validation_outcome(report.has_failures(), report.has_strict_failure())
            }
            PhaseResult::Installation(status) => {
                if status.is_completed() {
                    Outcome::Passed
                } else {
                    Outcome::InstallFailure
                }
            }
        }
    }

    /// Whether this kind of result belongs to the phase.
    #[must_use]
    pub fn matches(&self, phase: Phase) -> bool {
        matches!(
            (self, phase),
            (PhaseResult::Hosts(_), Phase::Hosts)
                | (PhaseResult::Validation(_), Phase::Preflights)
                | (
                    PhaseResult::Installation(_),
                    Phase::Infrastructure | Phase::Application
                )
        )
    }
}

fn validation_outcome(has_failures: bool, has_strict: bool) -> Outcome {
    if has_strict {
        Outcome::StrictFailure
    } else if has_failures {
        Outcome::SoftFailure
    } else {
        Outcome::Passed
    }
}

/// Classification of a resolved phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Every check passed or every component completed.
    Passed,
    /// The phase was skipped by policy.
    Skipped,
    /// Some checks failed, none of them strict.
    SoftFailure,
    /// At least one strict check failed.
    StrictFailure,
    /// An installation run did not complete.
    InstallFailure,
    /// The simulator itself failed unexpectedly.
    Error,
}

impl Outcome {
    /// Every outcome, for exhaustive table checks.
    pub const ALL: [Outcome; 6] = [
        Outcome::Passed,
        Outcome::Skipped,
        Outcome::SoftFailure,
        Outcome::StrictFailure,
        Outcome::InstallFailure,
        Outcome::Error,
    ];

    /// Whether the phase counts as failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Outcome::Passed | Outcome::Skipped)
    }
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Policy inputs of the transition table for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gate {
    /// No phase follows this one.
    pub last_phase: bool,
    /// A clean pass waits for an explicit "next".
    pub manual_advance: bool,
    /// Failures may not be bypassed.
    pub bypass_blocked: bool,
}

impl Gate {
    /// Gate for `phase` within `mode`, under `flags`.
    #[must_use]
    pub fn for_phase(mode: DeploymentMode, phase: Phase, flags: &PolicyFlags) -> Self {
        Self {
            last_phase: mode.phases().last() == Some(&phase),
            manual_advance: flags.requires_manual_advance(phase),
            bypass_blocked: flags.blocks_on_failure(phase),
        }
    }
}

/// What the flow does after a phase resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Start the next phase after the auto-advance delay.
    Advance,
    /// Wait for the user to press "next".
    AwaitAdvance,
    /// Ask the user whether to continue despite failures.
    AwaitConfirmation,
    /// No way forward except rerunning the phase.
    Blocked,
    /// The flow is finished.
    Complete,
}

/// The transition table.
#[must_use]
pub fn decide(outcome: Outcome, gate: Gate) -> Decision {
    match outcome {
        Outcome::Passed | Outcome::Skipped => {
            if gate.last_phase {
                Decision::Complete
            } else if gate.manual_advance {
                Decision::AwaitAdvance
            } else {
                Decision::Advance
            }
        }
        Outcome::SoftFailure => {
            if gate.bypass_blocked {
                Decision::Blocked
            } else {
                Decision::AwaitConfirmation
            }
        }
        Outcome::StrictFailure | Outcome::InstallFailure | Outcome::Error => Decision::Blocked,
    }
}

// =============================================================================
// PHASE STATE
// =============================================================================

/// Lifecycle of a phase within the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl PhaseStatus {
    /// Whether the phase has a final result for its current attempt.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            PhaseStatus::Completed | PhaseStatus::Failed | PhaseStatus::Skipped
        )
    }
}

/// The user's answer to the continue-despite-failures prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PromptAnswer {
    #[default]
    Unanswered,
    Confirmed,
    Declined,
}

/// Everything the flow knows about one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseState {
    pub phase: Phase,
    pub status: PhaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PhaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub prompt: PromptAnswer,
    /// How many times the phase has been started.
    pub attempts: u32,
}

impl PhaseState {
    /// A phase that has never run.
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Pending,
            result: None,
            error: None,
            prompt: PromptAnswer::Unanswered,
            attempts: 0,
        }
    }

    /// Outcome of the current attempt, once resolved.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            PhaseStatus::Pending | PhaseStatus::Running => None,
            PhaseStatus::Skipped => Some(Outcome::Skipped),
            PhaseStatus::Completed | PhaseStatus::Failed => {
                if self.error.is_some() {
                    Some(Outcome::Error)
                } else {
                    self.result.as_ref().map(PhaseResult::outcome)
                }
            }
        }
    }
}

// =============================================================================
// FLOW STATE
// =============================================================================

/// Where the flow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum FlowState {
    /// The phase is current but not started.
    Idle { phase: Phase },
    /// The phase's simulator is running.
    Running { phase: Phase },
    /// The phase resolved cleanly; the next one starts after the delay.
    Advancing { from: Phase, to: Phase },
    /// The phase resolved cleanly; waiting for "next".
    AwaitingAdvance { phase: Phase },
    /// The phase has bypassable failures; waiting for the user's answer.
    AwaitingConfirmation { phase: Phase },
    /// The user declined to continue past the failures.
    Declined { phase: Phase },
    /// Only a rerun can move the flow.
    Blocked { phase: Phase },
    /// Every phase is done.
    Complete,
}

impl FlowState {
    /// The phase this state is about, if any.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            FlowState::Idle { phase }
            | FlowState::Running { phase }
            | FlowState::AwaitingAdvance { phase }
            | FlowState::AwaitingConfirmation { phase }
            | FlowState::Declined { phase }
            | FlowState::Blocked { phase } => Some(*phase),
            FlowState::Advancing { from, .. } => Some(*from),
            FlowState::Complete => None,
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowState::Idle { phase } => write!(f, "{} has not started", phase),
            FlowState::Running { phase } => write!(f, "{} is running", phase),
            FlowState::Advancing { from, to } => write!(f, "advancing from {} to {}", from, to),
            FlowState::AwaitingAdvance { phase } => write!(f, "{} is waiting for next", phase),
            FlowState::AwaitingConfirmation { phase } => {
                write!(f, "{} is waiting for confirmation", phase)
            }
            FlowState::Declined { phase } => write!(f, "{} was declined", phase),
            FlowState::Blocked { phase } => write!(f, "{} is blocked", phase),
            FlowState::Complete => write!(f, "the flow is complete"),
        }
    }
}

/// What [`FlowController::begin`] started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Started {
    /// The phase is running; its simulator must be invoked.
    Run(Phase),
    /// The phase was skipped by policy and already resolved.
    Skipped { phase: Phase, decision: Decision },
}

// =============================================================================
// FLOW CONTROLLER
// =============================================================================

/// Sequences the phases of one deployment mode.
///
/// At most one phase is running at a time, phases are visited in order,
/// and resolved earlier phases are never touched again.
#[derive(Debug, Clone)]
pub struct FlowController {
    mode: DeploymentMode,
    phases: BTreeMap<Phase, PhaseState>,
    state: FlowState,
}

impl FlowController {
    /// Create a controller positioned at the first phase of `mode`.
    #[must_use]
    pub fn new(mode: DeploymentMode) -> Self {
        let phases = mode
            .phases()
            .iter()
            .map(|p| (*p, PhaseState::new(*p)))
            .collect();
        let state = match mode.phases().first() {
            Some(first) => FlowState::Idle { phase: *first },
            None => FlowState::Complete,
        };
        Self {
            mode,
            phases,
            state,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == FlowState::Complete
    }

    /// The phase the flow is positioned at, or the last phase once complete.
    #[must_use]
    pub fn current_phase(&self) -> Option<Phase> {
        self.state
            .phase()
            .or_else(|| self.mode.phases().last().copied())
    }

    #[must_use]
    pub fn phase_state(&self, phase: Phase) -> Option<&PhaseState> {
        self.phases.get(&phase)
    }

    /// Every phase state, in flow order.
    pub fn phase_states(&self) -> impl Iterator<Item = &PhaseState> {
        self.phases.values()
    }

    /// The phase after `phase` in this mode.
    #[must_use]
    pub fn next_phase(&self, phase: Phase) -> Option<Phase> {
        let phases = self.mode.phases();
        phases
            .iter()
            .position(|p| *p == phase)
            .and_then(|i| phases.get(i.saturating_add(1)))
            .copied()
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }

    fn state_mut(&mut self, phase: Phase) -> Result<&mut PhaseState, WizardError> {
        self.phases
            .get_mut(&phase)
            .ok_or(WizardError::PhaseNotInFlow(phase))
    }

    /// Start the current phase.
    ///
    /// Validation phases whose skip flag is set resolve immediately as
    /// skipped.
    pub fn begin(&mut self, flags: &PolicyFlags) -> Result<Started, WizardError> {
        let FlowState::Idle { phase } = self.state else {
            return Err(self.invalid("start a phase"));
        };

        let skip = flags.skips(phase);
        let entry = self.state_mut(phase)?;
        entry.attempts = entry.attempts.saturating_add(1);

        if skip {
            entry.status = PhaseStatus::Skipped;
            let decision = decide(Outcome::Skipped, Gate::for_phase(self.mode, phase, flags));
            self.apply(phase, decision)?;
            return Ok(Started::Skipped { phase, decision });
        }

        entry.status = PhaseStatus::Running;
        self.state = FlowState::Running { phase };
        Ok(Started::Run(phase))
    }

    /// Record the simulator's result for the running phase.
    pub fn resolve(
        &mut self,
        result: PhaseResult,
        flags: &PolicyFlags,
    ) -> Result<Decision, WizardError> {
        let FlowState::Running { phase } = self.state else {
            return Err(self.invalid("resolve a phase"));
        };
        if !result.matches(phase) {
            return Err(self.invalid("record a result of the wrong kind"));
        }

        let outcome = result.outcome();
        let entry = self.state_mut(phase)?;
        entry.status = if outcome.is_failure() {
            PhaseStatus::Failed
        } else {
            PhaseStatus::Completed
        };
        entry.result = Some(result);

        let decision = decide(outcome, Gate::for_phase(self.mode, phase, flags));
        self.apply(phase, decision)?;
        Ok(decision)
    }

    /// Record an unexpected failure of the running phase.
    ///
    /// A partial result (such as the installation status accumulated so
    /// far) may be attached for display.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        partial: Option<PhaseResult>,
    ) -> Result<Decision, WizardError> {
        let FlowState::Running { phase } = self.state else {
            return Err(self.invalid("fail a phase"));
        };

        let entry = self.state_mut(phase)?;
        entry.status = PhaseStatus::Failed;
        entry.error = Some(error.into());
        entry.result = partial;

        let decision = decide(Outcome::Error, Gate::default());
        self.apply(phase, decision)?;
        Ok(decision)
    }

    /// Continue past bypassable failures.
    ///
    /// Also accepted after a decline: pressing "next" again is an answer.
    pub fn confirm(&mut self, flags: &PolicyFlags) -> Result<Decision, WizardError> {
        let phase = match self.state {
            FlowState::AwaitingConfirmation { phase } | FlowState::Declined { phase } => phase,
            _ => return Err(self.invalid("confirm")),
        };

        self.state_mut(phase)?.prompt = PromptAnswer::Confirmed;
        let decision = decide(Outcome::Passed, Gate::for_phase(self.mode, phase, flags));
        self.apply(phase, decision)?;
        Ok(decision)
    }

    /// Refuse to continue past failures. Nothing happens automatically
    /// afterwards.
    pub fn decline(&mut self) -> Result<(), WizardError> {
        let FlowState::AwaitingConfirmation { phase } = self.state else {
            return Err(self.invalid("decline"));
        };
        self.state_mut(phase)?.prompt = PromptAnswer::Declined;
        self.state = FlowState::Declined { phase };
        Ok(())
    }

    /// Move to the next phase, leaving it idle.
    pub fn advance(&mut self) -> Result<Phase, WizardError> {
        let next = match self.state {
            FlowState::Advancing { to, .. } => Some(to),
            FlowState::AwaitingAdvance { phase } => self.next_phase(phase),
            _ => None,
        };
        let Some(next) = next else {
            return Err(self.invalid("advance"));
        };
        self.state = FlowState::Idle { phase: next };
        Ok(next)
    }

    /// Discard the current phase's results and put it back to idle.
    ///
    /// Earlier phases are untouched.
    pub fn rerun(&mut self) -> Result<Phase, WizardError> {
        let phase = match self.state {
            FlowState::Blocked { phase }
            | FlowState::Declined { phase }
            | FlowState::AwaitingConfirmation { phase }
            | FlowState::AwaitingAdvance { phase } => phase,
            _ => return Err(self.invalid("rerun")),
        };

        let entry = self.state_mut(phase)?;
        let attempts = entry.attempts;
        *entry = PhaseState::new(phase);
        entry.attempts = attempts;
        self.state = FlowState::Idle { phase };
        Ok(phase)
    }

    fn apply(&mut self, phase: Phase, decision: Decision) -> Result<(), WizardError> {
        self.state = match decision {
            Decision::Advance => {
                let to = self
                    .next_phase(phase)
                    .ok_or(WizardError::PhaseNotInFlow(phase))?;
                FlowState::Advancing { from: phase, to }
            }
            Decision::AwaitAdvance => FlowState::AwaitingAdvance { phase },
            Decision::AwaitConfirmation => FlowState::AwaitingConfirmation { phase },
            Decision::Blocked => FlowState::Blocked { phase },
            Decision::Complete => FlowState::Complete,
        };
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
