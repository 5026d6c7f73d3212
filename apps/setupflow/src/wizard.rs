//! # Wizard Runner
//!
//! Drives a [`FlowController`] with the simulators. The controller decides;
//! the wizard reads policy flags, runs the phase, merges status patches,
//! sleeps the auto-advance delay and publishes what happened.
//!
//! ## Outputs
//!
//! - [`WizardEvent`]s on an optional unbounded channel, in program order
//! - the latest [`WizardSnapshot`] on a `watch` channel, including the live
//!   installation status of a running install phase

use crate::clock::SharedClock;
use crate::settings::SharedFlags;
use crate::simulator::{Installer, Validator};
use serde::{Deserialize, Serialize};
use setupflow_core::{
    Affordances, Decision, DeploymentMode, FlowController, FlowState, InstallConfig,
    InstallationStatus, Outcome, Phase, PhaseResult, PhaseState, PolicyFlags, Started,
    StatusPatch, WizardError, primitives::AUTO_ADVANCE_DELAY,
};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, watch};

// =============================================================================
// EVENTS
// =============================================================================

/// Something the wizard did, for renderers and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum WizardEvent {
    PhaseStarted {
        phase: Phase,
        attempt: u32,
    },
    PhaseSkipped {
        phase: Phase,
        decision: Decision,
    },
    Patch {
        phase: Phase,
        patch: StatusPatch,
    },
    PhaseResolved {
        phase: Phase,
        outcome: Option<Outcome>,
        decision: Decision,
    },
    PhaseFailed {
        phase: Phase,
        error: String,
    },
    Confirmed {
        phase: Phase,
        decision: Decision,
    },
    Declined {
        phase: Phase,
    },
    Rerun {
        phase: Phase,
    },
    Advanced {
        to: Phase,
    },
    Complete,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One phase as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot {
    pub state: PhaseState,
    pub affordances: Affordances,
    /// Installation status merged so far while the phase is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<InstallationStatus>,
}

/// Serializable view of the whole wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub mode: DeploymentMode,
    pub flow: FlowState,
    pub current_phase: Option<Phase>,
    pub complete: bool,
    pub phases: Vec<PhaseSnapshot>,
}

impl WizardSnapshot {
    /// Each phase is gated with the flags it started under; phases that
    /// have not started yet use `latest`.
    fn build(
        controller: &FlowController,
        phase_flags: &BTreeMap<Phase, PolicyFlags>,
        latest: &PolicyFlags,
        live: Option<(Phase, &InstallationStatus)>,
    ) -> Self {
        let mode = controller.mode();
        let phases = controller
            .phase_states()
            .map(|state| PhaseSnapshot {
                affordances: Affordances::evaluate(
                    mode,
                    state,
                    phase_flags.get(&state.phase).unwrap_or(latest),
                ),
                live: live
                    .filter(|(phase, _)| *phase == state.phase)
                    .map(|(_, status)| status.clone()),
                state: state.clone(),
            })
            .collect();

        Self {
            mode,
            flow: controller.state(),
            current_phase: controller.current_phase(),
            complete: controller.is_complete(),
            phases,
        }
    }

    /// The snapshot of one phase.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseSnapshot> {
        self.phases.iter().find(|p| p.state.phase == phase)
    }
}

// =============================================================================
// WIZARD
// =============================================================================

/// The async installation wizard.
#[derive(Debug)]
pub struct Wizard {
    controller: FlowController,
    config: InstallConfig,
    flag_source: SharedFlags,
    /// Flags read at the most recent phase start.
    flags: PolicyFlags,
    /// Flags each started phase was resolved with.
    phase_flags: BTreeMap<Phase, PolicyFlags>,
    clock: SharedClock,
    validator: Validator,
    installer: Installer,
    events: Option<mpsc::UnboundedSender<WizardEvent>>,
    snapshots: watch::Sender<WizardSnapshot>,
}

impl Wizard {
    #[must_use]
    pub fn new(
        mode: DeploymentMode,
        config: InstallConfig,
        flag_source: SharedFlags,
        clock: SharedClock,
    ) -> Self {
        let controller = FlowController::new(mode);
        let flags = PolicyFlags::default();
        let phase_flags = BTreeMap::new();
        let (snapshots, _) = watch::channel(WizardSnapshot::build(
            &controller,
            &phase_flags,
            &flags,
            None,
        ));

        Self {
            controller,
            config,
            flag_source,
            flags,
            phase_flags,
            validator: Validator::new(clock.clone()),
            installer: Installer::new(clock.clone()),
            clock,
            events: None,
            snapshots,
        }
    }

    /// Send every [`WizardEvent`] to `events`.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<WizardEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Follow the latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WizardSnapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot::build(&self.controller, &self.phase_flags, &self.flags, None)
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.controller.state()
    }

    #[must_use]
    pub fn controller(&self) -> &FlowController {
        &self.controller
    }

    fn emit(&self, event: WizardEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            tracing::debug!("Event receiver dropped");
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    // =========================================================================
    // DRIVING
    // =========================================================================

    /// Run phases until the flow needs the user or is complete.
    pub async fn run(&mut self) -> Result<FlowState, WizardError> {
        loop {
            match self.controller.state() {
                FlowState::Idle { .. } => self.run_phase().await?,
                FlowState::Advancing { to, .. } => {
                    self.clock.sleep(AUTO_ADVANCE_DELAY).await;
                    self.controller.advance()?;
                    tracing::info!(phase = %to, "Advancing");
                    self.emit(WizardEvent::Advanced { to });
                    self.publish();
                }
                state => return Ok(state),
            }
        }
    }

    async fn run_phase(&mut self) -> Result<(), WizardError> {
        self.flags = self.flag_source.load()?;
        let flags = self.flags.clone();

        let phase = match self.controller.begin(&flags)? {
            Started::Skipped { phase, decision } => {
                self.phase_flags.insert(phase, flags);
                tracing::info!(%phase, ?decision, "Phase skipped by policy");
                self.emit(WizardEvent::PhaseSkipped { phase, decision });
                self.finish(decision);
                return Ok(());
            }
            Started::Run(phase) => phase,
        };
        self.phase_flags.insert(phase, flags.clone());

        let attempt = self
            .controller
            .phase_state(phase)
            .map(|s| s.attempts)
            .unwrap_or_default();
        tracing::info!(%phase, attempt, "Phase started");
        self.emit(WizardEvent::PhaseStarted { phase, attempt });
        self.publish();

        let decision = match phase {
            Phase::Hosts => {
                let result = self
                    .validator
                    .validate_host_preflights(&self.config, &flags)
                    .await;
                match result {
                    Ok(report) => self.controller.resolve(PhaseResult::Hosts(report), &flags)?,
                    Err(error) => self.fail_phase(phase, &error, None)?,
                }
            }
            Phase::Preflights => {
                let report = self
                    .validator
                    .validate_environment(&self.config, &flags)
                    .await;
                self.controller
                    .resolve(PhaseResult::Validation(report), &flags)?
            }
            Phase::Infrastructure | Phase::Application => {
                let (mut status, result) = self.install(phase, &flags).await;
                match result {
                    Ok(()) => self
                        .controller
                        .resolve(PhaseResult::Installation(status), &flags)?,
                    Err(error) => {
                        status.record_error(error.to_string());
                        self.fail_phase(phase, &error, Some(PhaseResult::Installation(status)))?
                    }
                }
            }
        };

        let outcome = self
            .controller
            .phase_state(phase)
            .and_then(PhaseState::outcome);
        tracing::info!(%phase, ?outcome, ?decision, "Phase resolved");
        self.emit(WizardEvent::PhaseResolved {
            phase,
            outcome,
            decision,
        });
        self.finish(decision);
        Ok(())
    }

    fn fail_phase(
        &mut self,
        phase: Phase,
        error: &WizardError,
        partial: Option<PhaseResult>,
    ) -> Result<Decision, WizardError> {
        let message = error.to_string();
        tracing::error!(%phase, error = %message, "Phase failed unexpectedly");
        self.emit(WizardEvent::PhaseFailed {
            phase,
            error: message.clone(),
        });
        self.controller.fail(message, partial)
    }

    /// Run an installer while merging its patches on the same task.
    async fn install(
        &self,
        phase: Phase,
        flags: &PolicyFlags,
    ) -> (InstallationStatus, Result<(), WizardError>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut status = InstallationStatus::for_phase(phase);

        let installer = &self.installer;
        let config = &self.config;
        let run = async move {
            let result = if phase == Phase::Infrastructure {
                installer.install_infrastructure(config, flags, &tx).await
            } else {
                installer.install_application(config, flags, &tx).await
            };
            drop(tx);
            result
        };
        let drain = async {
            while let Some(patch) = rx.recv().await {
                status.apply(&patch);
                self.emit(WizardEvent::Patch { phase, patch });
                self.snapshots.send_replace(WizardSnapshot::build(
                    &self.controller,
                    &self.phase_flags,
                    &self.flags,
                    Some((phase, &status)),
                ));
            }
        };

        let (result, ()) = tokio::join!(run, drain);
        (status, result)
    }

    fn finish(&self, decision: Decision) {
        if decision == Decision::Complete {
            tracing::info!("Installation flow complete");
            self.emit(WizardEvent::Complete);
        }
        self.publish();
    }

    // =========================================================================
    // USER ACTIONS
    // =========================================================================

    /// Continue past bypassable failures, then keep running.
    pub async fn confirm(&mut self) -> Result<FlowState, WizardError> {
        let phase = self.controller.state().phase();
        let flags = phase
            .and_then(|p| self.phase_flags.get(&p))
            .unwrap_or(&self.flags)
            .clone();
        let decision = self.controller.confirm(&flags)?;
        if let Some(phase) = phase {
            tracing::info!(%phase, ?decision, "Failures confirmed");
            self.emit(WizardEvent::Confirmed { phase, decision });
        }
        self.finish(decision);
        self.run().await
    }

    /// Refuse to continue. The flow stays on the phase.
    pub fn decline(&mut self) -> Result<FlowState, WizardError> {
        self.controller.decline()?;
        if let Some(phase) = self.controller.state().phase() {
            tracing::info!(%phase, "Failures declined");
            self.emit(WizardEvent::Declined { phase });
        }
        self.publish();
        Ok(self.controller.state())
    }

    /// The "next" button.
    ///
    /// Starts an idle phase, leaves a manually-advanced phase, or answers a
    /// declined prompt with a confirmation.
    pub async fn next(&mut self) -> Result<FlowState, WizardError> {
        match self.controller.state() {
            FlowState::Idle { .. } => self.run().await,
            FlowState::Declined { .. } => self.confirm().await,
            _ => {
                let to = self.controller.advance()?;
                tracing::info!(phase = %to, "Advancing on request");
                self.emit(WizardEvent::Advanced { to });
                self.publish();
                self.run().await
            }
        }
    }

    /// Discard the current phase's results and run it again.
    pub async fn rerun(&mut self) -> Result<FlowState, WizardError> {
        let phase = self.controller.rerun()?;
        tracing::info!(%phase, "Rerunning phase");
        self.emit(WizardEvent::Rerun { phase });
        self.publish();
        self.run().await
    }
}
