//! # Installation Status
//!
//! Aggregated state of one installation phase run, and the partial patches
//! installer simulators emit to update it.
//!
//! ## Merge Rules
//!
//! - Component transitions replace the component's status
//! - Log lines are appended in order, never rewritten
//! - Progress never decreases and is capped at 100
//! - `overall` is derived after every merge; it is `completed` only when
//!   every tracked component is `completed`

use crate::primitives::MAX_PROGRESS;
use crate::{Component, ComponentStatus, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STATUS PATCH
// =============================================================================

/// A component moving to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    pub component: Component,
    pub status: ComponentStatus,
}

/// Partial status update emitted by an installer step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn component(mut self, component: Component, status: ComponentStatus) -> Self {
        self.component = Some(ComponentUpdate { component, status });
        self
    }

    #[must_use]
    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(line.into());
        self
    }

    #[must_use]
    pub fn logs<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs.extend(lines.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.current_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// =============================================================================
// INSTALLATION STATUS
// =============================================================================

/// Progress, logs and per-component state of one installation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationStatus {
    components: BTreeMap<Component, ComponentStatus>,
    overall: ComponentStatus,
    logs: Vec<String>,
    progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl InstallationStatus {
    /// Fresh status with every component pending.
    #[must_use]
    pub fn new(components: &[Component]) -> Self {
        Self {
            components: components
                .iter()
                .map(|c| (*c, ComponentStatus::Pending))
                .collect(),
            overall: ComponentStatus::Pending,
            logs: Vec::new(),
            progress: 0,
            current_message: None,
            error: None,
        }
    }

    /// Fresh status tracking the components of an installation phase.
    #[must_use]
    pub fn for_phase(phase: Phase) -> Self {
        Self::new(phase.components())
    }

    /// Merge a patch. Updates for components this status does not track
    /// are ignored; their log lines are still appended.
    pub fn apply(&mut self, patch: &StatusPatch) {
        if let Some(update) = patch.component
            && let Some(slot) = self.components.get_mut(&update.component)
        {
            *slot = update.status;
        }
        self.logs.extend(patch.logs.iter().cloned());
        if let Some(progress) = patch.progress {
            self.progress = self.progress.max(progress.min(MAX_PROGRESS));
        }
        if let Some(message) = &patch.current_message {
            self.current_message = Some(message.clone());
        }
        if let Some(error) = &patch.error {
            self.error = Some(error.clone());
        }
        self.overall = self.roll_up();
    }

    /// Record an unexpected failure that ended the run.
    pub fn record_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.logs.push(format!("ERROR: {}", error));
        self.error = Some(error);
        self.overall = self.roll_up();
    }

    fn roll_up(&self) -> ComponentStatus {
        let statuses = || self.components.values();
        if !self.components.is_empty() && statuses().all(|s| *s == ComponentStatus::Completed) {
            ComponentStatus::Completed
        } else if self.error.is_some() || statuses().any(|s| *s == ComponentStatus::Failed) {
            ComponentStatus::Failed
        } else if statuses().all(|s| *s == ComponentStatus::Pending) {
            ComponentStatus::Pending
        } else {
            ComponentStatus::InProgress
        }
    }

    #[must_use]
    pub fn overall(&self) -> ComponentStatus {
        self.overall
    }

    #[must_use]
    pub fn component(&self, component: Component) -> Option<ComponentStatus> {
        self.components.get(&component).copied()
    }

    pub fn components(&self) -> impl Iterator<Item = (Component, ComponentStatus)> + '_ {
        self.components.iter().map(|(c, s)| (*c, *s))
    }

    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn current_message(&self) -> Option<&str> {
        self.current_message.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether every component completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.overall == ComponentStatus::Completed
    }

    /// Whether the run ended in a failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.overall == ComponentStatus::Failed
    }
}

// =============================================================================
// TESTS
// =============================================================================
