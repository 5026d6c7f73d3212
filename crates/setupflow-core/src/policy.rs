//! # Policy Flags
//!
//! Externally supplied switches that decide simulated outcomes and gating.
//!
//! The flags are owned by whoever persists them (the flags file in the
//! app). Every core operation takes them by reference and never writes them.

use crate::{Phase, WizardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Boolean flag names accepted by [`PolicyFlags::set_flag`].
pub const FLAG_NAMES: &[&str] = &[
    "fail_host_preflights",
    "make_host_preflights_strict",
    "block_on_host_preflights",
    "skip_host_preflights",
    "fail_preflights",
    "make_preflights_strict",
    "many_preflight_failures",
    "block_on_app_preflights",
    "skip_app_preflights",
    "fail_installation",
];

/// Policy flags read at the start of each phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicyFlags {
    /// Force host preflight checks to fail.
    pub fail_host_preflights: bool,
    /// Mark strictable failing host checks as strict.
    pub make_host_preflights_strict: bool,
    /// Never offer bypass for failed host preflights.
    pub block_on_host_preflights: bool,
    /// Skip host preflights entirely.
    pub skip_host_preflights: bool,

    /// Force application preflight checks to fail.
    pub fail_preflights: bool,
    /// Mark strictable failing application checks as strict.
    pub make_preflights_strict: bool,
    /// Widen the failing set and make messages verbose.
    pub many_preflight_failures: bool,
    /// Never offer bypass for failed application preflights.
    pub block_on_app_preflights: bool,
    /// Skip application preflights entirely.
    pub skip_app_preflights: bool,

    /// Force the core step of the application install to fail.
    pub fail_installation: bool,

    /// Phases that wait for an explicit "next" after a clean pass.
    pub manual_advance: BTreeSet<Phase>,
}

impl PolicyFlags {
    /// Whether failures in this phase may not be bypassed.
    #[must_use]
    pub fn blocks_on_failure(&self, phase: Phase) -> bool {
        match phase {
            Phase::Hosts => self.block_on_host_preflights,
            Phase::Preflights => self.block_on_app_preflights,
            // Installation failures are never bypassable.
            Phase::Infrastructure | Phase::Application => true,
        }
    }

    /// Whether this validation phase is skipped.
    #[must_use]
    pub fn skips(&self, phase: Phase) -> bool {
        match phase {
            Phase::Hosts => self.skip_host_preflights,
            Phase::Preflights => self.skip_app_preflights,
            Phase::Infrastructure | Phase::Application => false,
        }
    }

    /// Whether a clean pass of this phase waits for the user.
    #[must_use]
    pub fn requires_manual_advance(&self, phase: Phase) -> bool {
        self.manual_advance.contains(&phase)
    }

    /// Set a flag by name from its textual value.
    ///
    /// `manual_advance` takes a comma-separated phase list (empty clears it);
    /// every other name takes `true`/`false`.
    pub fn set_flag(&mut self, name: &str, value: &str) -> Result<(), WizardError> {
        if name == "manual_advance" {
            let mut phases = BTreeSet::new();
            for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                phases.insert(Phase::parse(part)?);
            }
            self.manual_advance = phases;
            return Ok(());
        }

        let parsed = parse_bool(value)?;
        let slot = match name {
            "fail_host_preflights" => &mut self.fail_host_preflights,
            "make_host_preflights_strict" => &mut self.make_host_preflights_strict,
            "block_on_host_preflights" => &mut self.block_on_host_preflights,
            "skip_host_preflights" => &mut self.skip_host_preflights,
            "fail_preflights" => &mut self.fail_preflights,
            "make_preflights_strict" => &mut self.make_preflights_strict,
            "many_preflight_failures" => &mut self.many_preflight_failures,
            "block_on_app_preflights" => &mut self.block_on_app_preflights,
            "skip_app_preflights" => &mut self.skip_app_preflights,
            "fail_installation" => &mut self.fail_installation,
            other => {
                return Err(WizardError::InvalidConfig(format!(
                    "unknown flag '{}'",
                    other
                )));
            }
        };
        *slot = parsed;
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool, WizardError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(WizardError::InvalidConfig(format!(
            "expected a boolean, got '{}'",
            other
        ))),
    }
}
