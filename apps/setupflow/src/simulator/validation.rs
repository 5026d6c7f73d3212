//! # Validation Simulator
//!
//! Produces preflight reports after the validation delay. Check failures
//! are part of the report; the only error is a host list that cannot be
//! checked at all.

use crate::clock::SharedClock;
use setupflow_core::{
    HostValidationReport, InstallConfig, PolicyFlags, ValidationReport, WizardError,
    environment_report, host_report,
    primitives::{HOST_VALIDATION_DELAY, VALIDATION_DELAY},
};

/// Runs the environment and host preflight checks.
#[derive(Debug, Clone)]
pub struct Validator {
    clock: SharedClock,
}

impl Validator {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Application preflights against the target environment.
    pub async fn validate_environment(
        &self,
        config: &InstallConfig,
        flags: &PolicyFlags,
    ) -> ValidationReport {
        tracing::debug!(cluster = %config.cluster_name, "Validating environment");
        self.clock.sleep(VALIDATION_DELAY).await;

        let report = environment_report(config, flags);
        tracing::info!(
            checks = report.len(),
            failures = report.failure_count(),
            strict = report.has_strict_failure(),
            "Environment validation finished"
        );
        report
    }

    /// Host preflights, one report per configured host.
    ///
    /// Fails with [`WizardError::InvalidConfig`] before any delay when the
    /// host list is empty or a host has no name.
    pub async fn validate_host_preflights(
        &self,
        config: &InstallConfig,
        flags: &PolicyFlags,
    ) -> Result<HostValidationReport, WizardError> {
        tracing::debug!(hosts = config.hosts.len(), "Validating hosts");
        config.validate_hosts()?;
        self.clock.sleep(HOST_VALIDATION_DELAY).await;

        let report = host_report(config, flags);
        tracing::info!(
            hosts = report.len(),
            failures = report.failure_count(),
            strict = report.has_strict_failure(),
            "Host validation finished"
        );
        Ok(report)
    }
}
