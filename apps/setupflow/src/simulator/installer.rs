//! # Phased Installer Simulator
//!
//! Each installation domain walks its component through
//! `pending -> in-progress -> completed` and reports every step as a
//! [`StatusPatch`] on the update channel. The installer never reads status
//! back; the receiving side merges the patches.

use crate::clock::SharedClock;
use setupflow_core::{
    Component, InstallConfig, Phase, PolicyFlags, StatusPatch, WizardError,
    primitives::STEP_DELAY, scripts,
};
use tokio::sync::mpsc;

/// Sending half of a status update channel.
pub type PatchSender = mpsc::UnboundedSender<StatusPatch>;

fn send(updates: &PatchSender, patch: StatusPatch) -> Result<(), WizardError> {
    updates.send(patch).map_err(|_| WizardError::ChannelClosed)
}

/// Simulates the infrastructure and application installs.
#[derive(Debug, Clone)]
pub struct Installer {
    clock: SharedClock,
}

impl Installer {
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// One component: start, wait, complete.
    async fn step(
        &self,
        component: Component,
        config: &InstallConfig,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        tracing::debug!(component = component.title(), "Installing component");
        send(updates, scripts::step_started(component, config))?;
        self.clock.sleep(STEP_DELAY).await;
        send(updates, scripts::step_completed(component, config))?;
        tracing::info!(component = component.title(), "Component installed");
        Ok(())
    }

    // =========================================================================
    // INFRASTRUCTURE
    // =========================================================================

    /// Storage, registry, backups and cluster add-ons, in that order.
    pub async fn install_infrastructure(
        &self,
        config: &InstallConfig,
        _flags: &PolicyFlags,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        config.validate()?;
        config.validate_hosts()?;

        for component in Phase::Infrastructure.components() {
            self.step(*component, config, updates).await?;
        }
        Ok(())
    }

    // =========================================================================
    // APPLICATION
    // =========================================================================

    pub async fn install_database(
        &self,
        config: &InstallConfig,
        _flags: &PolicyFlags,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        self.step(Component::Database, config, updates).await
    }

    /// The core step. Under `fail_installation` it fails immediately,
    /// leaving progress at the midpoint.
    pub async fn install_core(
        &self,
        config: &InstallConfig,
        flags: &PolicyFlags,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        if flags.fail_installation {
            tracing::warn!("Core installation failing by policy");
            return send(updates, scripts::core_failed());
        }
        self.step(Component::Core, config, updates).await
    }

    pub async fn install_plugins(
        &self,
        config: &InstallConfig,
        _flags: &PolicyFlags,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        self.step(Component::Plugins, config, updates).await
    }

    /// Database, core, then plugins. A failed core stops the run before
    /// plugins are touched.
    pub async fn install_application(
        &self,
        config: &InstallConfig,
        flags: &PolicyFlags,
        updates: &PatchSender,
    ) -> Result<(), WizardError> {
        config.validate()?;

        self.install_database(config, flags, updates).await?;
        self.install_core(config, flags, updates).await?;
        if flags.fail_installation {
            tracing::info!("Skipping plugins after core failure");
            return Ok(());
        }
        self.install_plugins(config, flags, updates).await
    }
}
