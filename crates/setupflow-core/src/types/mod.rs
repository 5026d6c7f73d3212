//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the installation flow:
//! - Phase identifiers and deployment modes (`Phase`, `DeploymentMode`)
//! - Installable units and their lifecycle (`Component`, `ComponentStatus`)
//! - Error types (`WizardError`)
//!
//! ## Ordering Guarantees
//!
//! `Phase` and `Component` implement `Ord` in installation order, so every
//! `BTreeMap` keyed by them iterates in the order the flow visits them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// DEPLOYMENT MODE
// =============================================================================

/// Where the product gets installed.
///
/// The mode decides which phases exist: a bare Linux target needs its hosts
/// validated and the infrastructure laid down first, an existing Kubernetes
/// cluster goes straight to application preflights.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// Existing Kubernetes cluster.
    #[default]
    Kubernetes,
    /// Bare Linux hosts; the installer brings its own cluster.
    Linux,
}

impl DeploymentMode {
    /// Phases visited in this mode, in order.
    #[must_use]
    pub fn phases(&self) -> &'static [Phase] {
        match self {
            DeploymentMode::Kubernetes => &[Phase::Preflights, Phase::Application],
            DeploymentMode::Linux => &[
                Phase::Hosts,
                Phase::Infrastructure,
                Phase::Preflights,
                Phase::Application,
            ],
        }
    }

    /// Parse a mode name as used on the command line.
    pub fn parse(s: &str) -> Result<Self, WizardError> {
        match s.to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(DeploymentMode::Kubernetes),
            "linux" => Ok(DeploymentMode::Linux),
            other => Err(WizardError::InvalidConfig(format!(
                "unknown deployment mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Kubernetes => write!(f, "kubernetes"),
            DeploymentMode::Linux => write!(f, "linux"),
        }
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// One stage of the installation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Host preflight checks (linux mode only).
    Hosts,
    /// Infrastructure install: storage, registry, backups (linux mode only).
    Infrastructure,
    /// Application preflight checks against the target environment.
    Preflights,
    /// Application install: database, core, plugins.
    Application,
}

impl Phase {
    /// Human-readable phase title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Hosts => "Host Validation",
            Phase::Infrastructure => "Infrastructure Installation",
            Phase::Preflights => "Application Validation",
            Phase::Application => "Application Installation",
        }
    }

    /// Whether this phase runs the validation simulator.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Phase::Hosts | Phase::Preflights)
    }

    /// Whether this phase runs the installer simulator.
    #[must_use]
    pub fn is_installation(&self) -> bool {
        !self.is_validation()
    }

    /// Components tracked while this phase installs. Empty for validation phases.
    #[must_use]
    pub fn components(&self) -> &'static [Component] {
        match self {
            Phase::Hosts | Phase::Preflights => &[],
            Phase::Infrastructure => &[
                Component::Openebs,
                Component::Registry,
                Component::Velero,
                Component::Components,
            ],
            Phase::Application => &[Component::Database, Component::Core, Component::Plugins],
        }
    }

    /// Parse a phase name as used on the command line and in the flags file.
    pub fn parse(s: &str) -> Result<Self, WizardError> {
        match s.to_ascii_lowercase().as_str() {
            "hosts" => Ok(Phase::Hosts),
            "infrastructure" => Ok(Phase::Infrastructure),
            "preflights" => Ok(Phase::Preflights),
            "application" => Ok(Phase::Application),
            other => Err(WizardError::InvalidConfig(format!(
                "unknown phase '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Hosts => "hosts",
            Phase::Infrastructure => "infrastructure",
            Phase::Preflights => "preflights",
            Phase::Application => "application",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// An installable unit whose progress is tracked individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    /// Local persistent volume provisioner.
    Openebs,
    /// In-cluster image registry.
    Registry,
    /// Backup and restore controller.
    Velero,
    /// Remaining add-ons shipped with the infrastructure.
    Components,
    /// Application database.
    Database,
    /// Core application services.
    Core,
    /// Optional plugins.
    Plugins,
}

impl Component {
    /// Display name used in messages and log lines.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Component::Openebs => "OpenEBS",
            Component::Registry => "Registry",
            Component::Velero => "Velero",
            Component::Components => "Additional Components",
            Component::Database => "Database",
            Component::Core => "Core Application",
            Component::Plugins => "Plugins",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Lifecycle of a single component during one installation run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ComponentStatus {
    /// Whether no further transition is expected in this run.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, ComponentStatus::Completed | ComponentStatus::Failed)
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ComponentStatus::Pending => "pending",
            ComponentStatus::InProgress => "in-progress",
            ComponentStatus::Completed => "completed",
            ComponentStatus::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in setupflow.
///
/// Simulated check and component failures are data, not errors. This enum
/// covers misuse of the flow controller and genuinely unexpected failures.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The requested action is not legal in the current flow state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: String,
    },

    /// The phase does not exist in the active deployment mode.
    #[error("Phase {0} is not part of this flow")]
    PhaseNotInFlow(Phase),

    /// The installation configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The receiving side of a status update channel went away.
    #[error("Status update channel closed")]
    ChannelClosed,

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
