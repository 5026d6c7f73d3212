//! # setupflow-core
//!
//! The deterministic installation-flow engine for setupflow - THE LOGIC.
//!
//! This crate models the phased installation of an enterprise product:
//! host preflights, infrastructure install, application preflights and
//! application install. Outcomes are scripted from policy flags; nothing is
//! provisioned.
//!
//! ## Architecture
//!
//! - `checks` turns policy flags into validation reports
//! - `scripts` describes the status patches each installer step emits
//! - `flow` sequences phases through an explicit transition table
//! - `gating` derives what the user may do next
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Has NO async, NO clock, NO network dependencies (pure Rust)
//! - Never reads policy flags from globals; they are passed to every operation
//! - Never writes policy flags
//! - Uses integer progress only

// =============================================================================
// MODULES
// =============================================================================

pub mod checks;
pub mod config;
pub mod flow;
pub mod gating;
pub mod policy;
pub mod primitives;
pub mod scripts;
pub mod status;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{Component, ComponentStatus, DeploymentMode, Phase, WizardError};

// =============================================================================
// RE-EXPORTS: Inputs
// =============================================================================

pub use config::{DatabaseConfig, DatabaseKind, HostSpec, InstallConfig};
pub use policy::{FLAG_NAMES, PolicyFlags};

// =============================================================================
// RE-EXPORTS: Results
// =============================================================================

pub use checks::{
    CheckResult, CheckSpec, EnvironmentCheck, HostCheck, HostValidationReport, ValidationReport,
    environment_report, host_report,
};
pub use status::{ComponentUpdate, InstallationStatus, StatusPatch};

// =============================================================================
// RE-EXPORTS: Flow & Gating
// =============================================================================

pub use flow::{
    Decision, FlowController, FlowState, Gate, Outcome, PhaseResult, PhaseState, PhaseStatus,
    PromptAnswer, Started, decide,
};
pub use gating::{
    Affordances, can_proceed, next_button_label, should_show_confirmation_modal,
    should_show_next_button,
};
