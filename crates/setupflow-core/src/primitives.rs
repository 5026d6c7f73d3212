//! # Flow Primitives
//!
//! Fixed timings, progress milestones and messages of the simulated install.
//!
//! These values are compiled in. The runtime reads delays from here and
//! hands them to its clock; tests use an instant clock and only assert
//! which delays were requested.

use std::time::Duration;

// =============================================================================
// SIMULATED DELAYS
// =============================================================================

/// Time the application preflight checks "take".
pub const VALIDATION_DELAY: Duration = Duration::from_millis(2000);

/// Time the host preflight checks "take".
pub const HOST_VALIDATION_DELAY: Duration = Duration::from_millis(2000);

/// Time each installer step spends between its start and completion updates.
pub const STEP_DELAY: Duration = Duration::from_millis(1500);

/// Pause between a phase resolving cleanly and the next phase starting.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(500);

// =============================================================================
// PROGRESS MILESTONES
// =============================================================================

/// Progress once the database step of the application install completes.
///
/// A forced core failure freezes progress here.
pub const APPLICATION_MIDPOINT_PROGRESS: u8 = 50;

/// Upper bound of every progress value.
pub const MAX_PROGRESS: u8 = 100;

// =============================================================================
// MESSAGES
// =============================================================================

/// Error recorded when the core step is forced to fail.
pub const CORE_FAILURE_MESSAGE: &str = "Core application installation failed: simulated failure";

