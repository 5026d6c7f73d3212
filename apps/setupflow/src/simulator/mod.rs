//! # Simulators
//!
//! Async wrappers around the core decision tables and installer scripts.
//! They add the simulated delays on the injected [`Clock`](crate::clock::Clock)
//! and the logging; every outcome still comes from `setupflow-core`.
//!
//! - `validation` - environment and host preflight checks
//! - `installer` - phased installation emitting status patches

mod installer;
mod validation;

pub use installer::{Installer, PatchSender};
pub use validation::Validator;
