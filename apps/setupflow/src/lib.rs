//! # setupflow
//!
//! The async side of the setupflow installation wizard: simulators on an
//! injectable clock, the wizard runner, settings files, the CLI and the
//! HTTP API. All flow decisions come from `setupflow-core`.

pub mod api;
pub mod cli;
pub mod clock;
pub mod settings;
pub mod simulator;
pub mod wizard;

pub use clock::{Clock, InstantClock, SharedClock, TokioClock};
pub use settings::{FileFlags, FlagSource, MemoryFlags, SharedFlags};
pub use wizard::{PhaseSnapshot, Wizard, WizardEvent, WizardSnapshot};
