//! # Clock
//!
//! Every simulated delay goes through a [`Clock`], so the same wizard runs
//! in real time under `serve`/`run` and instantly under test.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A pending sleep.
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of simulated delays.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// A clock shared between the validator, the installer and the runner.
pub type SharedClock = Arc<dyn Clock>;

// =============================================================================
// TOKIO CLOCK
// =============================================================================

/// Real time, on `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        Box::pin(tokio::time::sleep(duration))
    }
}

// =============================================================================
// INSTANT CLOCK
// =============================================================================

/// Returns immediately and remembers every delay it was asked for.
#[derive(Debug, Default)]
pub struct InstantClock {
    delays: Mutex<Vec<Duration>>,
}

impl InstantClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all requested delays.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Clock for InstantClock {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        Box::pin(std::future::ready(()))
    }
}
