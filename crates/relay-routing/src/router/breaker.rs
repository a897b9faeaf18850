use core::sync::atomic::{AtomicBool, Ordering};
use serde::Serialize;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerState {
    /// Calls are allowed.
    Closed,
    /// Calls are suppressed for the rest of the process lifetime.
    Open,
}

/// Per-provider availability flag.
///
/// Once open it never closes again. Reads and writes use relaxed ordering:
/// concurrent requests may both observe the breaker closed and both call the
/// provider, and one request tripping it does not cancel the other's
/// in-flight call. The flag only lets later requests skip a known-bad
/// provider quickly.
#[derive(Debug)]
pub struct CircuitBreaker {
    open: AtomicBool,
}

impl CircuitBreaker {
    /// A breaker that allows calls.
    pub const fn closed() -> Self {
        Self {
            open: AtomicBool::new(false),
        }
    }

    /// A breaker that starts open, used for providers missing configuration.
    pub const fn open() -> Self {
        Self {
            open: AtomicBool::new(true),
        }
    }

    /// Current state.
    pub fn state(&self) -> BreakerState {
        if self.open.load(Ordering::Relaxed) {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }

    /// Whether calls are allowed.
    pub fn is_closed(&self) -> bool {
        self.state() == BreakerState::Closed
    }

    /// Opens the breaker. Returns `true` if this call changed the state.
    pub fn trip(&self) -> bool {
        !self.open.swap(true, Ordering::Relaxed)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::closed()
    }
}
