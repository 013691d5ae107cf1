//! Fixed-cadence timers driven by simulation time
//!
//! A timer fires at most once per `advance`, however much time passed.
//! Missed ticks are dropped, never replayed.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CadenceTimer {
    interval: Duration,
    elapsed: Duration,
    cancelled: bool,
}

impl CadenceTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            cancelled: false,
        }
    }

    /// Accumulate `dt`; true when the timer is due this call
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.cancelled {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
