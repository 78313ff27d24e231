//! Send cadence gate.
//!
//! The sampling loop reads and transmits at most once per interval. The
//! interval is measured from the last send attempt rather than aligned to
//! wall-clock boundaries, so a late tick pushes every later tick back.

use std::time::{Duration, Instant};

/// Gate that opens at most once per interval.
#[derive(Debug, Clone)]
pub struct SendCadence {
    interval: Duration,
    last_send: Option<Instant>,
}

impl SendCadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_send: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Earliest instant at which the next send may happen.
    ///
    /// Before the first send this is `now`.
    pub fn next_due(&self, now: Instant) -> Instant {
        match self.last_send {
            Some(last) => last + self.interval,
            None => now,
        }
    }

    /// Returns `true` and records `now` as the last send when the gate is open.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.last_send {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_send = Some(now);
                true
            }
        }
    }
}
