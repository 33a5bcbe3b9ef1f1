//! Rate limiting for invalid-data diagnostics.

use std::time::Duration;

use contracts::Timestamp;

/// Allows at most one diagnostic per `interval`.
///
/// Pure state: the caller passes the time, nothing is logged here.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticThrottle {
    interval: Duration,
    last_reported: Option<Timestamp>,
}

impl DiagnosticThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_reported: None,
        }
    }

    /// Whether a diagnostic at `now` is allowed; if so, `now` becomes the
    /// last reported time.
    ///
    /// The first event is always reported. A zero interval reports every event.
    pub fn try_report(&mut self, now: Timestamp) -> bool {
        let allowed = match self.last_reported {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        if allowed {
            self.last_reported = Some(now);
        }
        allowed
    }

    pub fn last_reported(&self) -> Option<Timestamp> {
        self.last_reported
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
