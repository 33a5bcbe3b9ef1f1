//! Clock model
//!
//! Every sensor reads "now" from one injected [`Clock`]. Mixing clock sources
//! for the update timestamps and the activity check breaks the staleness math,
//! so the clock is a shared handle rather than a global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point in time, in seconds on the owning clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    /// Clock origin
    pub const ZERO: Timestamp = Timestamp(0.0);

    #[inline]
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    #[inline]
    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`.
    ///
    /// Saturates to zero when `earlier` is in the future (or either side is NaN)
    /// and to `Duration::MAX` when the gap does not fit a `Duration`.
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        let secs = (self.0 - earlier.0).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// `self + d`
    #[inline]
    pub fn after(self, d: Duration) -> Self {
        Self(self.0 + d.as_secs_f64())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

impl From<f64> for Timestamp {
    #[inline]
    fn from(secs: f64) -> Self {
        Self(secs)
    }
}

/// Time source
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock, counting seconds since it was created.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_secs_f64())
    }
}

/// Manually driven clock.
///
/// Clones share the same time, so a test (or a replay driver) can hold one
/// handle and move time while sensors read it through another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.0.to_bits())),
        }
    }

    /// Jump to an absolute time (backwards jumps are allowed)
    pub fn set(&self, t: Timestamp) {
        self.bits.store(t.0.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `d`
    pub fn advance(&self, d: Duration) {
        let now = self.now();
        self.set(now.after(d));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(f64::from_bits(self.bits.load(Ordering::SeqCst)))
    }
}
