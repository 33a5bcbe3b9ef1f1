//! Consumer-facing sensor state

use serde::{Deserialize, Serialize};

use crate::{SensorId, Timestamp};

/// Result of one `refresh_state` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Valid and different: staleness clock restarted
    Unique,
    /// Valid but unchanged: reading refreshed, staleness clock untouched
    Repeated,
    /// Rejected by the validity check
    Invalid {
        /// Whether a diagnostic was emitted for this event
        reported: bool,
    },
}

impl RefreshOutcome {
    /// Whether the measurement was accepted as the current reading
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }
}

/// Point-in-time view of one sensor, what a fusion loop polls per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    pub name: SensorId,

    /// Driver kind ("depth", "dvl", ...)
    pub kind: String,

    /// Activity status at `evaluated_at`
    pub active: bool,

    /// Current reading (0.0 until the first valid measurement)
    pub depth: f64,

    /// Whether any valid measurement has been accepted
    pub has_reading: bool,

    /// Time of the last valid and different measurement
    pub last_unique_update: Option<Timestamp>,

    /// Time of the last reported invalid-data diagnostic
    pub last_diagnostic: Option<Timestamp>,

    /// Clock reading the status was computed at
    pub evaluated_at: Timestamp,
}

impl SensorStatus {
    /// Seconds since the last unique update
    pub fn staleness_secs(&self) -> Option<f64> {
        self.last_unique_update
            .map(|t| self.evaluated_at.duration_since(t).as_secs_f64())
    }
}
