//! Measurement - transport layer output
//!
//! Raw measurement handed to a sensor driver. The transport decides how these
//! are produced; this crate only fixes the in-process shape.

use serde::{Deserialize, Serialize};

use crate::{SensorId, Timestamp};

/// Raw measurement addressed to one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Target sensor name
    pub sensor_id: SensorId,

    /// Acquisition time on the monitor clock
    pub timestamp: Timestamp,

    /// Sensor-specific payload
    pub payload: MeasurementPayload,
}

impl Measurement {
    pub fn new(
        sensor_id: impl Into<SensorId>,
        timestamp: impl Into<Timestamp>,
        payload: MeasurementPayload,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp: timestamp.into(),
            payload,
        }
    }

    /// Shorthand for a depth measurement
    pub fn depth(sensor_id: impl Into<SensorId>, timestamp: impl Into<Timestamp>, depth: f64) -> Self {
        Self::new(sensor_id, timestamp, MeasurementPayload::Depth { depth })
    }
}

/// Measurement payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeasurementPayload {
    /// Pressure depth sensor output (metres, positive down)
    Depth { depth: f64 },

    /// DVL dead-reckoning report
    DeadReckon(DeadReckonReport),
}

impl MeasurementPayload {
    /// Payload kind name, matches the driver kind that accepts it
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Depth { .. } => "depth",
            Self::DeadReckon(_) => "dvl",
        }
    }
}

/// DVL dead-reckoning report, position in the DVL frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadReckonReport {
    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Position standard deviation (metres)
    pub std: f64,

    /// Device-reported health flag
    pub status: bool,
}
