//! Liveness error types
//!
//! Invalid and stale data are not errors: they surface as sensor state.
//! These cover routing and construction problems only.

use contracts::{ContractError, SensorId};
use thiserror::Error;

/// Liveness error
#[derive(Debug, Error)]
pub enum LivenessError {
    /// Measurement addressed to a sensor that is not registered
    #[error("unknown sensor '{sensor_id}'")]
    UnknownSensor {
        /// Sensor name
        sensor_id: SensorId,
    },

    /// A sensor with this name is already registered
    #[error("sensor '{sensor_id}' is already registered")]
    DuplicateSensor {
        /// Sensor name
        sensor_id: SensorId,
    },

    /// Payload kind does not match the driver
    #[error("sensor '{sensor_id}' ({expected}) cannot ingest a '{actual}' payload")]
    PayloadMismatch {
        /// Sensor name
        sensor_id: SensorId,
        /// Driver kind
        expected: &'static str,
        /// Payload kind
        actual: &'static str,
    },

    /// Construction or configuration failure
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Liveness Result alias
pub type Result<T> = std::result::Result<T, LivenessError>;
