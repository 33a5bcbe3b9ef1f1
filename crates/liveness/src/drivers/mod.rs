//! Concrete sensor drivers
//!
//! Each driver decodes one payload kind into its own fields and answers the
//! three [`SensorDriver`](contracts::SensorDriver) hooks for it.

mod depth;
mod dvl;

pub use depth::DepthDriver;
pub use dvl::DvlDriver;

use contracts::{MeasurementPayload, SensorId};

use crate::error::LivenessError;

/// Error for a payload the driver does not understand
pub(crate) fn payload_mismatch(
    sensor_id: &SensorId,
    expected: &'static str,
    payload: &MeasurementPayload,
) -> LivenessError {
    LivenessError::PayloadMismatch {
        sensor_id: sensor_id.clone(),
        expected,
        actual: payload.kind(),
    }
}

/// `|a - b| > tolerance`; NaN on either side counts as different
#[inline]
pub(crate) fn differs(a: f64, b: f64, tolerance: f64) -> bool {
    let delta = (a - b).abs();
    delta.is_nan() || delta > tolerance
}
