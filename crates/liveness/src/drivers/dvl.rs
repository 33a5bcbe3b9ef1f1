//! DVL dead-reckoning driver

use contracts::{DvlDriverConfig, MeasurementPayload, SensorDriver};
use nalgebra::{Point3, Vector3};
use tracing::{debug, trace};

use crate::drivers::{differs, payload_mismatch};
use crate::error::Result;
use crate::sensor::{Ingest, IngestContext};

/// DVL dead-reckoning position, resolved into the reference frame on ingest.
///
/// The reported depth is the z component of the resolved position. A report is
/// valid only when the device flags it healthy, every field is finite, the
/// standard deviation is within `max_std` and the mount transform resolved.
#[derive(Debug, Clone)]
pub struct DvlDriver {
    position: Vector3<f64>,
    prev_position: Vector3<f64>,
    std: f64,
    status: bool,
    transform_resolved: bool,
    config: DvlDriverConfig,
}

impl DvlDriver {
    pub fn new(config: DvlDriverConfig) -> Self {
        Self {
            position: Vector3::zeros(),
            prev_position: Vector3::zeros(),
            std: 0.0,
            status: false,
            transform_resolved: false,
            config,
        }
    }

    /// Position in the reference frame
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn config(&self) -> &DvlDriverConfig {
        &self.config
    }
}

impl SensorDriver for DvlDriver {
    fn kind(&self) -> &'static str {
        "dvl"
    }

    fn set_prev_state(&mut self) {
        self.prev_position = self.position;
    }

    fn has_different_data(&self) -> bool {
        let tol = self.config.tolerance;
        (0..3).any(|i| differs(self.position[i], self.prev_position[i], tol))
    }

    fn has_valid_data(&self) -> bool {
        self.status
            && self.transform_resolved
            && self.std.is_finite()
            && self.std <= self.config.max_std
            && self.position.iter().all(|v| v.is_finite())
    }

    fn reading(&self) -> f64 {
        self.position.z
    }
}

impl Ingest for DvlDriver {
    fn ingest(&mut self, payload: &MeasurementPayload, ctx: &IngestContext<'_>) -> Result<()> {
        let report = match payload {
            MeasurementPayload::DeadReckon(report) => report,
            other => return Err(payload_mismatch(ctx.sensor_id, self.kind(), other)),
        };

        let raw = Point3::new(report.x, report.y, report.z);
        match ctx.transforms.lookup_transform(
            &self.config.reference_frame,
            &self.config.frame,
            ctx.timestamp,
        ) {
            Ok(mount) => {
                self.position = (mount * raw).coords;
                self.transform_resolved = true;
            }
            Err(e) => {
                debug!(sensor = %ctx.sensor_id, error = %e, "dvl transform unavailable");
                self.position = raw.coords;
                self.transform_resolved = false;
            }
        }
        self.std = report.std;
        self.status = report.status;

        trace!(
            sensor = %ctx.sensor_id,
            x = self.position.x,
            y = self.position.y,
            z = self.position.z,
            "dvl report stored"
        );
        Ok(())
    }
}
