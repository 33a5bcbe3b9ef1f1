//! Pressure depth sensor driver

use contracts::{DepthDriverConfig, MeasurementPayload, SensorDriver};
use tracing::trace;

use crate::drivers::{differs, payload_mismatch};
use crate::error::Result;
use crate::sensor::{Ingest, IngestContext};

/// Depth sensor reporting metres below the surface.
///
/// Valid when finite and within `[min_depth, max_depth]`.
#[derive(Debug, Clone)]
pub struct DepthDriver {
    depth: f64,
    prev_depth: f64,
    config: DepthDriverConfig,
}

impl DepthDriver {
    pub fn new(config: DepthDriverConfig) -> Self {
        Self {
            depth: 0.0,
            prev_depth: 0.0,
            config,
        }
    }

    /// Store a raw depth value
    pub fn store(&mut self, depth: f64) {
        self.depth = depth;
    }

    pub fn config(&self) -> &DepthDriverConfig {
        &self.config
    }
}

impl Default for DepthDriver {
    fn default() -> Self {
        Self::new(DepthDriverConfig::default())
    }
}

impl SensorDriver for DepthDriver {
    fn kind(&self) -> &'static str {
        "depth"
    }

    fn set_prev_state(&mut self) {
        self.prev_depth = self.depth;
    }

    fn has_different_data(&self) -> bool {
        differs(self.depth, self.prev_depth, self.config.tolerance)
    }

    fn has_valid_data(&self) -> bool {
        self.depth.is_finite()
            && self.depth >= self.config.min_depth
            && self.depth <= self.config.max_depth
    }

    fn reading(&self) -> f64 {
        self.depth
    }
}

impl Ingest for DepthDriver {
    fn ingest(&mut self, payload: &MeasurementPayload, ctx: &IngestContext<'_>) -> Result<()> {
        match payload {
            MeasurementPayload::Depth { depth } => {
                trace!(sensor = %ctx.sensor_id, depth, "depth stored");
                self.store(*depth);
                Ok(())
            }
            other => Err(payload_mismatch(ctx.sensor_id, self.kind(), other)),
        }
    }
}
