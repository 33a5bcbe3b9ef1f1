//! # Liveness
//!
//! Sensor liveness and validity tracking.
//!
//! Responsibilities:
//! - Shared bookkeeping for every sensor: reading, staleness clock, activity
//! - Rate-limited invalid-data diagnostics
//! - Reference drivers (depth, DVL) and a static transform table
//! - Registry + delivery pipeline for multi-threaded processes
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use contracts::{ManualClock, Measurement, SensorSettings, Timestamp};
//! use liveness::{DepthDriver, Sensor, StaticTransformProvider};
//!
//! let clock = ManualClock::new(Timestamp::ZERO);
//! let mut sensor = Sensor::new(
//!     "depth",
//!     DepthDriver::default(),
//!     SensorSettings::from_secs("depth", 2.0, 1.0).unwrap(),
//!     Arc::new(clock.clone()),
//!     Arc::new(StaticTransformProvider::new()),
//! )
//! .unwrap();
//!
//! sensor.ingest(&Measurement::depth("depth", 0.0, 5.0)).unwrap();
//! assert!(sensor.is_active());
//! assert_eq!(sensor.depth(), 5.0);
//!
//! clock.set(Timestamp::from_secs(2.0));
//! assert!(!sensor.is_active());
//! ```

mod drivers;
mod error;
mod factory;
mod pipeline;
mod registry;
mod sensor;
mod throttle;
mod transforms;

// Re-exports
pub use drivers::{DepthDriver, DvlDriver};
pub use error::{LivenessError, Result};
pub use factory::{build_registry, transforms_from_blueprint};
pub use pipeline::{
    spawn_status_reporter, ActivityTracker, ActivityTransition, DeliveryMetrics, DeliveryPipeline,
    DeliveryStats, MeasurementSender,
};
pub use registry::{lock_sensor, SensorRegistry, SharedSensor};
pub use sensor::{Ingest, IngestContext, MonitoredSensor, Sensor};
pub use throttle::DiagnosticThrottle;
pub use transforms::StaticTransformProvider;
