//! Sensor registry
//!
//! Holds every monitored sensor behind a mutex so the transport context can
//! store-and-refresh while estimation and diagnostics contexts poll.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{Measurement, RefreshOutcome, SensorId, SensorStatus};
use tracing::{debug, instrument};

use crate::error::{LivenessError, Result};
use crate::sensor::MonitoredSensor;

/// Shared handle to one sensor
pub type SharedSensor = Arc<Mutex<dyn MonitoredSensor>>;

/// Lock a sensor, recovering the guard from a poisoned mutex.
///
/// Sensor state is plain data; a panic in another holder cannot leave it
/// half-updated in a way later refreshes would not overwrite.
pub fn lock_sensor(sensor: &SharedSensor) -> MutexGuard<'_, dyn MonitoredSensor + 'static> {
    sensor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sensors by name, in registration order
#[derive(Default)]
pub struct SensorRegistry {
    sensors: HashMap<SensorId, SharedSensor>,
    order: Vec<SensorId>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor under its own name
    ///
    /// # Errors
    /// A sensor with the same name is already registered.
    pub fn register<S>(&mut self, sensor: S) -> Result<SharedSensor>
    where
        S: MonitoredSensor + 'static,
    {
        let id = sensor.name().clone();
        if self.sensors.contains_key(&id) {
            return Err(LivenessError::DuplicateSensor { sensor_id: id });
        }

        debug!(sensor = %id, kind = sensor.kind(), "sensor registered");
        let shared: SharedSensor = Arc::new(Mutex::new(sensor));
        self.sensors.insert(id.clone(), shared.clone());
        self.order.push(id);
        Ok(shared)
    }

    /// Route a measurement to its sensor, store it and refresh
    ///
    /// # Errors
    /// - unknown sensor name
    /// - payload kind rejected by the driver
    #[instrument(
        name = "registry_apply",
        level = "trace",
        skip(self, measurement),
        fields(sensor = %measurement.sensor_id)
    )]
    pub fn apply(&self, measurement: &Measurement) -> Result<RefreshOutcome> {
        let sensor = self.get(&measurement.sensor_id).ok_or_else(|| {
            LivenessError::UnknownSensor {
                sensor_id: measurement.sensor_id.clone(),
            }
        })?;
        let mut guard = lock_sensor(sensor);
        guard.apply(measurement)
    }

    pub fn get(&self, id: &str) -> Option<&SharedSensor> {
        self.sensors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sensors.contains_key(id)
    }

    pub fn status(&self, id: &str) -> Option<SensorStatus> {
        self.get(id).map(|s| lock_sensor(s).status())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.get(id).is_some_and(|s| lock_sensor(s).is_active())
    }

    /// Status of every sensor, in registration order
    pub fn snapshot(&self) -> Vec<SensorStatus> {
        self.order
            .iter()
            .filter_map(|id| self.status(id))
            .collect()
    }

    /// Names of the currently active sensors, in registration order
    pub fn active_ids(&self) -> Vec<SensorId> {
        self.order
            .iter()
            .filter(|id| self.is_active(id))
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> &[SensorId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("sensors", &self.order)
            .finish()
    }
}
