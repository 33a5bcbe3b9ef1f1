//! Sensor base: liveness and validity bookkeeping shared by every driver.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Clock, ContractError, Measurement, MeasurementPayload, RefreshOutcome, SensorDriver,
    SensorId, SensorSettings, SensorStatus, Timestamp, TransformProvider,
};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::throttle::DiagnosticThrottle;

/// What a driver gets to see while storing a raw measurement
pub struct IngestContext<'a> {
    /// Sensor the measurement is addressed to
    pub sensor_id: &'a SensorId,

    /// Acquisition time of the measurement
    pub timestamp: Timestamp,

    /// Frame lookup service shared by the process
    pub transforms: &'a dyn TransformProvider,
}

/// Drivers that can decode a [`MeasurementPayload`] into their own fields.
///
/// `ingest` only stores; the sensor base runs `refresh_state` afterwards.
/// Payloads of the wrong kind are rejected without touching any field.
pub trait Ingest: SensorDriver {
    fn ingest(&mut self, payload: &MeasurementPayload, ctx: &IngestContext<'_>) -> Result<()>;
}

/// One monitored sensor: a driver plus the shared liveness state machine.
///
/// # Initial state
///
/// Before the first valid measurement the reading is `0.0`,
/// [`has_reading`](Sensor::has_reading) is false and the sensor is inactive.
///
/// # Threading
///
/// No internal locking. A single transport context writes; when consumers
/// read from other threads wrap the sensor in a mutex (the
/// [`SensorRegistry`](crate::SensorRegistry) does).
pub struct Sensor<D> {
    name: SensorId,
    driver: D,
    depth: f64,
    prev_depth: f64,
    has_reading: bool,
    last_unique_update: Option<Timestamp>,
    throttle: DiagnosticThrottle,
    inactivity_timeout: Duration,
    clock: Arc<dyn Clock>,
    transforms: Arc<dyn TransformProvider>,
}

impl<D: SensorDriver> Sensor<D> {
    /// Create a sensor.
    ///
    /// # Errors
    /// - blank name
    /// - zero inactivity timeout (the sensor could never be active)
    pub fn new(
        name: impl Into<SensorId>,
        driver: D,
        settings: SensorSettings,
        clock: Arc<dyn Clock>,
        transforms: Arc<dyn TransformProvider>,
    ) -> std::result::Result<Self, ContractError> {
        let name = name.into();
        if name.is_blank() {
            return Err(ContractError::invalid_sensor(
                name.as_str(),
                "sensor name cannot be empty",
            ));
        }
        if settings.inactivity_timeout.is_zero() {
            return Err(ContractError::invalid_sensor(
                name.as_str(),
                "inactivity timeout must be > 0",
            ));
        }

        debug!(
            sensor = %name,
            kind = driver.kind(),
            timeout = ?settings.inactivity_timeout,
            "sensor created"
        );

        Ok(Self {
            name,
            driver,
            depth: 0.0,
            prev_depth: 0.0,
            has_reading: false,
            last_unique_update: None,
            throttle: DiagnosticThrottle::new(settings.diagnostic_interval),
            inactivity_timeout: settings.inactivity_timeout,
            clock,
            transforms,
        })
    }

    pub fn name(&self) -> &SensorId {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.driver.kind()
    }

    /// Last accepted reading, `0.0` before the first valid measurement
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Reading captured by the last snapshot
    pub fn previous_depth(&self) -> f64 {
        self.prev_depth
    }

    /// Whether any valid measurement has been accepted
    pub fn has_reading(&self) -> bool {
        self.has_reading
    }

    pub fn last_unique_update(&self) -> Option<Timestamp> {
        self.last_unique_update
    }

    pub fn last_diagnostic(&self) -> Option<Timestamp> {
        self.throttle.last_reported()
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    pub fn diagnostic_interval(&self) -> Duration {
        self.throttle.interval()
    }

    /// Whether a unique update arrived within the inactivity timeout
    pub fn is_active(&self) -> bool {
        self.is_active_at(self.clock.now())
    }

    /// Activity evaluated at an explicit time
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        match self.last_unique_update {
            Some(last) => now.duration_since(last) < self.inactivity_timeout,
            None => false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver access for the transport layer.
    ///
    /// Store the raw value, then call [`refresh_state`](Sensor::refresh_state).
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Transform provider handed to drivers
    pub fn transforms(&self) -> &Arc<dyn TransformProvider> {
        &self.transforms
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Re-evaluate the sensor after the driver stored a new raw value.
    ///
    /// Invalid data leaves the reading, snapshot and unique-update time as they
    /// were and reports a diagnostic at most once per interval. Valid data
    /// always becomes the reading; only different data restarts the staleness
    /// clock.
    pub fn refresh_state(&mut self) -> RefreshOutcome {
        let now = self.clock.now();

        if !self.driver.has_valid_data() {
            let reported = self.throttle.try_report(now);
            if reported {
                warn!(
                    sensor = %self.name,
                    kind = self.driver.kind(),
                    at = %now,
                    last_depth = self.depth,
                    "invalid data received"
                );
            }
            let outcome = RefreshOutcome::Invalid { reported };
            observability::record_refresh_outcome(&self.name, self.driver.kind(), &outcome);
            return outcome;
        }

        // The driver baseline is a placeholder until something was accepted
        let outcome = if !self.has_reading || self.driver.has_different_data() {
            if !self.is_active_at(now) {
                info!(sensor = %self.name, at = %now, "sensor active");
            }
            self.last_unique_update = Some(now);
            RefreshOutcome::Unique
        } else {
            trace!(sensor = %self.name, at = %now, "repeated data");
            RefreshOutcome::Repeated
        };

        self.driver.set_prev_state();
        self.depth = self.driver.reading();
        self.prev_depth = self.depth;
        self.has_reading = true;

        observability::record_refresh_outcome(&self.name, self.driver.kind(), &outcome);
        outcome
    }

    /// Store through `store`, then refresh.
    pub fn update_with<F>(&mut self, store: F) -> RefreshOutcome
    where
        F: FnOnce(&mut D),
    {
        store(&mut self.driver);
        self.refresh_state()
    }

    /// Snapshot of the consumer-facing state at the current clock time
    pub fn status(&self) -> SensorStatus {
        self.status_at(self.clock.now())
    }

    pub fn status_at(&self, now: Timestamp) -> SensorStatus {
        SensorStatus {
            name: self.name.clone(),
            kind: self.driver.kind().to_string(),
            active: self.is_active_at(now),
            depth: self.depth,
            has_reading: self.has_reading,
            last_unique_update: self.last_unique_update,
            last_diagnostic: self.throttle.last_reported(),
            evaluated_at: now,
        }
    }
}

impl<D: Ingest> Sensor<D> {
    /// Store a measurement through the driver and refresh.
    ///
    /// # Errors
    /// Payload kind rejected by the driver; the sensor is left untouched.
    pub fn ingest(&mut self, measurement: &Measurement) -> Result<RefreshOutcome> {
        let ctx = IngestContext {
            sensor_id: &self.name,
            timestamp: measurement.timestamp,
            transforms: self.transforms.as_ref(),
        };
        self.driver.ingest(&measurement.payload, &ctx)?;
        Ok(self.refresh_state())
    }
}

impl<D: SensorDriver> fmt::Debug for Sensor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.name)
            .field("kind", &self.driver.kind())
            .field("depth", &self.depth)
            .field("last_unique_update", &self.last_unique_update)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .finish()
    }
}

/// Type-erased sensor, what registries and consumers hold
pub trait MonitoredSensor: Send {
    fn name(&self) -> &SensorId;

    fn kind(&self) -> &'static str;

    fn is_active(&self) -> bool;

    fn depth(&self) -> f64;

    fn status(&self) -> SensorStatus;

    /// Store the measurement and refresh
    fn apply(&mut self, measurement: &Measurement) -> Result<RefreshOutcome>;
}

impl<D: Ingest> MonitoredSensor for Sensor<D> {
    fn name(&self) -> &SensorId {
        &self.name
    }

    fn kind(&self) -> &'static str {
        self.driver.kind()
    }

    fn is_active(&self) -> bool {
        self.is_active_at(self.clock.now())
    }

    fn depth(&self) -> f64 {
        self.depth
    }

    fn status(&self) -> SensorStatus {
        self.status_at(self.clock.now())
    }

    fn apply(&mut self, measurement: &Measurement) -> Result<RefreshOutcome> {
        self.ingest(measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::DepthDriver;
    use crate::transforms::StaticTransformProvider;
    use contracts::ManualClock;
    use rand::Rng;

    /// Scalar driver: NaN is invalid, exact inequality is different.
    /// Counts hook calls to pin down the call order.
    #[derive(Debug, Default)]
    struct ScalarDriver {
        value: f64,
        prev: f64,
        snapshots: usize,
    }

    impl SensorDriver for ScalarDriver {
        fn kind(&self) -> &'static str {
            "scalar"
        }

        fn set_prev_state(&mut self) {
            self.prev = self.value;
            self.snapshots += 1;
        }

        fn has_different_data(&self) -> bool {
            self.value != self.prev
        }

        fn has_valid_data(&self) -> bool {
            !self.value.is_nan()
        }

        fn reading(&self) -> f64 {
            self.value
        }
    }

    fn settings(timeout: f64, interval: f64) -> SensorSettings {
        SensorSettings::from_secs("scalar", timeout, interval).unwrap()
    }

    fn sensor(timeout: f64) -> (Sensor<ScalarDriver>, ManualClock) {
        let clock = ManualClock::new(Timestamp::ZERO);
        let sensor = Sensor::new(
            "scalar",
            ScalarDriver::default(),
            settings(timeout, 1.0),
            Arc::new(clock.clone()),
            Arc::new(StaticTransformProvider::new()),
        )
        .unwrap();
        (sensor, clock)
    }

    fn push(sensor: &mut Sensor<ScalarDriver>, clock: &ManualClock, at: f64, value: f64) -> RefreshOutcome {
        clock.set(Timestamp::from_secs(at));
        sensor.update_with(|d| d.value = value)
    }

    #[test]
    fn test_initial_state() {
        let (sensor, _clock) = sensor(2.0);
        assert!(!sensor.is_active());
        assert_eq!(sensor.depth(), 0.0);
        assert!(!sensor.has_reading());
        assert!(sensor.last_unique_update().is_none());
        assert!(sensor.last_diagnostic().is_none());
    }

    #[test]
    fn test_construction_errors() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let tf: Arc<dyn TransformProvider> = Arc::new(StaticTransformProvider::new());

        let blank = Sensor::new("  ", ScalarDriver::default(), settings(1.0, 1.0), clock.clone(), tf.clone());
        assert!(matches!(blank, Err(ContractError::InvalidSensor { .. })));

        let zero = SensorSettings {
            inactivity_timeout: Duration::ZERO,
            diagnostic_interval: Duration::from_secs(1),
        };
        let zero = Sensor::new("scalar", ScalarDriver::default(), zero, clock, tf);
        assert!(matches!(zero, Err(ContractError::InvalidSensor { .. })));
    }

    #[test]
    fn test_invalid_then_timeout() {
        // timeout 2s: valid at 0, invalid at 1, nothing until 3
        let (mut sensor, clock) = sensor(2.0);

        assert_eq!(push(&mut sensor, &clock, 0.0, 5.0), RefreshOutcome::Unique);
        assert!(sensor.is_active());
        assert_eq!(sensor.depth(), 5.0);

        let outcome = push(&mut sensor, &clock, 1.0, f64::NAN);
        assert_eq!(outcome, RefreshOutcome::Invalid { reported: true });
        assert_eq!(sensor.depth(), 5.0);
        assert!(sensor.is_active());

        clock.set(Timestamp::from_secs(3.0));
        assert!(!sensor.is_active());
    }

    #[test]
    fn test_first_reading_equal_to_baseline_is_unique() {
        let (mut sensor, clock) = sensor(2.0);

        assert_eq!(push(&mut sensor, &clock, 0.5, 0.0), RefreshOutcome::Unique);
        assert!(sensor.is_active());
        assert_eq!(sensor.last_unique_update(), Some(Timestamp::from_secs(0.5)));

        assert_eq!(push(&mut sensor, &clock, 1.0, 0.0), RefreshOutcome::Repeated);
        clock.set(Timestamp::from_secs(2.5));
        assert!(!sensor.is_active());
    }

    #[test]
    fn test_depth_sensor_at_surface_goes_active() {
        let clock = ManualClock::new(Timestamp::ZERO);
        let mut sensor = Sensor::new(
            "depth",
            DepthDriver::default(),
            settings(2.0, 1.0),
            Arc::new(clock.clone()),
            Arc::new(StaticTransformProvider::new()),
        )
        .unwrap();

        let outcome = sensor.ingest(&Measurement::depth("depth", 0.0, 0.0)).unwrap();
        assert_eq!(outcome, RefreshOutcome::Unique);
        assert!(sensor.is_active());
        assert!(sensor.has_reading());
        assert_eq!(sensor.depth(), 0.0);
    }

    #[test]
    fn test_repeated_value_does_not_extend_activity() {
        let (mut sensor, clock) = sensor(2.0);

        assert_eq!(push(&mut sensor, &clock, 0.0, 5.0), RefreshOutcome::Unique);
        assert_eq!(push(&mut sensor, &clock, 1.9, 5.0), RefreshOutcome::Repeated);
        assert!(sensor.is_active());
        assert_eq!(sensor.last_unique_update(), Some(Timestamp::ZERO));

        clock.set(Timestamp::from_secs(2.1));
        assert!(!sensor.is_active());
        assert_eq!(sensor.depth(), 5.0);
    }

    #[test]
    fn test_activity_window_boundaries() {
        let (mut sensor, clock) = sensor(2.0);
        push(&mut sensor, &clock, 10.0, 1.0);

        for at in [10.0, 10.5, 11.0, 11.999] {
            assert!(sensor.is_active_at(Timestamp::from_secs(at)), "{at}");
        }
        assert!(!sensor.is_active_at(Timestamp::from_secs(12.0)));
        assert!(!sensor.is_active_at(Timestamp::from_secs(20.0)));
    }

    #[test]
    fn test_new_value_restarts_staleness_clock() {
        let (mut sensor, clock) = sensor(2.0);
        push(&mut sensor, &clock, 0.0, 5.0);
        assert_eq!(push(&mut sensor, &clock, 1.5, 5.5), RefreshOutcome::Unique);

        clock.set(Timestamp::from_secs(3.0));
        assert!(sensor.is_active());
        clock.set(Timestamp::from_secs(3.5));
        assert!(!sensor.is_active());
    }

    #[test]
    fn test_sensor_recovers_after_inactivity() {
        let (mut sensor, clock) = sensor(1.0);
        push(&mut sensor, &clock, 0.0, 1.0);
        clock.set(Timestamp::from_secs(5.0));
        assert!(!sensor.is_active());

        assert_eq!(push(&mut sensor, &clock, 5.0, 2.0), RefreshOutcome::Unique);
        assert!(sensor.is_active());
    }

    #[test]
    fn test_invalid_data_leaves_snapshot_untouched() {
        let (mut sensor, clock) = sensor(2.0);
        push(&mut sensor, &clock, 0.0, 5.0);
        assert_eq!(sensor.driver().snapshots, 1);

        push(&mut sensor, &clock, 0.5, f64::NAN);
        assert_eq!(sensor.driver().snapshots, 1);
        assert_eq!(sensor.driver().prev, 5.0);
        assert_eq!(sensor.previous_depth(), 5.0);

        // Snapshot still 5.0, so a 5.0 after the invalid sample is a repeat
        assert_eq!(push(&mut sensor, &clock, 1.0, 5.0), RefreshOutcome::Repeated);
        assert_eq!(sensor.driver().snapshots, 2);
    }

    #[test]
    fn test_invalid_before_any_valid_keeps_initial_reading() {
        let (mut sensor, clock) = sensor(2.0);
        push(&mut sensor, &clock, 0.0, f64::NAN);
        assert_eq!(sensor.depth(), 0.0);
        assert!(!sensor.has_reading());
        assert!(!sensor.is_active());
        assert_eq!(sensor.last_diagnostic(), Some(Timestamp::ZERO));
    }

    #[test]
    fn test_diagnostics_rate_limited() {
        let (mut sensor, clock) = sensor(10.0);
        let mut reported = 0;
        for i in 0..10 {
            let outcome = push(&mut sensor, &clock, i as f64 * 0.05, f64::NAN);
            if outcome == (RefreshOutcome::Invalid { reported: true }) {
                reported += 1;
            }
        }
        assert_eq!(reported, 1);
        assert_eq!(sensor.last_diagnostic(), Some(Timestamp::ZERO));

        let outcome = push(&mut sensor, &clock, 1.2, f64::NAN);
        assert_eq!(outcome, RefreshOutcome::Invalid { reported: true });
        assert_eq!(sensor.last_diagnostic(), Some(Timestamp::from_secs(1.2)));
    }

    #[test]
    fn test_status_snapshot() {
        let (mut sensor, clock) = sensor(2.0);
        push(&mut sensor, &clock, 1.0, 3.0);
        clock.set(Timestamp::from_secs(1.5));

        let status = sensor.status();
        assert_eq!(status.name.as_str(), "scalar");
        assert_eq!(status.kind, "scalar");
        assert!(status.active);
        assert_eq!(status.depth, 3.0);
        assert_eq!(status.last_unique_update, Some(Timestamp::from_secs(1.0)));
        assert_eq!(status.staleness_secs(), Some(0.5));
    }

    #[test]
    fn test_random_sequences_keep_last_valid_reading() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let (mut sensor, clock) = sensor(0.5);
            let mut last_valid: Option<f64> = None;
            let mut last_unique: Option<f64> = None;
            let mut prev_valid: Option<f64> = None;
            let mut t = 0.0;

            for _ in 0..100 {
                t += rng.random_range(0.0..0.3);
                let value = match rng.random_range(0..4) {
                    0 => f64::NAN,
                    1 => prev_valid.unwrap_or(0.0),
                    _ => rng.random_range(-5.0..5.0),
                };

                let outcome = push(&mut sensor, &clock, t, value);
                if value.is_nan() {
                    assert!(!outcome.is_accepted());
                } else {
                    if prev_valid != Some(value) {
                        last_unique = Some(t);
                    }
                    last_valid = Some(value);
                    prev_valid = Some(value);
                }

                assert_eq!(sensor.depth(), last_valid.unwrap_or(0.0));
                assert_eq!(
                    sensor.last_unique_update(),
                    last_unique.map(Timestamp::from_secs)
                );
            }
        }
    }
}
