//! Measurement delivery
//!
//! Transport callbacks push measurements into a bounded channel without
//! blocking. Finite sources such as recorded files may instead wait for room.
//! A single tokio task owns the write side of every sensor and
//! applies them in arrival order. A second task polls activity for metrics and
//! logs staleness transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, SendError, Sender, TrySendError};
use contracts::{Measurement, RefreshOutcome, SensorId, SensorStatus};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::registry::SensorRegistry;

/// Delivery counters
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Accepted into the channel
    pub delivered: AtomicU64,
    /// Dropped because the channel was full or closed
    pub dropped: AtomicU64,
    /// Applied with a unique outcome
    pub unique: AtomicU64,
    /// Applied with a repeated outcome
    pub repeated: AtomicU64,
    /// Applied with an invalid outcome
    pub invalid: AtomicU64,
    /// Rejected by the registry (unknown sensor, payload mismatch)
    pub rejected: AtomicU64,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_outcome(&self, outcome: &RefreshOutcome) {
        let counter = match outcome {
            RefreshOutcome::Unique => &self.unique,
            RefreshOutcome::Repeated => &self.repeated,
            RefreshOutcome::Invalid { .. } => &self.invalid,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            unique: self.unique.load(Ordering::Relaxed),
            repeated: self.repeated.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Delivery counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub dropped: u64,
    pub unique: u64,
    pub repeated: u64,
    pub invalid: u64,
    pub rejected: u64,
}

impl DeliveryStats {
    /// Measurements that reached a sensor
    pub fn applied(&self) -> u64 {
        self.unique + self.repeated + self.invalid
    }
}

/// Non-blocking handle for transport callbacks
#[derive(Debug, Clone)]
pub struct MeasurementSender {
    tx: Sender<Measurement>,
    metrics: Arc<DeliveryMetrics>,
}

impl MeasurementSender {
    /// Queue a measurement; a full channel drops it (newest first).
    ///
    /// Returns whether the measurement was queued.
    pub fn deliver(&self, measurement: Measurement) -> bool {
        match self.tx.try_send(measurement) {
            Ok(()) => {
                self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(m)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(sensor = %m.sensor_id, "measurement dropped (channel full)");
                observability::record_measurement_dropped(&m.sensor_id, "channel_full");
                false
            }
            Err(TrySendError::Closed(m)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(sensor = %m.sensor_id, "delivery channel closed");
                observability::record_measurement_dropped(&m.sensor_id, "channel_closed");
                false
            }
        }
    }

    /// Queue a measurement, waiting for room when the channel is full.
    ///
    /// Blocks the calling thread, so call it from a plain or
    /// `spawn_blocking` thread, never from inside the runtime. Only a closed
    /// channel drops the measurement.
    pub fn deliver_blocking(&self, measurement: Measurement) -> bool {
        match self.tx.send_blocking(measurement) {
            Ok(()) => {
                self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(SendError(m)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(sensor = %m.sensor_id, "delivery channel closed");
                observability::record_measurement_dropped(&m.sensor_id, "channel_closed");
                false
            }
        }
    }

    /// Measurements currently queued
    pub fn queue_len(&self) -> usize {
        self.tx.len()
    }
}

/// Bounded channel between transport callbacks and the registry
pub struct DeliveryPipeline {
    tx: Sender<Measurement>,
    rx: Receiver<Measurement>,
    metrics: Arc<DeliveryMetrics>,
}

impl DeliveryPipeline {
    /// Create a pipeline with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            metrics: Arc::new(DeliveryMetrics::new()),
        }
    }

    /// Handle for one transport callback
    pub fn sender(&self) -> MeasurementSender {
        MeasurementSender {
            tx: self.tx.clone(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn metrics(&self) -> Arc<DeliveryMetrics> {
        self.metrics.clone()
    }

    /// Start applying measurements.
    ///
    /// The task ends once every [`MeasurementSender`] is dropped and the queue
    /// is drained, and yields the final counters.
    pub fn spawn(self, registry: Arc<SensorRegistry>) -> JoinHandle<DeliveryStats> {
        let Self { tx, rx, metrics } = self;
        drop(tx);

        tokio::spawn(async move {
            debug!(sensors = registry.len(), "delivery loop started");
            while let Ok(measurement) = rx.recv().await {
                match registry.apply(&measurement) {
                    Ok(outcome) => metrics.record_outcome(&outcome),
                    Err(e) => {
                        metrics.rejected.fetch_add(1, Ordering::Relaxed);
                        warn!(sensor = %measurement.sensor_id, error = %e, "measurement rejected");
                        observability::record_measurement_dropped(&measurement.sensor_id, "rejected");
                    }
                }
            }
            let stats = metrics.snapshot();
            info!(?stats, "delivery loop finished");
            stats
        })
    }
}

/// Activity change between two polls
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityTransition {
    pub sensor: SensorId,
    pub active: bool,
    pub status: SensorStatus,
}

/// Remembers the last polled activity of each sensor
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last: HashMap<SensorId, bool>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a snapshot against the previous poll.
    ///
    /// Sensors seen for the first time report a transition only when active,
    /// since every sensor starts inactive.
    pub fn observe(&mut self, snapshot: Vec<SensorStatus>) -> Vec<ActivityTransition> {
        let mut transitions = Vec::new();
        for status in snapshot {
            let prev = self.last.insert(status.name.clone(), status.active);
            if prev.unwrap_or(false) != status.active {
                transitions.push(ActivityTransition {
                    sensor: status.name.clone(),
                    active: status.active,
                    status,
                });
            }
        }
        transitions
    }
}

/// Poll every sensor each `period`, publish status metrics and log activity
/// transitions until `shutdown` fires (or its sender is dropped).
pub fn spawn_status_reporter(
    registry: Arc<SensorRegistry>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tracker = ActivityTracker::new();
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let snapshot = registry.snapshot();
                    for status in &snapshot {
                        observability::record_sensor_status(status);
                    }
                    for t in tracker.observe(snapshot) {
                        if t.active {
                            info!(sensor = %t.sensor, depth = t.status.depth, "sensor became active");
                        } else {
                            warn!(
                                sensor = %t.sensor,
                                staleness_s = ?t.status.staleness_secs(),
                                "sensor became inactive"
                            );
                        }
                    }
                }
            }
        }
        debug!("status reporter stopped");
    })
}
