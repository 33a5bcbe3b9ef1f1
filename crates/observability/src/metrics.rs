//! Liveness metrics
//!
//! Prometheus-facing counters/gauges plus an in-memory aggregator for
//! end-of-run summaries.

use std::collections::BTreeMap;

use contracts::{RefreshOutcome, SensorStatus};
use metrics::{counter, gauge, histogram};

/// Record the outcome of one refresh pass
///
/// # Example
///
/// ```ignore
/// let outcome = sensor.refresh_state();
/// observability::record_refresh_outcome(sensor.name(), sensor.kind(), &outcome);
/// ```
pub fn record_refresh_outcome(sensor: &str, kind: &str, outcome: &RefreshOutcome) {
    let label = match outcome {
        RefreshOutcome::Unique => "unique",
        RefreshOutcome::Repeated => "repeated",
        RefreshOutcome::Invalid { .. } => "invalid",
    };
    counter!(
        "sensor_monitor_updates_total",
        "sensor" => sensor.to_string(),
        "kind" => kind.to_string(),
        "outcome" => label
    )
    .increment(1);

    if let RefreshOutcome::Invalid { reported: true } = outcome {
        counter!(
            "sensor_monitor_diagnostics_total",
            "sensor" => sensor.to_string()
        )
        .increment(1);
    }
}

/// Publish the polled state of one sensor
pub fn record_sensor_status(status: &SensorStatus) {
    let sensor = status.name.to_string();
    gauge!("sensor_monitor_active", "sensor" => sensor.clone())
        .set(if status.active { 1.0 } else { 0.0 });
    gauge!("sensor_monitor_depth_m", "sensor" => sensor.clone()).set(status.depth);

    if let Some(staleness) = status.staleness_secs() {
        histogram!("sensor_monitor_staleness_ms", "sensor" => sensor).record(staleness * 1000.0);
    }
}

/// Record a measurement dropped before reaching its sensor
pub fn record_measurement_dropped(sensor: &str, reason: &'static str) {
    counter!(
        "sensor_monitor_measurements_dropped_total",
        "sensor" => sensor.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Per-sensor refresh counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorCounts {
    pub unique: u64,
    pub repeated: u64,
    pub invalid: u64,
    pub reported: u64,
}

impl SensorCounts {
    pub fn total(&self) -> u64 {
        self.unique + self.repeated + self.invalid
    }
}

/// Liveness metrics aggregator
///
/// Aggregates in memory, for summaries printed at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct LivenessMetricsAggregator {
    /// Counters per sensor
    pub counts: BTreeMap<String, SensorCounts>,

    /// Gap between consecutive unique updates per sensor (ms)
    pub unique_gap_stats: BTreeMap<String, RunningStats>,

    last_unique: BTreeMap<String, f64>,
}

impl LivenessMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one refresh outcome observed at `at_secs`
    pub fn update(&mut self, sensor: &str, outcome: &RefreshOutcome, at_secs: f64) {
        let counts = self.counts.entry(sensor.to_string()).or_default();
        match outcome {
            RefreshOutcome::Unique => {
                counts.unique += 1;
                if let Some(prev) = self.last_unique.insert(sensor.to_string(), at_secs) {
                    self.unique_gap_stats
                        .entry(sensor.to_string())
                        .or_default()
                        .push((at_secs - prev) * 1000.0);
                }
            }
            RefreshOutcome::Repeated => counts.repeated += 1,
            RefreshOutcome::Invalid { reported } => {
                counts.invalid += 1;
                if *reported {
                    counts.reported += 1;
                }
            }
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let sensors = self
            .counts
            .iter()
            .map(|(name, counts)| {
                let total = counts.total();
                let invalid_rate = if total > 0 {
                    counts.invalid as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                let gaps = self
                    .unique_gap_stats
                    .get(name)
                    .map(StatsSummary::from)
                    .unwrap_or_default();
                (
                    name.clone(),
                    SensorSummary {
                        counts: counts.clone(),
                        invalid_rate,
                        unique_gap_ms: gaps,
                    },
                )
            })
            .collect();
        MetricsSummary { sensors }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary for one sensor
#[derive(Debug, Clone, Default)]
pub struct SensorSummary {
    pub counts: SensorCounts,
    pub invalid_rate: f64,
    pub unique_gap_ms: StatsSummary,
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub sensors: BTreeMap<String, SensorSummary>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Liveness Summary ===")?;
        for (name, s) in &self.sensors {
            writeln!(
                f,
                "{}: updates={} unique={} repeated={} invalid={} ({:.2}%) diagnostics={}",
                name,
                s.counts.total(),
                s.counts.unique,
                s.counts.repeated,
                s.counts.invalid,
                s.invalid_rate,
                s.counts.reported
            )?;
            writeln!(f, "  unique gap (ms): {}", s.unique_gap_ms)?;
        }
        Ok(())
    }
}

/// Stats summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
