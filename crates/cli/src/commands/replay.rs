//! `replay` command implementation.
//!
//! Applies recorded measurements in file order against a [`ManualClock`] that
//! follows the measurement timestamps, so a run is reproducible regardless of
//! how fast the file is read.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{ManualClock, Measurement, MonitorBlueprint, RefreshOutcome, SensorStatus, Timestamp};
use liveness::{build_registry, transforms_from_blueprint};
use observability::{LivenessMetricsAggregator, MetricsSummary};
use serde::Serialize;
use tracing::{info, warn};

use super::{load_blueprint, print_snapshot, read_measurements};
use crate::cli::ReplayArgs;

/// Result of applying one measurement
#[derive(Debug, Serialize)]
struct ReplayStep {
    line: usize,
    timestamp: Timestamp,
    sensor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<RefreshOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<SensorStatus>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    steps: Vec<ReplayStep>,
    settled_at: Timestamp,
    final_snapshot: Vec<SensorStatus>,
    #[serde(skip)]
    summary: MetricsSummary,
}

/// Execute the `replay` command
pub fn run_replay(args: &ReplayArgs) -> Result<()> {
    if !args.settle.is_finite() || args.settle < 0.0 {
        anyhow::bail!("--settle must be finite and >= 0, got {}", args.settle);
    }

    let blueprint = load_blueprint(&args.config)?;
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let measurements = read_measurements(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    info!(
        measurements = measurements.len(),
        sensors = blueprint.sensors.len(),
        "Replaying measurements"
    );

    let report = replay(&blueprint, &measurements, args.settle)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize replay report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn replay(
    blueprint: &MonitorBlueprint,
    measurements: &[Measurement],
    settle: f64,
) -> Result<ReplayReport> {
    let start = measurements
        .first()
        .map(|m| m.timestamp)
        .unwrap_or(Timestamp::ZERO);
    let clock = ManualClock::new(start);
    let registry = build_registry(
        blueprint,
        Arc::new(clock.clone()),
        transforms_from_blueprint(blueprint),
    )
    .context("Failed to build sensors")?;

    let mut aggregator = LivenessMetricsAggregator::new();
    let mut steps = Vec::with_capacity(measurements.len());
    let mut last = start;

    for (idx, m) in measurements.iter().enumerate() {
        if m.timestamp < last {
            warn!(
                sensor = %m.sensor_id,
                timestamp = %m.timestamp,
                previous = %last,
                "measurement out of order"
            );
        }
        clock.set(m.timestamp);
        last = m.timestamp;

        let step = match registry.apply(m) {
            Ok(outcome) => {
                aggregator.update(&m.sensor_id, &outcome, m.timestamp.as_secs());
                ReplayStep {
                    line: idx + 1,
                    timestamp: m.timestamp,
                    sensor: m.sensor_id.to_string(),
                    outcome: Some(outcome),
                    error: None,
                    status: registry.status(&m.sensor_id),
                }
            }
            Err(e) => {
                warn!(sensor = %m.sensor_id, error = %e, "measurement rejected");
                ReplayStep {
                    line: idx + 1,
                    timestamp: m.timestamp,
                    sensor: m.sensor_id.to_string(),
                    outcome: None,
                    error: Some(e.to_string()),
                    status: None,
                }
            }
        };
        steps.push(step);
    }

    let settled_at = Timestamp::from_secs(last.as_secs() + settle);
    clock.set(settled_at);

    Ok(ReplayReport {
        steps,
        settled_at,
        final_snapshot: registry.snapshot(),
        summary: aggregator.summary(),
    })
}

fn print_report(report: &ReplayReport) {
    for step in &report.steps {
        match (&step.outcome, &step.status) {
            (Some(outcome), Some(status)) => println!(
                "[{:>9}] {:<16} {:<10} depth={:.3} active={}",
                step.timestamp.to_string(),
                step.sensor,
                outcome_label(outcome),
                status.depth,
                status.active
            ),
            _ => println!(
                "[{:>9}] {:<16} rejected   {}",
                step.timestamp.to_string(),
                step.sensor,
                step.error.as_deref().unwrap_or("")
            ),
        }
    }

    println!("\n📋 Snapshot at {}", report.settled_at);
    print_snapshot(&report.final_snapshot);
    println!("\n{}", report.summary);
}

fn outcome_label(outcome: &RefreshOutcome) -> &'static str {
    match outcome {
        RefreshOutcome::Unique => "unique",
        RefreshOutcome::Repeated => "repeated",
        RefreshOutcome::Invalid { reported: true } => "invalid!",
        RefreshOutcome::Invalid { reported: false } => "invalid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::io::Write;

    const CONFIG: &str = r#"
[monitor]
default_inactivity_timeout_sec = 2.0
diagnostic_interval_sec = 1.0

[[sensors]]
name = "depth"
driver = { kind = "depth" }
"#;

    fn blueprint() -> MonitorBlueprint {
        ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap()
    }

    #[test]
    fn test_invalid_reading_keeps_last_value() {
        let measurements = vec![
            Measurement::depth("depth", 0.0, 5.0),
            Measurement::depth("depth", 1.0, f64::NAN),
        ];
        let report = replay(&blueprint(), &measurements, 2.0).unwrap();

        assert_eq!(report.steps[0].outcome, Some(RefreshOutcome::Unique));
        let after_invalid = report.steps[1].status.as_ref().unwrap();
        assert_eq!(report.steps[1].outcome, Some(RefreshOutcome::Invalid { reported: true }));
        assert_eq!(after_invalid.depth, 5.0);
        assert!(after_invalid.active);

        // Settled at t=3
        assert_eq!(report.settled_at.as_secs(), 3.0);
        assert!(!report.final_snapshot[0].active);
        assert_eq!(report.final_snapshot[0].depth, 5.0);
    }

    #[test]
    fn test_repeats_do_not_extend_activity() {
        let measurements = vec![
            Measurement::depth("depth", 0.0, 5.0),
            Measurement::depth("depth", 1.9, 5.0),
        ];
        let report = replay(&blueprint(), &measurements, 0.2).unwrap();
        assert_eq!(report.steps[1].outcome, Some(RefreshOutcome::Repeated));
        assert!(report.steps[1].status.as_ref().unwrap().active);
        assert!(!report.final_snapshot[0].active);

        let summary = &report.summary.sensors["depth"];
        assert_eq!(summary.counts.unique, 1);
        assert_eq!(summary.counts.repeated, 1);
    }

    #[test]
    fn test_unknown_sensor_is_reported_not_fatal() {
        let measurements = vec![
            Measurement::depth("sonar", 0.0, 1.0),
            Measurement::depth("depth", 0.5, 1.0),
        ];
        let report = replay(&blueprint(), &measurements, 0.0).unwrap();
        assert!(report.steps[0].error.as_ref().unwrap().contains("sonar"));
        assert!(report.final_snapshot[0].active);
    }

    #[test]
    fn test_run_replay_from_files() {
        let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        config.write_all(CONFIG.as_bytes()).unwrap();

        let mut input = tempfile::NamedTempFile::new().unwrap();
        for m in [
            Measurement::depth("depth", 0.0, 5.0),
            Measurement::depth("depth", 0.5, 5.5),
        ] {
            writeln!(input, "{}", serde_json::to_string(&m).unwrap()).unwrap();
        }

        let args = ReplayArgs {
            config: config.path().to_path_buf(),
            input: input.path().to_path_buf(),
            settle: 1.0,
            json: true,
        };
        assert!(run_replay(&args).is_ok());

        let bad = ReplayArgs {
            settle: -1.0,
            ..args
        };
        assert!(run_replay(&bad).is_err());
    }
}
