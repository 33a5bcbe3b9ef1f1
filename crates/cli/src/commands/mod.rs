//! Command implementations.

mod info;
mod monitor;
mod replay;
mod validate;

pub use info::run_info;
pub use monitor::run_monitor;
pub use replay::run_replay;
pub use validate::run_validate;

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{Measurement, MonitorBlueprint, SensorStatus};

/// Load and validate a configuration file
fn load_blueprint(path: &Path) -> Result<MonitorBlueprint> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Parse one JSON line; blank lines and `#` comments yield `None`
fn parse_measurement_line(line: &str) -> Result<Option<Measurement>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let measurement = serde_json::from_str(line).context("Invalid measurement line")?;
    Ok(Some(measurement))
}

/// Read every measurement from a JSON lines source
fn read_measurements(reader: impl BufRead) -> Result<Vec<Measurement>> {
    let mut measurements = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read measurements")?;
        if let Some(m) = parse_measurement_line(&line).with_context(|| format!("line {}", idx + 1))? {
            measurements.push(m);
        }
    }
    Ok(measurements)
}

fn print_snapshot(snapshot: &[SensorStatus]) {
    println!(
        "   {:<16} {:<6} {:<8} {:>10} {:>12}",
        "SENSOR", "KIND", "ACTIVE", "DEPTH", "STALENESS"
    );
    for status in snapshot {
        let staleness = status
            .staleness_secs()
            .map(|s| format!("{s:.3}s"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<16} {:<6} {:<8} {:>10.3} {:>12}",
            status.name.as_str(),
            status.kind,
            if status.active { "yes" } else { "no" },
            status.depth,
            staleness
        );
    }
}
