//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DriverConfig, MonitorBlueprint};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    default_inactivity_timeout_sec: f64,
    diagnostic_interval_sec: f64,
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    transforms: Vec<TransformInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    name: String,
    kind: String,
    inactivity_timeout_sec: f64,
    diagnostic_interval_sec: f64,
    details: String,
}

#[derive(Serialize)]
struct TransformInfo {
    parent: String,
    child: String,
    location: [f64; 3],
    rotation_deg: [f64; 3],
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;
    let info = build_config_info(&blueprint);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &MonitorBlueprint) -> ConfigInfo {
    let monitor = &blueprint.monitor;
    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| SensorInfo {
            name: s.name.clone(),
            kind: s.driver.kind().to_string(),
            inactivity_timeout_sec: s
                .inactivity_timeout_sec
                .unwrap_or(monitor.default_inactivity_timeout_sec),
            diagnostic_interval_sec: s
                .diagnostic_interval_sec
                .unwrap_or(monitor.diagnostic_interval_sec),
            details: driver_details(&s.driver),
        })
        .collect();

    let transforms = blueprint
        .transforms
        .iter()
        .map(|m| {
            let (l, r) = (&m.transform.location, &m.transform.rotation);
            TransformInfo {
                parent: m.parent.clone(),
                child: m.child.clone(),
                location: [l.x, l.y, l.z],
                rotation_deg: [r.pitch, r.yaw, r.roll],
            }
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        default_inactivity_timeout_sec: monitor.default_inactivity_timeout_sec,
        diagnostic_interval_sec: monitor.diagnostic_interval_sec,
        sensors,
        transforms,
    }
}

fn driver_details(driver: &DriverConfig) -> String {
    match driver {
        DriverConfig::Depth(d) => format!(
            "range [{}, {}] m, tolerance {}",
            d.min_depth, d.max_depth, d.tolerance
        ),
        DriverConfig::Dvl(d) => format!(
            "{} -> {}, max std {} m, tolerance {}",
            d.frame, d.reference_frame, d.max_std, d.tolerance
        ),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Sensor Monitor Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Monitor");
    println!("   ├─ Version: {}", info.version);
    println!(
        "   ├─ Default inactivity timeout: {} s",
        info.default_inactivity_timeout_sec
    );
    println!("   └─ Diagnostic interval: {} s", info.diagnostic_interval_sec);

    println!("\n📡 Sensors ({})", info.sensors.len());
    for (i, sensor) in info.sensors.iter().enumerate() {
        let prefix = if i == info.sensors.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} ({}, timeout {} s): {}",
            prefix, sensor.name, sensor.kind, sensor.inactivity_timeout_sec, sensor.details
        );
    }

    if !info.transforms.is_empty() {
        println!("\n📐 Transforms ({})", info.transforms.len());
        for (i, t) in info.transforms.iter().enumerate() {
            let prefix = if i == info.transforms.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} <- {} at {:?}, rpy {:?} deg",
                prefix, t.parent, t.child, t.location, t.rotation_deg
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_effective_timeouts() {
        let bp = ConfigLoader::load_from_str(
            r#"
[monitor]
default_inactivity_timeout_sec = 3.0

[[sensors]]
name = "depth"
driver = { kind = "depth" }

[[sensors]]
name = "dvl"
inactivity_timeout_sec = 0.5
driver = { kind = "dvl", frame = "dvl", reference_frame = "dvl" }
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&bp);
        assert_eq!(info.sensors[0].inactivity_timeout_sec, 3.0);
        assert_eq!(info.sensors[1].inactivity_timeout_sec, 0.5);
        assert_eq!(info.sensors[1].diagnostic_interval_sec, 1.0);
        assert!(info.sensors[0].details.contains("range [-1, 100]"));
        assert!(info.transforms.is_empty());
    }
}
