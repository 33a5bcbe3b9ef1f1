//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DriverConfig, MonitorBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sensor_count: usize,
    depth_sensor_count: usize,
    dvl_sensor_count: usize,
    transform_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let count = |kind: &str| {
                blueprint
                    .sensors
                    .iter()
                    .filter(|s| s.driver.kind() == kind)
                    .count()
            };

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sensor_count: blueprint.sensors.len(),
                    depth_sensor_count: count("depth"),
                    dvl_sensor_count: count("dvl"),
                    transform_count: blueprint.transforms.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for sensor in &blueprint.sensors {
        let DriverConfig::Dvl(dvl) = &sensor.driver else {
            continue;
        };
        if dvl.frame == dvl.reference_frame {
            continue;
        }
        let mounted = blueprint.transforms.iter().any(|m| {
            (m.parent == dvl.reference_frame && m.child == dvl.frame)
                || (m.parent == dvl.frame && m.child == dvl.reference_frame)
        });
        if !mounted {
            warnings.push(format!(
                "Sensor '{}': no transform between '{}' and '{}' - every report will be invalid",
                sensor.name, dvl.reference_frame, dvl.frame
            ));
        }
    }

    // Invalid data is reported on every measurement
    if blueprint.monitor.diagnostic_interval_sec == 0.0 {
        warnings.push("monitor.diagnostic_interval_sec is 0 - diagnostics are not rate limited".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Sensors: {} (depth: {}, dvl: {})",
                summary.sensor_count, summary.depth_sensor_count, summary.dvl_sensor_count
            );
            println!("  Transforms: {}", summary.transform_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
