//! Configuration validation
//!
//! Rules:
//! - at least one sensor, names non-empty and unique
//! - timeouts finite and > 0, diagnostic intervals finite and >= 0
//! - both must fit in a `Duration`
//! - depth driver: min_depth < max_depth, tolerance >= 0
//! - dvl driver: frames non-empty, max_std finite and >= 0
//! - mounts: frames non-empty and distinct, no duplicate (parent, child) pair

use std::collections::HashSet;
use std::time::Duration;

use ::validator::Validate;
use contracts::{ContractError, DriverConfig, MonitorBlueprint, MountConfig, SensorConfig};

/// Validate a MonitorBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_monitor(blueprint)?;
    validate_sensor_names(blueprint)?;
    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        validate_sensor(idx, sensor)?;
    }
    validate_mounts(&blueprint.transforms)?;
    Ok(())
}

/// Field-level rules declared on the blueprint types
fn validate_fields(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

fn validate_monitor(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let monitor = &blueprint.monitor;
    check_timeout(
        "monitor.default_inactivity_timeout_sec",
        monitor.default_inactivity_timeout_sec,
    )?;
    check_interval("monitor.diagnostic_interval_sec", monitor.diagnostic_interval_sec)
}

fn validate_sensor_names(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    if blueprint.sensors.is_empty() {
        return Err(ContractError::config_validation(
            "sensors",
            "at least one sensor is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, sensor) in blueprint.sensors.iter().enumerate() {
        if sensor.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sensors[{idx}].name"),
                "sensor name cannot be empty",
            ));
        }
        if !seen.insert(sensor.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors[name={}]", sensor.name),
                "duplicate sensor name",
            ));
        }
    }
    Ok(())
}

fn validate_sensor(idx: usize, sensor: &SensorConfig) -> Result<(), ContractError> {
    let prefix = format!("sensors[{}]", sensor.name);
    if let Some(timeout) = sensor.inactivity_timeout_sec {
        check_timeout(&format!("{prefix}.inactivity_timeout_sec"), timeout)?;
    }
    if let Some(interval) = sensor.diagnostic_interval_sec {
        check_interval(&format!("{prefix}.diagnostic_interval_sec"), interval)?;
    }

    match &sensor.driver {
        DriverConfig::Depth(depth) => {
            depth.validate().map_err(|e| {
                ContractError::config_validation(format!("sensors[{idx}].driver"), e.to_string())
            })?;
            if !depth.min_depth.is_finite() || !depth.max_depth.is_finite() {
                return Err(ContractError::config_validation(
                    format!("{prefix}.driver"),
                    "depth limits must be finite",
                ));
            }
            if depth.min_depth >= depth.max_depth {
                return Err(ContractError::config_validation(
                    format!("{prefix}.driver.min_depth / max_depth"),
                    format!(
                        "min_depth ({}) must be < max_depth ({})",
                        depth.min_depth, depth.max_depth
                    ),
                ));
            }
        }
        DriverConfig::Dvl(dvl) => {
            dvl.validate().map_err(|e| {
                ContractError::config_validation(format!("sensors[{idx}].driver"), e.to_string())
            })?;
            if !dvl.max_std.is_finite() {
                return Err(ContractError::config_validation(
                    format!("{prefix}.driver.max_std"),
                    format!("max_std must be finite, got {}", dvl.max_std),
                ));
            }
        }
    }
    Ok(())
}

fn validate_mounts(mounts: &[MountConfig]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, mount) in mounts.iter().enumerate() {
        if mount.parent.is_empty() || mount.child.is_empty() {
            return Err(ContractError::config_validation(
                format!("transforms[{idx}]"),
                "parent and child frames cannot be empty",
            ));
        }
        if mount.parent == mount.child {
            return Err(ContractError::config_validation(
                format!("transforms[{idx}]"),
                format!("parent and child are both '{}'", mount.parent),
            ));
        }
        // A pair registered in either direction resolves both ways
        let key = if mount.parent < mount.child {
            (mount.parent.as_str(), mount.child.as_str())
        } else {
            (mount.child.as_str(), mount.parent.as_str())
        };
        if !seen.insert(key) {
            return Err(ContractError::config_validation(
                format!("transforms[{idx}]"),
                format!("duplicate mount {} -> {}", mount.parent, mount.child),
            ));
        }
    }
    Ok(())
}

fn check_timeout(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("timeout must be finite and > 0, got {value}"),
        ));
    }
    check_representable(field, value)
}

fn check_interval(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("interval must be finite and >= 0, got {value}"),
        ));
    }
    check_representable(field, value)
}

fn check_representable(field: &str, value: f64) -> Result<(), ContractError> {
    Duration::try_from_secs_f64(value)
        .map(|_| ())
        .map_err(|_| ContractError::config_validation(field, format!("{value}s is out of range")))
}
