//! MonitorBlueprint - Config Loader output
//!
//! Describes every monitored sensor, its driver parameters and timing, plus the
//! static mount transforms the drivers resolve frames against.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::ContractError;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Defaults shared by all sensors
    #[serde(default)]
    #[validate(nested)]
    pub monitor: MonitorConfig,

    /// Monitored sensors
    #[validate(nested)]
    pub sensors: Vec<SensorConfig>,

    /// Static mount transforms
    #[serde(default)]
    #[validate(nested)]
    pub transforms: Vec<MountConfig>,
}

/// Monitor-wide defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorConfig {
    /// Staleness window used when a sensor does not set its own (seconds)
    #[serde(default = "default_inactivity_timeout")]
    #[validate(range(exclusive_min = 0.0))]
    pub default_inactivity_timeout_sec: f64,

    /// Minimum spacing between two invalid-data diagnostics (seconds)
    #[serde(default = "default_diagnostic_interval")]
    #[validate(range(min = 0.0))]
    pub diagnostic_interval_sec: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_inactivity_timeout_sec: default_inactivity_timeout(),
            diagnostic_interval_sec: default_diagnostic_interval(),
        }
    }
}

fn default_inactivity_timeout() -> f64 {
    2.0
}

fn default_diagnostic_interval() -> f64 {
    1.0
}

/// Timing settings of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSettings {
    /// No unique update within this window means inactive
    pub inactivity_timeout: Duration,

    /// Rate-limit window for invalid-data diagnostics
    pub diagnostic_interval: Duration,
}

impl SensorSettings {
    /// Build settings from seconds, rejecting zero, negative and non-finite timeouts.
    pub fn from_secs(
        name: &str,
        inactivity_timeout_sec: f64,
        diagnostic_interval_sec: f64,
    ) -> Result<Self, ContractError> {
        if !inactivity_timeout_sec.is_finite() || inactivity_timeout_sec <= 0.0 {
            return Err(ContractError::invalid_sensor(
                name,
                format!("inactivity timeout must be finite and > 0, got {inactivity_timeout_sec}"),
            ));
        }
        if !diagnostic_interval_sec.is_finite() || diagnostic_interval_sec < 0.0 {
            return Err(ContractError::invalid_sensor(
                name,
                format!("diagnostic interval must be finite and >= 0, got {diagnostic_interval_sec}"),
            ));
        }
        Ok(Self {
            inactivity_timeout: secs_to_duration(name, "timeout", inactivity_timeout_sec)?,
            diagnostic_interval: secs_to_duration(name, "interval", diagnostic_interval_sec)?,
        })
    }
}

/// Seconds beyond what a `Duration` can hold are a configuration error.
fn secs_to_duration(name: &str, what: &str, secs: f64) -> Result<Duration, ContractError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ContractError::invalid_sensor(name, format!("{what} of {secs}s: {e}")))
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs_f64(default_inactivity_timeout()),
            diagnostic_interval: Duration::from_secs_f64(default_diagnostic_interval()),
        }
    }
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensorConfig {
    /// Unique name, also the measurement routing key
    #[validate(length(min = 1))]
    pub name: String,

    /// Overrides `monitor.default_inactivity_timeout_sec`
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub inactivity_timeout_sec: Option<f64>,

    /// Overrides `monitor.diagnostic_interval_sec`
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub diagnostic_interval_sec: Option<f64>,

    /// Driver selection and parameters
    pub driver: DriverConfig,
}

impl SensorConfig {
    /// Resolve the effective timing against the monitor defaults
    pub fn settings(&self, monitor: &MonitorConfig) -> Result<SensorSettings, ContractError> {
        SensorSettings::from_secs(
            &self.name,
            self.inactivity_timeout_sec
                .unwrap_or(monitor.default_inactivity_timeout_sec),
            self.diagnostic_interval_sec
                .unwrap_or(monitor.diagnostic_interval_sec),
        )
    }
}

/// Driver selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverConfig {
    Depth(DepthDriverConfig),
    Dvl(DvlDriverConfig),
}

impl DriverConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Depth(_) => "depth",
            Self::Dvl(_) => "dvl",
        }
    }
}

/// Pressure depth sensor parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DepthDriverConfig {
    /// Lowest accepted depth (metres)
    #[serde(default = "default_min_depth")]
    pub min_depth: f64,

    /// Highest accepted depth (metres)
    #[serde(default = "default_max_depth")]
    pub max_depth: f64,

    /// Changes at or below this are repeats (metres)
    #[serde(default = "default_tolerance")]
    #[validate(range(min = 0.0))]
    pub tolerance: f64,
}

impl Default for DepthDriverConfig {
    fn default() -> Self {
        Self {
            min_depth: default_min_depth(),
            max_depth: default_max_depth(),
            tolerance: default_tolerance(),
        }
    }
}

fn default_min_depth() -> f64 {
    -1.0
}

fn default_max_depth() -> f64 {
    100.0
}

fn default_tolerance() -> f64 {
    1e-6
}

/// DVL dead-reckoning parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DvlDriverConfig {
    /// Frame the reports are expressed in
    #[validate(length(min = 1))]
    pub frame: String,

    /// Frame the depth is reported in
    #[validate(length(min = 1))]
    pub reference_frame: String,

    /// Reports with a larger standard deviation are invalid (metres)
    #[serde(default = "default_max_std")]
    #[validate(range(min = 0.0))]
    pub max_std: f64,

    /// Position changes at or below this are repeats (metres)
    #[serde(default = "default_tolerance")]
    #[validate(range(min = 0.0))]
    pub tolerance: f64,
}

fn default_max_std() -> f64 {
    1.0
}

/// Static mount transform between two frames
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MountConfig {
    /// Target frame
    #[validate(length(min = 1))]
    pub parent: String,

    /// Source frame
    #[validate(length(min = 1))]
    pub child: String,

    /// Pose of `child` in `parent`
    pub transform: Transform,
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z) in metres
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    pub rotation: Rotation,
}

impl Transform {
    /// Convert to an isometry mapping child coordinates into the parent frame
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let r = &self.rotation;
        let rotation = UnitQuaternion::from_euler_angles(
            r.roll.to_radians(),
            r.pitch.to_radians(),
            r.yaw.to_radians(),
        );
        let l = &self.location;
        Isometry3::from_parts(Translation3::new(l.x, l.y, l.z), rotation)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}
