//! Build sensors from a [`MonitorBlueprint`].

use std::sync::Arc;

use contracts::{Clock, DriverConfig, MonitorBlueprint, SensorConfig, TransformProvider};
use tracing::{info, instrument};

use crate::drivers::{DepthDriver, DvlDriver};
use crate::error::Result;
use crate::registry::SensorRegistry;
use crate::sensor::Sensor;
use crate::transforms::StaticTransformProvider;

/// Transform provider holding the blueprint's static mounts
pub fn transforms_from_blueprint(blueprint: &MonitorBlueprint) -> Arc<dyn TransformProvider> {
    Arc::new(StaticTransformProvider::from_mounts(&blueprint.transforms))
}

/// Create and register one sensor per blueprint entry.
///
/// All sensors share `clock` and `transforms`.
///
/// # Errors
/// - invalid timing for a sensor
/// - duplicate sensor names
#[instrument(name = "build_registry", skip_all, fields(sensors = blueprint.sensors.len()))]
pub fn build_registry(
    blueprint: &MonitorBlueprint,
    clock: Arc<dyn Clock>,
    transforms: Arc<dyn TransformProvider>,
) -> Result<SensorRegistry> {
    let mut registry = SensorRegistry::new();
    for config in &blueprint.sensors {
        register_sensor(&mut registry, blueprint, config, clock.clone(), transforms.clone())?;
    }
    info!(sensors = registry.len(), "sensor registry built");
    Ok(registry)
}

fn register_sensor(
    registry: &mut SensorRegistry,
    blueprint: &MonitorBlueprint,
    config: &SensorConfig,
    clock: Arc<dyn Clock>,
    transforms: Arc<dyn TransformProvider>,
) -> Result<()> {
    let settings = config.settings(&blueprint.monitor)?;
    let name = config.name.as_str();

    match &config.driver {
        DriverConfig::Depth(depth) => {
            let driver = DepthDriver::new(depth.clone());
            registry.register(Sensor::new(name, driver, settings, clock, transforms)?)?;
        }
        DriverConfig::Dvl(dvl) => {
            let driver = DvlDriver::new(dvl.clone());
            registry.register(Sensor::new(name, driver, settings, clock, transforms)?)?;
        }
    }
    Ok(())
}
