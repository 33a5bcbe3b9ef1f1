//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the sensor monitor.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are seconds as `f64`, read from a single injected [`Clock`]
//! - Durations (timeouts, rate-limit windows) are `std::time::Duration`
//!
//! ## Extension Model
//! - [`SensorDriver`] is the whole extension surface for concrete sensors
//! - [`TransformProvider`] is the only way drivers see frame geometry

mod blueprint;
mod driver;
mod error;
mod measurement;
mod sensor_id;
mod status;
mod time;
mod transform;

pub use blueprint::*;
pub use driver::SensorDriver;
pub use error::*;
pub use measurement::*;
pub use sensor_id::SensorId;
pub use status::*;
pub use time::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use transform::{FrameTransform, TransformError, TransformProvider};
