//! Sensor names
//!
//! A name is assigned once when the sensor is built and then copied into
//! every measurement, status snapshot and log field, so it shares its
//! storage instead of allocating per copy.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable sensor name, e.g. `"depth"` or `"dvl"`.
///
/// Hashes like the `str` it wraps, so registries keyed by `SensorId` can be
/// queried with a plain `&str`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SensorId(Arc<str>);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only names identify nothing and are rejected
    /// when a sensor is built.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Deref for SensorId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorId {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl From<String> for SensorId {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({:?})", &*self.0)
    }
}
