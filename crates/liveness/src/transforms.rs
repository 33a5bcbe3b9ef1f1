//! Static transform table
//!
//! Mount transforms are fixed for the life of the process, so a lookup table
//! is enough for the drivers here. Time is ignored and frames are not chained.

use std::collections::HashMap;

use contracts::{FrameTransform, MountConfig, Timestamp, TransformError, TransformProvider};
use tracing::debug;

/// Direct and inverse lookups over a set of static transforms
#[derive(Debug, Clone, Default)]
pub struct StaticTransformProvider {
    /// (parent, child) -> pose of child in parent
    entries: HashMap<(String, String), FrameTransform>,
}

impl StaticTransformProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configured mounts
    pub fn from_mounts(mounts: &[MountConfig]) -> Self {
        let mut provider = Self::new();
        for mount in mounts {
            provider.insert(&mount.parent, &mount.child, mount.transform.to_isometry());
        }
        provider
    }

    /// Register the pose of `child` expressed in `parent`
    pub fn insert(&mut self, parent: &str, child: &str, transform: FrameTransform) {
        debug!(parent, child, "static transform registered");
        self.entries
            .insert((parent.to_string(), child.to_string()), transform);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TransformProvider for StaticTransformProvider {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        _at: Timestamp,
    ) -> Result<FrameTransform, TransformError> {
        if target == source {
            return Ok(FrameTransform::identity());
        }
        if let Some(t) = self.entries.get(&(target.to_string(), source.to_string())) {
            return Ok(*t);
        }
        if let Some(t) = self.entries.get(&(source.to_string(), target.to_string())) {
            return Ok(t.inverse());
        }
        Err(TransformError::NotFound {
            target: target.to_string(),
            source_frame: source.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Translation3, UnitQuaternion};

    fn provider() -> StaticTransformProvider {
        let mut p = StaticTransformProvider::new();
        p.insert(
            "auv",
            "dvl",
            FrameTransform::from_parts(
                Translation3::new(0.0, 0.0, 0.3),
                UnitQuaternion::identity(),
            ),
        );
        p
    }

    #[test]
    fn test_identity_for_same_frame() {
        let t = provider()
            .lookup_transform("dvl", "dvl", Timestamp::ZERO)
            .unwrap();
        assert_eq!(t, FrameTransform::identity());
    }

    #[test]
    fn test_direct_and_inverse() {
        let p = provider();
        let direct = p.lookup_transform("auv", "dvl", Timestamp::ZERO).unwrap();
        let origin = direct * Point3::origin();
        assert!((origin.z - 0.3).abs() < 1e-12);

        let inverse = p.lookup_transform("dvl", "auv", Timestamp::ZERO).unwrap();
        let back = inverse * origin;
        assert!(back.coords.norm() < 1e-12);
    }

    #[test]
    fn test_unknown_frames() {
        let p = provider();
        let err = p
            .lookup_transform("auv", "camera", Timestamp::ZERO)
            .unwrap_err();
        assert!(matches!(err, TransformError::NotFound { .. }));
        assert!(!p.can_transform("world", "dvl", Timestamp::ZERO));
    }

    #[test]
    fn test_not_found_names_both_frames() {
        let err = provider()
            .lookup_transform("auv", "camera", Timestamp::from_secs(4.0))
            .unwrap_err();
        // Static mounts hold at every time, so a missing pair is the only failure
        let TransformError::NotFound { target, source_frame } = err.clone();
        assert_eq!((target.as_str(), source_frame.as_str()), ("auv", "camera"));
        assert_eq!(err.to_string(), "no transform from 'camera' to 'auv'");
    }
}
