//! TransformProvider trait - frame lookup collaborator
//!
//! Sensors hold a shared handle to the provider; only concrete drivers query it.

use std::fmt;

use nalgebra::Isometry3;
use thiserror::Error;

use crate::Timestamp;

/// Rigid transform mapping points expressed in a source frame into a target frame
pub type FrameTransform = Isometry3<f64>;

/// Transform lookup failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// No transform is known between the two frames
    #[error("no transform from '{source_frame}' to '{target}'")]
    NotFound {
        target: String,
        source_frame: String,
    },
}

/// Frame-transform service
///
/// Owned by the surrounding process and shared with sensors via `Arc`.
pub trait TransformProvider: Send + Sync + fmt::Debug {
    /// Resolve the transform taking `source` coordinates into `target` at time `at`.
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        at: Timestamp,
    ) -> Result<FrameTransform, TransformError>;

    /// Whether a transform can currently be resolved
    fn can_transform(&self, target: &str, source: &str, at: Timestamp) -> bool {
        self.lookup_transform(target, source, at).is_ok()
    }
}
