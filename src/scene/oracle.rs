//! Ray intersection interface for the surrounding voxel world.
//!
//! EchoSonic does not store geometry of its own. The host supplies an
//! implementation of [`RayHitOracle`] (typically backed by a voxel octree)
//! and the reflection engine queries it for the first surface along a ray.

use crate::math::Vec3;

/// Opaque handle identifying the world element a ray hit.
///
/// Passed back through surface-characteristics lookup so hosts can map
/// hits to per-element materials if they want to.
pub type ElementId = u64;

/// Which face of an axis-aligned voxel a ray struck.
///
/// The face tag determines the surface normal used for specular reflection
/// and for orienting scattered diffusion rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxFace {
    MinX,
    MaxX,
    MinY,
    MaxY,
    MinZ,
    MaxZ,
}

impl BoxFace {
    /// Unit outward normal for this face.
    pub fn normal(self) -> Vec3 {
        match self {
            BoxFace::MinX => Vec3::new(-1.0, 0.0, 0.0),
            BoxFace::MaxX => Vec3::new(1.0, 0.0, 0.0),
            BoxFace::MinY => Vec3::new(0.0, -1.0, 0.0),
            BoxFace::MaxY => Vec3::new(0.0, 1.0, 0.0),
            BoxFace::MinZ => Vec3::new(0.0, 0.0, -1.0),
            BoxFace::MaxZ => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Result of a ray intersection test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from ray origin to the hit point (in meters)
    pub distance: f32,

    /// Which face of the element was struck
    pub face: BoxFace,

    /// Handle of the element that was struck
    pub element: ElementId,
}

impl RayHit {
    pub fn new(distance: f32, face: BoxFace, element: ElementId) -> Self {
        Self {
            distance,
            face,
            element,
        }
    }
}

/// Trait for providing voxel ray intersection to the reflection engine.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the engine only ever reads, but
/// it may be driven from the render thread while audio callbacks run
/// elsewhere.
///
/// # Performance
///
/// A single trace can issue hundreds of `intersect` calls (14 seed rays,
/// up to 10 bounces each, plus scattered diffusion children). Keep the
/// implementation cheap.
pub trait RayHitOracle: Send + Sync {
    /// Returns the closest surface hit along the ray, or `None` if the ray
    /// escapes the world.
    ///
    /// `direction` should be normalized; the returned distance is measured
    /// in multiples of it.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;
}
