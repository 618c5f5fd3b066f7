//! In-flight ray state for the reflection engines.

use crate::math::Vec3;

/// One in-flight ray, advanced a bounce at a time.
///
/// `origin`/`direction` describe the segment about to be traced; delay,
/// attenuation, and distance accumulate from the seed. `seed_origin`
/// distinguishes primary rays (seeded at the listener) from diffusion
/// children (seeded at a bounce point).
#[derive(Debug, Clone)]
pub struct PathState {
    pub origin: Vec3,
    pub direction: Vec3,
    pub delay_ms: f32,
    pub attenuation: f32,
    pub distance: f32,
    pub bounce_depth: u32,
    pub terminated: bool,
    pub reflections: Vec<Vec3>,
    pub seed_origin: Vec3,
}

impl PathState {
    /// Primary ray fired from the listener.
    pub fn seed(origin: Vec3, direction: Vec3, delay_ms: f32) -> Self {
        Self {
            origin,
            direction,
            delay_ms,
            attenuation: 1.0,
            distance: 0.0,
            bounce_depth: 0,
            terminated: false,
            reflections: Vec::new(),
            seed_origin: origin,
        }
    }

    /// Scattered child spawned at a bounce point, inheriting the parent's
    /// accumulated delay and distance and a share of its energy.
    pub fn child(
        origin: Vec3,
        direction: Vec3,
        delay_ms: f32,
        attenuation: f32,
        distance: f32,
    ) -> Self {
        Self {
            origin,
            direction,
            delay_ms,
            attenuation,
            distance,
            bounce_depth: 0,
            terminated: false,
            reflections: Vec::new(),
            seed_origin: origin,
        }
    }
}
