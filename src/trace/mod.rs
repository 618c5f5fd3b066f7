//! The reflection engine: seed rays, bounce them through the voxel world,
//! and collect the audible points sound reaches the listener from.
//!
//! Two interchangeable strategies share every interface type: the
//! single-bounce-chain engine ([`chain`]) and the diffusion engine
//! ([`diffusion`]). Which one runs is a parameter tag decided once per
//! trace.

pub mod chain;
pub mod diffusion;
pub mod path;

pub use path::PathState;

use crate::acoustics::AcousticModel;
use crate::math::{ListenerPose, Vec3};
use crate::scene::RayHitOracle;
use rand::rngs::SmallRng;

/// Paths quieter than this contribute nothing audible.
pub const MIN_ATTENUATION: f32 = 1.0 / 256.0;
/// Hard ceiling on accumulated delay for any contribution.
pub const MAX_DELAY_MS: f32 = 20_000.0;
/// Maximum specular bounces along any one path.
pub const MAX_BOUNCES: u32 = 10;
/// Reflection points sit slightly inside the surface so the next segment
/// starts on the listener side of it.
pub const SLIGHTLY_SHORT: f32 = 0.999;
/// Hard ceiling on live paths per trace; spawning stops beyond it.
pub const MAX_ACTIVE_PATHS: usize = 10_000;

/// A point in space from which reflected or diffused sound reaches the
/// listener, with the delay, attenuation, and travel distance accumulated
/// up to that point. The ear-to-point leg is added at injection time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudiblePoint {
    pub location: Vec3,
    pub delay_ms: f32,
    pub attenuation: f32,
    pub path_distance: f32,
}

/// Output of one trace: the audible points plus the finished paths (kept
/// for visualization), regenerated whenever the listener moves enough.
#[derive(Debug, Clone)]
pub struct TraceResult {
    /// Listener position the trace was seeded from.
    pub origin: Vec3,
    pub audible_points: Vec<AudiblePoint>,
    pub paths: Vec<PathState>,
    /// Diffusion children that were never spawned because the active-path
    /// ceiling was reached.
    pub truncated_paths: usize,
}

impl TraceResult {
    pub fn empty() -> Self {
        Self {
            origin: Vec3::ZERO,
            audible_points: Vec::new(),
            paths: Vec::new(),
            truncated_paths: 0,
        }
    }
}

/// Aggregate numbers over one trace result, recomputed per trace for the
/// diffusion engine and per inbound batch for the chain engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReflectionStats {
    pub audible_points: usize,
    pub paths: usize,
    pub diffusion_paths: usize,
    pub truncated_paths: usize,
    pub min_delay_ms: f32,
    pub max_delay_ms: f32,
    pub avg_delay_ms: f32,
    pub min_attenuation: f32,
    pub max_attenuation: f32,
    pub avg_attenuation: f32,
}

impl ReflectionStats {
    pub fn from_result(result: &TraceResult) -> Self {
        let mut stats = Self {
            audible_points: result.audible_points.len(),
            paths: result.paths.len(),
            diffusion_paths: result
                .paths
                .iter()
                .filter(|p| p.seed_origin != result.origin)
                .count(),
            truncated_paths: result.truncated_paths,
            ..Self::default()
        };
        if result.audible_points.is_empty() {
            return stats;
        }

        stats.min_delay_ms = f32::INFINITY;
        stats.min_attenuation = f32::INFINITY;
        let mut delay_sum = 0.0f32;
        let mut attenuation_sum = 0.0f32;
        for point in &result.audible_points {
            stats.min_delay_ms = stats.min_delay_ms.min(point.delay_ms);
            stats.max_delay_ms = stats.max_delay_ms.max(point.delay_ms);
            stats.min_attenuation = stats.min_attenuation.min(point.attenuation);
            stats.max_attenuation = stats.max_attenuation.max(point.attenuation);
            delay_sum += point.delay_ms;
            attenuation_sum += point.attenuation;
        }
        let count = result.audible_points.len() as f32;
        stats.avg_delay_ms = delay_sum / count;
        stats.avg_attenuation = attenuation_sum / count;
        stats
    }
}

/// Runs one full trace with the strategy the parameters select.
pub fn trace(
    model: &AcousticModel,
    oracle: &dyn RayHitOracle,
    pose: &ListenerPose,
    rng: &mut SmallRng,
) -> TraceResult {
    let orientation = pose.tracing_orientation(model.params().head_oriented);
    if model.params().with_diffusion {
        diffusion::trace_diffusion(model, oracle, pose.position, orientation, rng)
    } else {
        chain::trace_chains(model, oracle, pose.position, orientation, rng)
    }
}
