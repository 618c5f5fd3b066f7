//! Acoustic parameter set for EchoSonic

use crate::error::{EchoSonicError, Result};

/// Tunable parameters for one trace and the sample injection that follows.
///
/// Held by the controller and treated as immutable for the duration of a
/// trace. `validate` must pass before a parameter set is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticParameters {
    /// Fixed pre-reflection delay in milliseconds. A value of zero disables
    /// pre-delay entirely.
    pub pre_delay_ms: f32,
    /// Sound propagation delay per meter of travel, in milliseconds.
    pub ms_per_meter: f32,
    /// Multiplier applied to the distance attenuation curve.
    pub distance_scale: f32,
    /// Number of scattered child rays spawned per bounce. Zero disables
    /// diffusion spawning.
    pub diffusion_fanout: u32,
    /// Fraction of surface energy absorbed at each bounce.
    pub absorption_ratio: f32,
    /// Fraction of surface energy scattered into diffusion children.
    pub diffusion_ratio: f32,
    /// Perturb surface normals slightly to model imperfect surfaces.
    pub jitter_normals: bool,
    /// Seed rays from the head orientation rather than the avatar body.
    pub head_oriented: bool,
    /// Compute per-ear distances from the true ear positions rather than
    /// the head center.
    pub separate_ears: bool,
    /// Interpret inbound batches as true stereo rather than mono duplicated
    /// across both channels.
    pub stereo_source: bool,
    /// Select the diffusion engine; otherwise the single-bounce-chain
    /// engine runs.
    pub with_diffusion: bool,
}

impl Default for AcousticParameters {
    fn default() -> Self {
        Self {
            pre_delay_ms: 20.0,
            ms_per_meter: 3.0,
            distance_scale: 2.0,
            diffusion_fanout: 5,
            absorption_ratio: 0.125,
            diffusion_ratio: 0.125,
            jitter_normals: false,
            head_oriented: false,
            separate_ears: true,
            stereo_source: true,
            with_diffusion: true,
        }
    }
}

impl AcousticParameters {
    /// Surface energy share that reflects specularly.
    pub fn reflective_ratio(&self) -> f32 {
        1.0 - self.absorption_ratio - self.diffusion_ratio
    }

    pub fn pre_delay_enabled(&self) -> bool {
        self.pre_delay_ms > 0.0
    }

    /// Rejects parameter sets the engine must not run with. Out-of-range
    /// energy splits are errors, never silently clamped.
    pub fn validate(&self) -> Result<()> {
        if !self.ms_per_meter.is_finite() || self.ms_per_meter <= 0.0 {
            return Err(EchoSonicError::InvalidParameters(format!(
                "ms_per_meter must be positive, got {}",
                self.ms_per_meter
            )));
        }
        if !self.pre_delay_ms.is_finite() || self.pre_delay_ms < 0.0 {
            return Err(EchoSonicError::InvalidParameters(format!(
                "pre_delay_ms must be non-negative, got {}",
                self.pre_delay_ms
            )));
        }
        if !self.distance_scale.is_finite() || self.distance_scale < 0.0 {
            return Err(EchoSonicError::InvalidParameters(format!(
                "distance_scale must be non-negative, got {}",
                self.distance_scale
            )));
        }
        for (name, value) in [
            ("absorption_ratio", self.absorption_ratio),
            ("diffusion_ratio", self.diffusion_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EchoSonicError::InvalidParameters(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.absorption_ratio + self.diffusion_ratio > 1.0 {
            return Err(EchoSonicError::InvalidParameters(format!(
                "absorption_ratio + diffusion_ratio must not exceed 1, got {}",
                self.absorption_ratio + self.diffusion_ratio
            )));
        }
        Ok(())
    }
}
