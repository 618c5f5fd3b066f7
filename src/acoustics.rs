//! Delay and attenuation formulas shared by both reflection engines.

use crate::config::AcousticParameters;
use crate::error::Result;
use crate::scene::ElementId;

/// Amplitude scalar of the geometric spreading curve.
const GEOMETRIC_AMPLITUDE_SCALAR: f32 = 0.3;
/// Log base of the spreading curve.
const DISTANCE_LOG_BASE: f32 = 2.5;
/// Reference distance folded into the curve exponent.
const REFERENCE_DISTANCE: f32 = 2.5;

/// Three-way energy split of a surface. The shares sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceResponse {
    pub reflective: f32,
    pub absorption: f32,
    pub diffusion: f32,
}

/// Parameter-driven acoustic formulas.
///
/// Construction validates the parameter set, so a model in hand is always
/// safe to trace with.
#[derive(Debug, Clone)]
pub struct AcousticModel {
    params: AcousticParameters,
}

impl AcousticModel {
    pub fn new(params: AcousticParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AcousticParameters {
        &self.params
    }

    /// Propagation delay in milliseconds over `meters` of travel.
    pub fn delay_from_distance(&self, meters: f32) -> f32 {
        self.params.ms_per_meter * meters
    }

    /// Chain-engine delay: propagation plus the pre-reflection delay when
    /// enabled. The diffusion engine applies pre-delay once at seed time
    /// instead.
    pub fn chain_delay(&self, meters: f32) -> f32 {
        let pre = if self.params.pre_delay_enabled() {
            self.params.pre_delay_ms
        } else {
            0.0
        };
        self.delay_from_distance(meters) + pre
    }

    /// Geometric spreading attenuation over `meters`, clamped to unity at
    /// close range.
    pub fn distance_attenuation(&self, meters: f32) -> f32 {
        if self.params.distance_scale <= 0.0 {
            return 0.0;
        }
        let distance_square = meters * meters;
        if distance_square <= f32::MIN_POSITIVE {
            return 1.0;
        }
        let ln_base = DISTANCE_LOG_BASE.ln();
        let exponent =
            REFERENCE_DISTANCE.ln() / ln_base + 0.5 * distance_square.ln() / ln_base - 1.0;
        let coefficient = self.params.distance_scale * GEOMETRIC_AMPLITUDE_SCALAR.powf(exponent);
        coefficient.min(1.0)
    }

    /// Remaining energy after `bounces` surface reflections in the chain
    /// engine.
    pub fn bounce_attenuation(&self, bounces: u32) -> f32 {
        self.params.reflective_ratio().powi(bounces as i32)
    }

    /// Energy split of the surface an element presents. The global
    /// parameter split applies to every element; hosts wanting per-element
    /// materials can key off the handle here.
    pub fn surface(&self, _element: ElementId) -> SurfaceResponse {
        SurfaceResponse {
            reflective: self.params.reflective_ratio(),
            absorption: self.params.absorption_ratio,
            diffusion: self.params.diffusion_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(params: AcousticParameters) -> AcousticModel {
        AcousticModel::new(params).unwrap()
    }

    #[test]
    fn delay_is_linear_in_distance() {
        let m = model(AcousticParameters::default());
        assert_eq!(m.delay_from_distance(0.0), 0.0);
        assert_eq!(m.delay_from_distance(10.0), 30.0);
    }

    #[test]
    fn chain_delay_adds_pre_delay_only_when_enabled() {
        let m = model(AcousticParameters::default());
        assert_eq!(m.chain_delay(0.0), 20.0);
        assert_eq!(m.chain_delay(10.0), 50.0);

        let m = model(AcousticParameters {
            pre_delay_ms: 0.0,
            ..Default::default()
        });
        assert_eq!(m.chain_delay(10.0), 30.0);
    }

    #[test]
    fn attenuation_clamps_to_unity_at_close_range() {
        let m = model(AcousticParameters::default());
        assert_eq!(m.distance_attenuation(0.0), 1.0);
        assert_eq!(m.distance_attenuation(0.5), 1.0);
    }

    #[test]
    fn attenuation_decreases_with_distance() {
        let m = model(AcousticParameters::default());
        let near = m.distance_attenuation(5.0);
        let mid = m.distance_attenuation(20.0);
        let far = m.distance_attenuation(80.0);
        assert!(near > mid && mid > far);
        assert!(far > 0.0);
    }

    #[test]
    fn attenuation_scales_with_distance_scale() {
        let half = model(AcousticParameters {
            distance_scale: 1.0,
            ..Default::default()
        });
        let full = model(AcousticParameters::default());
        let d = 25.0;
        let ratio = full.distance_attenuation(d) / half.distance_attenuation(d);
        assert!((ratio - 2.0).abs() < 1e-4);

        let off = model(AcousticParameters {
            distance_scale: 0.0,
            ..Default::default()
        });
        assert_eq!(off.distance_attenuation(d), 0.0);
    }

    #[test]
    fn bounce_attenuation_is_reflective_power() {
        let m = model(AcousticParameters::default());
        assert_eq!(m.bounce_attenuation(0), 1.0);
        assert_eq!(m.bounce_attenuation(1), 0.75);
        assert!((m.bounce_attenuation(3) - 0.421875).abs() < 1e-6);
    }

    #[test]
    fn surface_split_sums_to_one() {
        let m = model(AcousticParameters::default());
        let s = m.surface(0);
        assert_eq!(s.absorption, 0.125);
        assert_eq!(s.diffusion, 0.125);
        assert!((s.reflective + s.absorption + s.diffusion - 1.0).abs() < 1e-6);
    }

    #[test]
    fn construction_rejects_invalid_parameters() {
        let bad = AcousticParameters {
            absorption_ratio: 0.9,
            diffusion_ratio: 0.9,
            ..Default::default()
        };
        assert!(AcousticModel::new(bad).is_err());
    }
}
