//! Per-ear delayed sample injection into the downstream spatial mixer.
//!
//! For every audible point the trace produced and every inbound PCM batch,
//! the injector writes one left-ear and one right-ear contribution: the
//! input scaled by the ear's total attenuation, isolated to that ear's
//! stereo channel, and anchored at the batch time plus the ear's total
//! delay converted to samples.

use crate::acoustics::AcousticModel;
use crate::error::{EchoSonicError, Result};
use crate::math::{ListenerPose, Vec3};
use crate::trace::AudiblePoint;

/// Inbound and outbound PCM is interleaved stereo.
pub const CHANNELS: usize = 2;

/// Downstream mixer accepting delayed stereo contributions.
///
/// The anchor is measured in the sink's own sample clock; the sink mixes
/// each contribution into the right playback offset. Implementations must
/// tolerate submissions from the audio-ingest thread and must not assume
/// the left and right submissions of one contribution arrive paired.
pub trait SpatialMixSink: Send + Sync {
    fn add_spatial_audio_to_buffer(&self, sample_time: u64, samples: &[i16]);
}

/// Produces the delayed, attenuated per-ear mix for a trace result.
#[derive(Debug, Clone)]
pub struct SampleInjector {
    sample_rate: u32,
}

impl SampleInjector {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Validates and decodes a raw little-endian batch into i16 samples.
    /// Batches that are not whole stereo i16 frames are rejected outright;
    /// nothing is partially mixed.
    pub fn decode_batch(bytes: &[u8]) -> Result<Vec<i16>> {
        let frame_bytes = CHANNELS * std::mem::size_of::<i16>();
        if bytes.is_empty() || bytes.len() % frame_bytes != 0 {
            return Err(EchoSonicError::InvalidBatch(format!(
                "batch of {} bytes is not a whole number of stereo frames",
                bytes.len()
            )));
        }
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    /// Injects one batch against every audible point, submitting a left and
    /// a right contribution per point to the sink.
    pub fn inject(
        &self,
        model: &AcousticModel,
        points: &[AudiblePoint],
        pose: &ListenerPose,
        samples: &[i16],
        sample_time: u64,
        sink: &dyn SpatialMixSink,
    ) -> Result<()> {
        if samples.len() % CHANNELS != 0 {
            return Err(EchoSonicError::InvalidBatch(format!(
                "{} samples is not a whole number of stereo frames",
                samples.len()
            )));
        }

        let (left_ear, right_ear) = if model.params().separate_ears {
            (pose.left_ear, pose.right_ear)
        } else {
            (pose.position, pose.position)
        };
        let stereo_source = model.params().stereo_source;
        let frames = samples.len() / CHANNELS;

        let mut left_out = vec![0i16; samples.len()];
        let mut right_out = vec![0i16; samples.len()];

        for point in points {
            let left = ear_mix(model, point, left_ear);
            let right = ear_mix(model, point, right_ear);

            left_out.fill(0);
            right_out.fill(0);
            for frame in 0..frames {
                let left_sample = samples[frame * CHANNELS];
                let right_sample = if stereo_source {
                    samples[frame * CHANNELS + 1]
                } else {
                    left_sample
                };
                left_out[frame * CHANNELS] = (left_sample as f32 * left.attenuation) as i16;
                right_out[frame * CHANNELS + 1] = (right_sample as f32 * right.attenuation) as i16;
            }

            sink.add_spatial_audio_to_buffer(
                sample_time + self.delay_samples(left.delay_ms),
                &left_out,
            );
            sink.add_spatial_audio_to_buffer(
                sample_time + self.delay_samples(right.delay_ms),
                &right_out,
            );
        }

        Ok(())
    }

    fn delay_samples(&self, delay_ms: f32) -> u64 {
        (delay_ms * self.sample_rate as f32 / 1000.0).round() as u64
    }
}

struct EarMix {
    delay_ms: f32,
    attenuation: f32,
}

fn ear_mix(model: &AcousticModel, point: &AudiblePoint, ear: Vec3) -> EarMix {
    let ear_distance = point.location.distance(ear);
    EarMix {
        delay_ms: model.delay_from_distance(ear_distance) + point.delay_ms,
        attenuation: point.attenuation
            * model.distance_attenuation(ear_distance + point.path_distance),
    }
}
