//! Coordinator between the listener pose, the reflection engine, and the
//! sample injector.
//!
//! The controller caches the pose a trace was run from and only retraces
//! when the listener has moved enough for the cached result to go stale.
//! Audio batches arrive on the ingest thread and are injected against the
//! current result under one mutex; trace publication takes the same mutex,
//! so the injector never sees a half-written result.

use crate::acoustics::AcousticModel;
use crate::config::AcousticParameters;
use crate::error::Result;
use crate::events::EchoSonicEvent;
use crate::inject::{SampleInjector, SpatialMixSink};
use crate::math::ListenerPose;
use crate::scene::RayHitOracle;
use crate::trace::{self, ReflectionStats, TraceResult};
use crate::visualize::{self, PathVisualizer};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

/// Listener movement below this (meters) keeps a cached trace valid.
pub const POSITION_EPSILON: f32 = 0.01;
/// Orientation quaternion dot product above this keeps a cached trace valid.
pub const ORIENTATION_DOT_MIN: f32 = 0.9999;

struct TraceSnapshot {
    pose: ListenerPose,
    with_diffusion: bool,
}

struct Shared {
    model: AcousticModel,
    rng: SmallRng,
    result: TraceResult,
    stats: ReflectionStats,
    traced: Option<TraceSnapshot>,
}

pub struct ReverbController {
    oracle: Arc<dyn RayHitOracle>,
    sink: Arc<dyn SpatialMixSink>,
    injector: SampleInjector,
    shared: Mutex<Shared>,
    event_sender: Sender<EchoSonicEvent>,
    event_receiver: Receiver<EchoSonicEvent>,
}

impl ReverbController {
    /// Creates a controller with an entropy-seeded RNG.
    pub fn new(
        oracle: Arc<dyn RayHitOracle>,
        sink: Arc<dyn SpatialMixSink>,
        params: AcousticParameters,
        sample_rate: u32,
    ) -> Result<Self> {
        Self::build(oracle, sink, params, sample_rate, SmallRng::from_entropy())
    }

    /// Creates a controller with a fixed RNG seed, so identical poses and
    /// parameters reproduce identical traces.
    pub fn with_seed(
        oracle: Arc<dyn RayHitOracle>,
        sink: Arc<dyn SpatialMixSink>,
        params: AcousticParameters,
        sample_rate: u32,
        seed: u64,
    ) -> Result<Self> {
        Self::build(
            oracle,
            sink,
            params,
            sample_rate,
            SmallRng::seed_from_u64(seed),
        )
    }

    fn build(
        oracle: Arc<dyn RayHitOracle>,
        sink: Arc<dyn SpatialMixSink>,
        params: AcousticParameters,
        sample_rate: u32,
        rng: SmallRng,
    ) -> Result<Self> {
        let model = AcousticModel::new(params)?;
        let (event_sender, event_receiver) = unbounded();
        Ok(Self {
            oracle,
            sink,
            injector: SampleInjector::new(sample_rate),
            shared: Mutex::new(Shared {
                model,
                rng,
                result: TraceResult::empty(),
                stats: ReflectionStats::default(),
                traced: None,
            }),
            event_sender,
            event_receiver,
        })
    }

    /// Replaces the parameter set. Invalid sets are rejected without
    /// touching the current one.
    pub fn set_parameters(&self, params: AcousticParameters) -> Result<()> {
        let model = AcousticModel::new(params)?;
        if let Ok(mut shared) = self.shared.lock() {
            shared.model = model;
        }
        Ok(())
    }

    /// Render-tick entry point: retraces if the cached result has gone
    /// stale for this pose, publishing the replacement atomically. Returns
    /// whether a retrace ran.
    pub fn render(&self, pose: &ListenerPose) -> bool {
        let Ok(mut shared) = self.shared.lock() else {
            log::error!("reflection state poisoned; skipping render tick");
            return false;
        };

        let with_diffusion = shared.model.params().with_diffusion;
        let stale = match &shared.traced {
            None => true,
            Some(snapshot) => {
                snapshot.with_diffusion != with_diffusion
                    || !snapshot
                        .pose
                        .is_near(pose, POSITION_EPSILON, ORIENTATION_DOT_MIN)
            }
        };
        if !stale {
            return false;
        }

        let shared = &mut *shared;
        let result = trace::trace(&shared.model, self.oracle.as_ref(), pose, &mut shared.rng);
        shared.stats = ReflectionStats::from_result(&result);
        log::debug!(
            "retraced: {} audible points over {} paths ({} truncated)",
            result.audible_points.len(),
            result.paths.len(),
            result.truncated_paths
        );
        if result.truncated_paths > 0 {
            let _ = self.event_sender.send(EchoSonicEvent::TraceTruncated {
                skipped_paths: result.truncated_paths,
            });
        }
        let _ = self.event_sender.send(EchoSonicEvent::TraceCompleted {
            audible_points: result.audible_points.len(),
            paths: result.paths.len(),
        });
        shared.result = result;
        shared.traced = Some(TraceSnapshot {
            pose: *pose,
            with_diffusion,
        });
        true
    }

    /// Audio-ingest entry point: validates the raw batch and injects it
    /// against the current trace result. Runs on the audio callback thread;
    /// if the trace state is busy the batch degrades to silence rather than
    /// blocking the callback.
    pub fn add_samples(&self, bytes: &[u8], sample_time: u64) -> Result<()> {
        let samples = SampleInjector::decode_batch(bytes)?;

        let Ok(mut shared) = self.shared.try_lock() else {
            log::warn!("trace state busy; dropping audio batch");
            return Ok(());
        };
        let Some(pose) = shared.traced.as_ref().map(|snapshot| snapshot.pose) else {
            return Ok(());
        };

        if !shared.model.params().with_diffusion {
            shared.stats = ReflectionStats::from_result(&shared.result);
        }

        self.injector.inject(
            &shared.model,
            &shared.result.audible_points,
            &pose,
            &samples,
            sample_time,
            self.sink.as_ref(),
        )
    }

    /// Aggregate statistics over the current trace result.
    pub fn stats(&self) -> ReflectionStats {
        self.shared
            .lock()
            .map(|shared| shared.stats)
            .unwrap_or_default()
    }

    /// Draws the current reflection paths into the given visualizer.
    pub fn draw_paths(&self, visualizer: &mut dyn PathVisualizer) {
        if let Ok(shared) = self.shared.lock() {
            visualize::draw_paths(&shared.result, visualizer);
        }
    }

    /// Receiver for trace lifecycle events.
    pub fn event_receiver(&self) -> &Receiver<EchoSonicEvent> {
        &self.event_receiver
    }
}
