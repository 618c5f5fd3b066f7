//! EchoSonic - early acoustic reflections for voxel worlds
//!
//! EchoSonic fires probe rays from the listener, bounces them off voxel
//! surfaces supplied by a host [`RayHitOracle`], expands scattered
//! diffusion energy at each bounce, and injects delayed, attenuated
//! per-ear PCM into a downstream [`SpatialMixSink`].

pub mod acoustics;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod inject;
pub mod math;
pub mod scene;
pub mod trace;
pub mod visualize;

pub use acoustics::{AcousticModel, SurfaceResponse};
pub use config::AcousticParameters;
pub use controller::ReverbController;
pub use error::{EchoSonicError, Result};
pub use events::EchoSonicEvent;
pub use inject::{SampleInjector, SpatialMixSink};
pub use math::ListenerPose;
pub use scene::{BoxFace, ElementId, RayHit, RayHitOracle};
pub use trace::{AudiblePoint, PathState, ReflectionStats, TraceResult};
pub use visualize::PathVisualizer;
