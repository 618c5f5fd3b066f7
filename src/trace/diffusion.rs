//! Diffusion strategy: every bounce splits the surviving energy into a
//! specular continuation plus scattered child rays, and emits an audible
//! point whenever enough energy would reach the listener.

use super::{AudiblePoint, PathState, TraceResult, MAX_ACTIVE_PATHS, MAX_BOUNCES, MAX_DELAY_MS,
    MIN_ATTENUATION, SLIGHTLY_SHORT};
use crate::acoustics::AcousticModel;
use crate::math::{self, Quat, Vec3};
use crate::scene::RayHitOracle;
use rand::rngs::SmallRng;

/// Principal-component floor for scattered child directions.
const SCATTER_PRINCIPAL_MIN: f32 = 0.5;

pub(crate) fn trace_diffusion(
    model: &AcousticModel,
    oracle: &dyn RayHitOracle,
    origin: Vec3,
    orientation: Quat,
    rng: &mut SmallRng,
) -> TraceResult {
    let params = *model.params();
    let seed_delay = if params.pre_delay_enabled() {
        params.pre_delay_ms
    } else {
        0.0
    };

    let mut paths: Vec<PathState> = math::seed_directions(orientation)
        .into_iter()
        .map(|direction| PathState::seed(origin, direction, seed_delay))
        .collect();
    let mut audible_points = Vec::new();
    let mut truncated_paths = 0usize;

    // Every tick advances each live path by one bounce; children spawned
    // during a tick join the sweep on the next one.
    while paths.iter().any(|p| !p.terminated) {
        let mut spawned = Vec::new();
        let path_count = paths.len();

        for i in 0..path_count {
            if paths[i].terminated {
                continue;
            }
            let path = &mut paths[i];
            if path.bounce_depth >= MAX_BOUNCES {
                path.terminated = true;
                continue;
            }
            let Some(hit) = oracle.intersect(path.origin, path.direction) else {
                path.terminated = true;
                continue;
            };

            let end = path.origin + path.direction * (hit.distance * SLIGHTLY_SHORT);
            let segment = path.origin.distance(end);
            let distance = path.distance + segment;
            let to_listener = end.distance(origin);
            let delay = path.delay_ms + model.delay_from_distance(segment);
            let total_delay = delay + model.delay_from_distance(to_listener);
            let to_listener_attenuation = model.distance_attenuation(to_listener + distance);

            let surface = model.surface(hit.element);
            let reflective_attenuation = path.attenuation * surface.reflective;
            let diffusion_total = path.attenuation * surface.diffusion;
            let diffusion_each = if params.diffusion_fanout >= 1 {
                diffusion_total / params.diffusion_fanout as f32
            } else {
                0.0
            };

            // scatter children into the hit-face hemisphere
            if params.diffusion_fanout >= 1
                && diffusion_each * to_listener_attenuation > MIN_ATTENUATION
                && total_delay < MAX_DELAY_MS
            {
                let room = path_count + spawned.len() + params.diffusion_fanout as usize
                    <= MAX_ACTIVE_PATHS;
                if room {
                    for _ in 0..params.diffusion_fanout {
                        let direction =
                            math::face_biased_direction(hit.face, SCATTER_PRINCIPAL_MIN, rng);
                        spawned.push(PathState::child(
                            end,
                            direction,
                            delay,
                            diffusion_each,
                            distance,
                        ));
                    }
                } else {
                    truncated_paths += params.diffusion_fanout as usize;
                }
            }

            // emit the audible point for this bounce
            if (reflective_attenuation + diffusion_total) * to_listener_attenuation
                > MIN_ATTENUATION
                && total_delay < MAX_DELAY_MS
            {
                audible_points.push(AudiblePoint {
                    location: end,
                    delay_ms: delay,
                    attenuation: reflective_attenuation + diffusion_total,
                    path_distance: distance,
                });
                path.reflections.push(end);
            }

            // specular continuation or termination
            if reflective_attenuation * to_listener_attenuation > MIN_ATTENUATION {
                let normal = if params.jitter_normals {
                    math::jittered_normal(hit.face, rng)
                } else {
                    hit.face.normal()
                };
                path.origin = end;
                path.direction = math::reflect(path.direction, normal);
                path.delay_ms = delay;
                path.attenuation = reflective_attenuation;
                path.distance = distance;
                path.bounce_depth += 1;
            } else {
                path.terminated = true;
            }
        }

        paths.extend(spawned);
    }

    if truncated_paths > 0 {
        log::warn!(
            "diffusion trace hit the {} active-path ceiling, {} children skipped",
            MAX_ACTIVE_PATHS,
            truncated_paths
        );
    }

    TraceResult {
        origin,
        audible_points,
        paths,
        truncated_paths,
    }
}
