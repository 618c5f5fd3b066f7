//! Single-bounce-chain strategy: one specular reflection sequence per seed
//! direction, no scattered energy.

use super::{AudiblePoint, PathState, TraceResult, MAX_BOUNCES, MAX_DELAY_MS, MIN_ATTENUATION,
    SLIGHTLY_SHORT};
use crate::acoustics::AcousticModel;
use crate::math::{self, Quat, Vec3};
use crate::scene::RayHitOracle;
use rand::rngs::SmallRng;

pub(crate) fn trace_chains(
    model: &AcousticModel,
    oracle: &dyn RayHitOracle,
    origin: Vec3,
    orientation: Quat,
    rng: &mut SmallRng,
) -> TraceResult {
    let mut result = TraceResult::empty();
    result.origin = origin;
    let jitter = model.params().jitter_normals;

    for seed_direction in math::seed_directions(orientation) {
        let mut path = PathState::seed(origin, seed_direction, 0.0);
        let mut start = origin;
        let mut direction = seed_direction;
        let mut path_distance = 0.0f32;

        while path.bounce_depth < MAX_BOUNCES {
            let Some(hit) = oracle.intersect(start, direction) else {
                break;
            };
            let end = start + direction * (hit.distance * SLIGHTLY_SHORT);
            path_distance += start.distance(end);
            let ear_distance = end.distance(origin);
            let bounce = path.bounce_depth + 1;

            let total_delay = model.chain_delay(ear_distance + path_distance);
            let attenuation = model.distance_attenuation(ear_distance + path_distance)
                * model.bounce_attenuation(bounce);
            if attenuation <= MIN_ATTENUATION || total_delay >= MAX_DELAY_MS {
                break;
            }

            result.audible_points.push(AudiblePoint {
                location: end,
                delay_ms: model.chain_delay(path_distance),
                attenuation: model.bounce_attenuation(bounce),
                path_distance,
            });
            path.reflections.push(end);
            path.bounce_depth = bounce;
            path.delay_ms = model.chain_delay(path_distance);
            path.attenuation = attenuation;
            path.distance = path_distance;

            let normal = if jitter {
                math::jittered_normal(hit.face, rng)
            } else {
                hit.face.normal()
            };
            direction = math::reflect(direction, normal);
            start = end;
        }

        path.origin = start;
        path.direction = direction;
        path.terminated = true;
        result.paths.push(path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AcousticParameters;
    use crate::scene::{BoxFace, RayHit};
    use rand::SeedableRng;

    // Finite wall patch on the plane x = wall_x, facing the origin
    struct WallOracle {
        wall_x: f32,
        half_patch: f32,
    }

    impl RayHitOracle for WallOracle {
        fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
            if direction.x <= 1e-6 {
                return None;
            }
            let t = (self.wall_x - origin.x) / direction.x;
            if t <= 0.0 {
                return None;
            }
            let at = origin + direction * t;
            if at.y.abs() > self.half_patch || at.z.abs() > self.half_patch {
                return None;
            }
            Some(RayHit::new(t, BoxFace::MinX, 1))
        }
    }

    // Two facing wall patches at x = +/-3; traps the axial +/-X seeds in a
    // ping-pong chain and misses every other seed.
    struct Corridor;

    impl RayHitOracle for Corridor {
        fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
            if direction.x.abs() <= 1e-6 {
                return None;
            }
            let (wall, face) = if direction.x > 0.0 {
                (3.0, BoxFace::MinX)
            } else {
                (-3.0, BoxFace::MaxX)
            };
            let t = (wall - origin.x) / direction.x;
            if t <= 0.0 {
                return None;
            }
            let at = origin + direction * t;
            if at.y.abs() > 1.0 || at.z.abs() > 1.0 {
                return None;
            }
            Some(RayHit::new(t, face, 1))
        }
    }

    fn chain_params() -> AcousticParameters {
        AcousticParameters {
            with_diffusion: false,
            absorption_ratio: 0.0,
            diffusion_ratio: 0.0,
            jitter_normals: false,
            ..Default::default()
        }
    }

    #[test]
    fn no_world_means_no_reflections() {
        struct Empty;
        impl RayHitOracle for Empty {
            fn intersect(&self, _: Vec3, _: Vec3) -> Option<RayHit> {
                None
            }
        }
        let model = AcousticModel::new(chain_params()).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = trace_chains(&model, &Empty, Vec3::ZERO, Quat::IDENTITY, &mut rng);
        assert_eq!(result.paths.len(), 14);
        assert!(result.audible_points.is_empty());
        assert!(result.paths.iter().all(|p| p.terminated));
        assert!(result.paths.iter().all(|p| p.bounce_depth == 0));
    }

    #[test]
    fn single_wall_yields_one_bounce_on_the_right_seed() {
        let oracle = WallOracle {
            wall_x: 10.0,
            half_patch: 1.0,
        };
        let model = AcousticModel::new(chain_params()).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = trace_chains(&model, &oracle, Vec3::ZERO, Quat::IDENTITY, &mut rng);

        assert_eq!(result.audible_points.len(), 1);
        let point = &result.audible_points[0];
        assert!(point.location.distance(Vec3::new(9.99, 0.0, 0.0)) < 1e-3);
        assert!((point.path_distance - 9.99).abs() < 1e-3);
        // 3 ms/m over 9.99 m plus the 20 ms pre-delay
        assert!((point.delay_ms - 49.97).abs() < 1e-2);
        assert_eq!(point.attenuation, 1.0);

        // the reflected ray leaves the wall and never returns
        let right_chain = &result.paths[0];
        assert_eq!(right_chain.reflections.len(), 1);
        assert!(right_chain.direction.x < 0.0);
    }

    #[test]
    fn chain_length_never_exceeds_bounce_ceiling() {
        let model = AcousticModel::new(chain_params()).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = trace_chains(&model, &Corridor, Vec3::ZERO, Quat::IDENTITY, &mut rng);
        for path in &result.paths {
            assert!(path.reflections.len() as u32 <= MAX_BOUNCES);
            assert!(path.bounce_depth <= MAX_BOUNCES);
        }
        // the two trapped seeds both run out the full ceiling
        assert_eq!(result.paths[0].reflections.len() as u32, MAX_BOUNCES);
        assert_eq!(result.paths[1].reflections.len() as u32, MAX_BOUNCES);
        // nothing else hits
        assert_eq!(result.audible_points.len(), 2 * MAX_BOUNCES as usize);
    }

    #[test]
    fn attenuation_gate_terminates_lossy_chains() {
        let params = AcousticParameters {
            with_diffusion: false,
            absorption_ratio: 0.5,
            diffusion_ratio: 0.0,
            jitter_normals: false,
            ..Default::default()
        };
        let model = AcousticModel::new(params).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = trace_chains(&model, &Corridor, Vec3::ZERO, Quat::IDENTITY, &mut rng);

        // 0.5^n falls through 1/256 well before the bounce ceiling
        let trapped = &result.paths[0];
        assert!(!trapped.reflections.is_empty());
        assert!((trapped.reflections.len() as u32) < MAX_BOUNCES);

        // emitted attenuation decreases monotonically along the first chain
        let first_chain = &result.audible_points[..trapped.reflections.len()];
        for pair in first_chain.windows(2) {
            assert!(pair[0].attenuation >= pair[1].attenuation);
        }
    }
}
