//! Math types and ray geometry for EchoSonic

use crate::scene::BoxFace;
use rand::Rng;

pub use glam::{Quat, Vec3};

/// Position and orientation of the listener, as sampled from the avatar.
///
/// `orientation` is the avatar body orientation; `head_orientation` follows
/// the head independently. Which one seeds the trace is a parameter choice,
/// as is whether the true ear positions or the head center feed the per-ear
/// distance math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerPose {
    pub position: Vec3,
    pub orientation: Quat,
    pub head_orientation: Quat,
    pub left_ear: Vec3,
    pub right_ear: Vec3,
}

impl ListenerPose {
    pub fn new(
        position: Vec3,
        orientation: Quat,
        head_orientation: Quat,
        left_ear: Vec3,
        right_ear: Vec3,
    ) -> Self {
        Self {
            position,
            orientation,
            head_orientation,
            left_ear,
            right_ear,
        }
    }

    /// Pose at a position with identity orientation and both ears at the
    /// head center.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            head_orientation: Quat::IDENTITY,
            left_ear: position,
            right_ear: position,
        }
    }

    /// Orientation that seeds the trace.
    pub fn tracing_orientation(&self, head_oriented: bool) -> Quat {
        if head_oriented {
            self.head_orientation
        } else {
            self.orientation
        }
    }

    /// Whether this pose is close enough to `other` that a cached trace
    /// remains valid. `position_epsilon` is in meters; `orientation_dot_min`
    /// is the minimum absolute quaternion dot product.
    pub fn is_near(&self, other: &Self, position_epsilon: f32, orientation_dot_min: f32) -> bool {
        self.position.distance(other.position) <= position_epsilon
            && self.left_ear.distance(other.left_ear) <= position_epsilon
            && self.right_ear.distance(other.right_ear) <= position_epsilon
            && self.orientation.dot(other.orientation).abs() >= orientation_dot_min
            && self
                .head_orientation
                .dot(other.head_orientation)
                .abs()
                >= orientation_dot_min
    }
}

impl Default for ListenerPose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// The 14 seed directions fired from the listener each trace: the 6 axial
/// directions of the given orientation plus the 8 normalized corner
/// diagonals.
pub fn seed_directions(orientation: Quat) -> [Vec3; 14] {
    let right = (orientation * Vec3::X).normalize();
    let up = (orientation * Vec3::Y).normalize();
    let front = (orientation * -Vec3::Z).normalize();
    let left = -right;
    let down = -up;
    let back = -front;

    [
        right,
        left,
        up,
        down,
        front,
        back,
        (front + right + up).normalize(),
        (front + left + up).normalize(),
        (back + right + up).normalize(),
        (back + left + up).normalize(),
        (front + right + down).normalize(),
        (front + left + down).normalize(),
        (back + right + down).normalize(),
        (back + left + down).normalize(),
    ]
}

/// Specular reflection of `direction` about `normal`, renormalized.
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    (direction - 2.0 * direction.dot(normal) * normal).normalize()
}

/// Unit direction biased toward a face normal: the component along the face
/// axis is drawn from `[principal_min, 1]` (signed like the face normal),
/// and the two tangential components each get `(1 - principal) / 2` with a
/// random sign.
///
/// With `principal_min` close to 1 this models a slightly imperfect surface
/// normal; with `principal_min = 0.5` it samples the scatter hemisphere for
/// diffusion children.
pub fn face_biased_direction<R: Rng>(face: BoxFace, principal_min: f32, rng: &mut R) -> Vec3 {
    let principal = rng.gen_range(principal_min..=1.0f32);
    let tangential = (1.0 - principal) / 2.0;
    let t0 = if rng.gen_bool(0.5) { tangential } else { -tangential };
    let t1 = if rng.gen_bool(0.5) { tangential } else { -tangential };

    let v = match face {
        BoxFace::MinX => Vec3::new(-principal, t0, t1),
        BoxFace::MaxX => Vec3::new(principal, t0, t1),
        BoxFace::MinY => Vec3::new(t0, -principal, t1),
        BoxFace::MaxY => Vec3::new(t0, principal, t1),
        BoxFace::MinZ => Vec3::new(t0, t1, -principal),
        BoxFace::MaxZ => Vec3::new(t0, t1, principal),
    };
    v.normalize()
}

const JITTER_PRINCIPAL_MIN: f32 = 0.99;

/// Face normal with a small random perturbation.
pub fn jittered_normal<R: Rng>(face: BoxFace, rng: &mut R) -> Vec3 {
    face_biased_direction(face, JITTER_PRINCIPAL_MIN, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn fourteen_unit_seed_directions() {
        let dirs = seed_directions(Quat::IDENTITY);
        assert_eq!(dirs.len(), 14);
        for dir in dirs {
            assert!(close(dir.length(), 1.0));
        }
        // axial set is exactly the coordinate axes for the identity
        assert_eq!(dirs[0], Vec3::X);
        assert_eq!(dirs[1], -Vec3::X);
        assert_eq!(dirs[2], Vec3::Y);
        assert_eq!(dirs[4], -Vec3::Z);
        // a corner diagonal mixes one of each axis pair
        let fru = dirs[6];
        assert!(fru.x > 0.0 && fru.y > 0.0 && fru.z < 0.0);
        assert!(close(fru.x.abs(), 1.0 / 3.0f32.sqrt()));
    }

    #[test]
    fn seed_directions_follow_orientation() {
        let quarter = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let dirs = seed_directions(quarter);
        // rotating +90 degrees about Y carries "right" (+X) to -Z
        assert!(dirs[0].distance(-Vec3::Z) < 1e-5);
        // and "front" (-Z) to -X
        assert!(dirs[4].distance(-Vec3::X) < 1e-5);
    }

    #[test]
    fn reflection_reverses_normal_component() {
        let out = reflect(Vec3::new(1.0, -1.0, 0.0).normalize(), Vec3::Y);
        assert!(out.distance(Vec3::new(1.0, 1.0, 0.0).normalize()) < 1e-5);
        // head-on reflection comes straight back
        let back = reflect(Vec3::X, Vec3::new(-1.0, 0.0, 0.0));
        assert!(back.distance(-Vec3::X) < 1e-5);
    }

    #[test]
    fn jittered_normal_stays_near_face_normal() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let n = jittered_normal(BoxFace::MaxY, &mut rng);
            assert!(close(n.length(), 1.0));
            assert!(n.y > 0.98);
            assert!(n.x.abs() <= 0.01 && n.z.abs() <= 0.01);
        }
    }

    #[test]
    fn scatter_directions_stay_in_face_hemisphere() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = face_biased_direction(BoxFace::MinZ, 0.5, &mut rng);
            assert!(close(d.length(), 1.0));
            assert!(d.z < 0.0);
            // principal component dominates both tangentials
            assert!(d.z.abs() > d.x.abs() && d.z.abs() > d.y.abs());
        }
    }

    #[test]
    fn pose_similarity_thresholds() {
        let a = ListenerPose::at(Vec3::ZERO);
        let mut b = a;
        assert!(a.is_near(&b, 0.01, 0.9999));

        b.position = Vec3::new(0.005, 0.0, 0.0);
        assert!(a.is_near(&b, 0.01, 0.9999));

        b.position = Vec3::new(0.02, 0.0, 0.0);
        assert!(!a.is_near(&b, 0.01, 0.9999));

        let mut c = a;
        c.orientation = Quat::from_rotation_y(0.1);
        assert!(!a.is_near(&c, 0.01, 0.9999));

        let mut d = a;
        d.left_ear = Vec3::new(0.0, 0.0, 0.05);
        assert!(!a.is_near(&d, 0.01, 0.9999));
    }
}
