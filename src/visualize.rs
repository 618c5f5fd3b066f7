//! Reflection-path drawing against an abstract line-segment consumer.

use crate::math::Vec3;
use crate::trace::TraceResult;

/// Color fade applied after each bounce along a drawn path.
pub const COLOR_FADE_PER_BOUNCE: f32 = 0.75;

/// One fixed color per seed direction, in seed order; diffusion children
/// reuse the palette cyclically.
const SEED_COLORS: [Vec3; 14] = [
    Vec3::new(0.8, 0.2, 0.8), // right
    Vec3::new(0.2, 0.8, 0.8), // left
    Vec3::new(0.8, 0.8, 0.2), // up
    Vec3::new(0.5, 0.5, 0.5), // down
    Vec3::new(0.2, 0.8, 0.2), // front
    Vec3::new(0.2, 0.2, 0.8), // back
    Vec3::new(1.0, 0.0, 0.0), // front right up
    Vec3::new(0.0, 1.0, 0.0), // front left up
    Vec3::new(0.0, 0.0, 1.0), // back right up
    Vec3::new(0.0, 1.0, 1.0), // back left up
    Vec3::new(1.0, 0.0, 1.0), // front right down
    Vec3::new(1.0, 1.0, 0.0), // front left down
    Vec3::new(1.0, 1.0, 1.0), // back right down
    Vec3::new(0.8, 0.2, 0.2), // back left down
];

/// Consumer of colored line segments, implemented by the host renderer.
pub trait PathVisualizer {
    fn draw_segment(&mut self, start: Vec3, end: Vec3, color: Vec3);
}

/// Walks every finished path as a polyline from its seed origin through its
/// reflection points, fading the color at each bounce.
pub fn draw_paths(result: &TraceResult, visualizer: &mut dyn PathVisualizer) {
    for (index, path) in result.paths.iter().enumerate() {
        let mut color = SEED_COLORS[index % SEED_COLORS.len()];
        let mut start = path.seed_origin;
        for &end in &path.reflections {
            visualizer.draw_segment(start, end, color);
            color *= COLOR_FADE_PER_BOUNCE;
            start = end;
        }
    }
}
