//! Arena geometry known to the core: circular obstacles on the ground plane.

use bevy::prelude::*;

use super::movement::planar;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Obstacle {
    /// Stable id, reported back in `ObstacleCollision`
    pub id: u32,
    pub center: Vec3,
    pub radius: f32,
}

/// Known arena obstacles (pillars, rocks). Used by pull routing and by the
/// headless collision layer.
#[derive(Resource, Debug, Clone, Default)]
pub struct ArenaObstacles {
    pub obstacles: Vec<Obstacle>,
}

impl ArenaObstacles {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// First obstacle (closest to `from`) whose inflated circle the segment crosses.
    pub fn first_blocking(&self, from: Vec3, to: Vec3, margin: f32) -> Option<&Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| segment_distance(from, to, o.center) < o.radius + margin)
            .min_by(|a, b| {
                let da = planar(a.center - from).length_squared();
                let db = planar(b.center - from).length_squared();
                da.total_cmp(&db)
            })
    }

    /// Obstacles overlapping a circle of `radius` at `position`.
    pub fn overlapping(&self, position: Vec3, radius: f32) -> impl Iterator<Item = &Obstacle> {
        self.obstacles
            .iter()
            .filter(move |o| planar(o.center - position).length() < o.radius + radius)
    }
}

/// Planar distance from `point` to segment `a..b`.
pub fn segment_distance(a: Vec3, b: Vec3, point: Vec3) -> f32 {
    planar(point - closest_on_segment(a, b, point)).length()
}

pub fn closest_on_segment(a: Vec3, b: Vec3, point: Vec3) -> Vec3 {
    let ab = planar(b - a);
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = (planar(point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + (b - a) * t
}
