//! Waypoint routing around circular arena obstacles.

use bevy::prelude::*;

use crate::components::{closest_on_segment, planar, ArenaObstacles, Obstacle};

/// Upper bound on detours per route (keeps planning bounded).
const MAX_DETOURS: usize = 4;

/// Path from `from` to `goal`: zero or more detour waypoints, then `goal`.
pub fn plan_route(from: Vec3, goal: Vec3, obstacles: &ArenaObstacles, margin: f32) -> Vec<Vec3> {
    let mut path = Vec::new();
    let mut cursor = from;

    for _ in 0..MAX_DETOURS {
        let Some(obstacle) = obstacles.first_blocking(cursor, goal, margin) else {
            break;
        };
        let detour = detour_point(cursor, goal, obstacle, margin);
        path.push(detour);
        cursor = detour;
    }

    path.push(goal);
    path
}

/// Point beside `obstacle`, on the side the straight line passes closest.
fn detour_point(from: Vec3, goal: Vec3, obstacle: &Obstacle, margin: f32) -> Vec3 {
    let closest = closest_on_segment(from, goal, obstacle.center);
    let mut side = planar(closest - obstacle.center);

    // Линия проходит ровно через центр: обходим слева
    if side.length_squared() <= f32::EPSILON {
        let heading = planar(goal - from).normalize_or_zero();
        side = Vec3::new(-heading.z, 0.0, heading.x);
    }

    let offset = side.normalize_or_zero() * (obstacle.radius + margin * 2.0);
    Vec3::new(obstacle.center.x + offset.x, from.y, obstacle.center.z + offset.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unobstructed_route_is_straight() {
        let goal = Vec3::new(20.0, 0.0, 0.0);
        let path = plan_route(Vec3::ZERO, goal, &ArenaObstacles::default(), 1.0);
        assert_eq!(path, vec![goal]);
    }

    #[test]
    fn test_route_detours_around_pillar() {
        let arena = ArenaObstacles::new(vec![Obstacle {
            id: 3,
            center: Vec3::new(10.0, 0.0, 0.5),
            radius: 2.0,
        }]);
        let goal = Vec3::new(20.0, 0.0, 0.0);

        let path = plan_route(Vec3::ZERO, goal, &arena, 1.0);

        assert!(path.len() >= 2);
        assert_eq!(path.last().copied(), Some(goal));
        // Обход со стороны, где линия ближе к краю (z < 0.5)
        let detour = path[0];
        assert!(detour.z < 0.0);
        assert!(planar(detour - arena.obstacles[0].center).length() > 2.0);
    }
}
