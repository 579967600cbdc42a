//! Movement компоненты: команды перемещения, ручки скорости, навигация

use bevy::prelude::*;

/// Команда движения для босса (выполняется navigation collaborator)
///
/// Архитектура:
/// - Routine пишет MovementCommand (high-level intent)
/// - Engine bridge (или `HeadlessMotionPlugin`) читает и двигает тело
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub enum MovementCommand {
    /// Стоять на месте (не трогать navigation target)
    #[default]
    Idle,
    /// Двигаться к позиции; `speed_scale` < 1 замедляет подход
    MoveToPosition { target: Vec3, speed_scale: f32 },
    /// Развернуться на месте к точке
    FaceTowards { point: Vec3 },
    /// Рывок с непрерывной коррекцией курса к точке (steerable charge)
    SteerTo { destination: Vec3 },
    /// Рывок по зафиксированному направлению, без руления (targeted charge)
    DashLocked { direction: Vec3 },
    /// Остановиться немедленно (сбросить velocity)
    Stop,
}

/// Speed / turn-rate knobs exposed to the navigation collaborator.
///
/// Multipliers apply on top of `MovementConfig` base values. `frozen`
/// zeroes movement entirely (stun).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MovementTuning {
    pub speed_multiplier: f32,
    pub turn_multiplier: f32,
    pub frozen: bool,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            turn_multiplier: 1.0,
            frozen: false,
        }
    }
}

impl MovementTuning {
    pub fn set_multipliers(&mut self, speed: f32, turn: f32) {
        self.speed_multiplier = speed;
        self.turn_multiplier = turn;
    }

    pub fn reset_multipliers(&mut self) {
        self.speed_multiplier = 1.0;
        self.turn_multiplier = 1.0;
    }

    /// Returns true only on the actual transition (idempotent).
    pub fn freeze(&mut self) -> bool {
        let changed = !self.frozen;
        self.frozen = true;
        changed
    }

    /// Returns true only on the actual transition (idempotent).
    pub fn unfreeze(&mut self) -> bool {
        let changed = self.frozen;
        self.frozen = false;
        changed
    }
}

/// Horizontal facing of the boss (unit vector, y = 0).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Facing(pub Vec3);

impl Default for Facing {
    fn default() -> Self {
        Self(Vec3::Z)
    }
}

/// Состояние навигации (пишет navigation collaborator)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavigationState {
    /// false когда NavMesh не может построить путь к текущей цели
    pub has_valid_path: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            has_valid_path: true,
        }
    }
}

/// Externally applied velocity on a target (pull). Written by the physics
/// bridge from `EncounterSignal::ExternalVelocity`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct ExternalVelocity(pub Vec3);

/// "Push target away" behaviour around the boss body.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Repulsion {
    pub enabled: bool,
    pub radius: f32,
}

impl Default for Repulsion {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 2.5,
        }
    }
}

/// Project onto the ground plane.
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Planar distance between two points.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Rotate `current` toward `desired` on the ground plane by at most `max_angle` radians.
///
/// Degenerate inputs return `current` unchanged.
pub fn turn_towards(current: Vec3, desired: Vec3, max_angle: f32) -> Vec3 {
    let from = planar(current).normalize_or_zero();
    let to = planar(desired).normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return if from == Vec3::ZERO { to } else { from };
    }

    let angle = angle_between(from, to);
    if angle <= max_angle {
        return to;
    }

    // Знак поворота: y-компонента cross product
    let sign = if from.cross(to).y >= 0.0 { 1.0 } else { -1.0 };
    Quat::from_rotation_y(sign * max_angle) * from
}

/// Unsigned planar angle between two directions (radians).
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let a = planar(a).normalize_or_zero();
    let b = planar(b).normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_turn_towards_clamps_angle() {
        let turned = turn_towards(Vec3::Z, Vec3::X, 0.1);
        assert!((angle_between(Vec3::Z, turned) - 0.1).abs() < 1e-4);
        // Поворот в сторону цели, не от неё
        assert!(angle_between(turned, Vec3::X) < FRAC_PI_2);
    }

    #[test]
    fn test_turn_towards_snaps_when_close() {
        let turned = turn_towards(Vec3::Z, Vec3::new(0.05, 0.0, 1.0), 0.5);
        assert!(angle_between(turned, Vec3::new(0.05, 0.0, 1.0)) < 1e-4);
    }

    #[test]
    fn test_turn_towards_negative_side() {
        let turned = turn_towards(Vec3::Z, -Vec3::X, 0.2);
        assert!(turned.x < 0.0);
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let mut tuning = MovementTuning::default();
        assert!(tuning.freeze());
        assert!(!tuning.freeze());
        assert!(tuning.unfreeze());
        assert!(!tuning.unfreeze());
    }
}
