//! Headless motion: stand-in for the engine's navigation + physics bridge.
//!
//! Архитектура:
//! - Routines пишут `MovementCommand` (intent), здесь он интегрируется в Transform
//! - ExternalVelocity из pull → позиция цели
//! - Repulsion выталкивает цель из радиуса тела босса
//! - Контакт тела с препятствием → `ArenaCallback::ObstacleCollision` (на начале контакта)
//!
//! Детерминизм: только `Time<Fixed>`, без Rapier. В игре этот plugin не
//! подключается: те же компоненты читает engine bridge.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::catalog::{AttackCatalog, AttackKind};
use crate::components::{
    planar, planar_distance, turn_towards, ArenaObstacles, Boss, Defeated, EncounterTarget,
    ExternalVelocity, Facing, HitDetection, MovementCommand, MovementTuning, Repulsion,
};
use crate::config::BossTuning;
use crate::events::{ArenaCallback, EncounterSignal};
use crate::EncounterSet;

/// Запас на контакт: вытолкнутое на границу тело всё ещё "касается"
const CONTACT_SLOP: f32 = 0.05;

/// Система: pull velocities из сигналов → ExternalVelocity цели
///
/// Читает сигналы этого же тика (Motion идёт после Pull).
pub fn apply_velocity_signals(
    mut signals: EventReader<EncounterSignal>,
    mut targets: Query<&mut ExternalVelocity>,
) {
    for signal in signals.read() {
        match signal {
            EncounterSignal::ExternalVelocity { target, velocity } => {
                if let Ok(mut external) = targets.get_mut(*target) {
                    external.0 = *velocity;
                }
            }
            EncounterSignal::ClearExternalVelocity { target } => {
                if let Ok(mut external) = targets.get_mut(*target) {
                    external.0 = Vec3::ZERO;
                }
            }
            _ => {}
        }
    }
}

/// Система: MovementCommand → Transform/Facing босса
///
/// Скорость = base_speed × speed_multiplier (× speed_scale для подхода),
/// поворот = base_turn_rate × turn_multiplier. `frozen` → тело стоит.
pub fn drive_bosses(
    mut bosses: Query<
        (
            &mut Transform,
            &mut Facing,
            &MovementCommand,
            &MovementTuning,
            &BossTuning,
        ),
        (With<Boss>, Without<Defeated>),
    >,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut transform, mut facing, command, tuning, boss_tuning) in bosses.iter_mut() {
        if tuning.frozen {
            continue;
        }

        let speed = boss_tuning.movement.base_speed * tuning.speed_multiplier;
        let max_turn = boss_tuning.movement.base_turn_rate * tuning.turn_multiplier * delta;
        let position = transform.translation;

        match *command {
            MovementCommand::Idle | MovementCommand::Stop => {}
            MovementCommand::FaceTowards { point } => {
                facing.0 = turn_towards(facing.0, point - position, max_turn);
            }
            MovementCommand::MoveToPosition {
                target,
                speed_scale,
            } => {
                let to_target = planar(target - position);
                facing.0 = turn_towards(facing.0, to_target, max_turn);

                // Не перелетаем точку назначения
                let step = (speed * speed_scale * delta).min(to_target.length());
                transform.translation += to_target.normalize_or_zero() * step;
            }
            MovementCommand::SteerTo { destination } => {
                facing.0 = turn_towards(facing.0, destination - position, max_turn);
                transform.translation += facing.0 * speed * delta;
            }
            MovementCommand::DashLocked { direction } => {
                // Курс зафиксирован: никакого руления, цель может увернуться
                facing.0 = planar(direction).normalize_or(facing.0);
                transform.translation += facing.0 * speed * delta;
            }
        }
    }
}

/// Система: ExternalVelocity → позиция цели
pub fn integrate_target_velocity(
    mut targets: Query<(&ExternalVelocity, &mut Transform), With<EncounterTarget>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (velocity, mut transform) in targets.iter_mut() {
        transform.translation += velocity.0 * delta;
    }
}

/// Система: repulsion: цель не может стоять внутри радиуса тела
///
/// Выключена на время рывка (charge сам снимает `enabled`).
pub fn apply_repulsion(
    bosses: Query<(&Transform, &Repulsion), (With<Boss>, Without<EncounterTarget>)>,
    mut targets: Query<&mut Transform, (With<EncounterTarget>, Without<Boss>)>,
) {
    for (boss_transform, repulsion) in bosses.iter() {
        if !repulsion.enabled {
            continue;
        }
        let center = boss_transform.translation;

        for mut target in targets.iter_mut() {
            let offset = planar(target.translation - center);
            let distance = offset.length();
            if distance >= repulsion.radius || distance <= f32::EPSILON {
                continue;
            }
            target.translation += offset / distance * (repulsion.radius - distance);
        }
    }
}

/// Система: контакт тела босса с препятствием
///
/// Тело выталкивается из препятствия; callback шлётся только на НАЧАЛЕ
/// контакта (пока тело касается: повторов нет).
pub fn detect_obstacle_contacts(
    mut bosses: Query<(Entity, &mut Transform, &BossTuning), With<Boss>>,
    obstacles: Res<ArenaObstacles>,
    mut callbacks: EventWriter<ArenaCallback>,
    mut contacts: Local<HashMap<Entity, HashSet<u32>>>,
) {
    for (boss, mut transform, tuning) in bosses.iter_mut() {
        let body_radius = tuning.selection.agent_clearance;
        let touching: Vec<_> = obstacles
            .overlapping(transform.translation, body_radius + CONTACT_SLOP)
            .copied()
            .collect();

        let previous = contacts.entry(boss).or_default();
        let mut current = HashSet::new();

        for obstacle in touching {
            current.insert(obstacle.id);
            if !previous.contains(&obstacle.id) {
                crate::log(&format!(
                    "🪨 {:?}: contact with obstacle {} at {:.1?}",
                    boss, obstacle.id, transform.translation
                ));
                callbacks.write(ArenaCallback::ObstacleCollision {
                    boss,
                    obstacle: obstacle.id,
                });
            }

            // Выталкиваем на границу
            let offset = planar(transform.translation - obstacle.center);
            let min_distance = obstacle.radius + body_radius;
            let distance = planar_distance(obstacle.center, transform.translation);
            if distance > f32::EPSILON && distance < min_distance {
                transform.translation += offset / distance * (min_distance - distance);
            }
        }

        *previous = current;
    }
}

/// Система: грубый hitbox: цель в радиусе атаки при включённом hit detection
///
/// Radius = range_max + тело босса; для рывка только тело. Дубли по одной
/// цели отсекает `HitDetection::register_contact` в ingest.
pub fn detect_hitbox_contacts(
    bosses: Query<(Entity, &Transform, &HitDetection, &BossTuning), With<Boss>>,
    targets: Query<(Entity, &Transform), With<EncounterTarget>>,
    catalog: Res<AttackCatalog>,
    mut callbacks: EventWriter<ArenaCallback>,
) {
    for (boss, transform, hits, tuning) in bosses.iter() {
        for attack in hits.enabled() {
            let Some(descriptor) = catalog.get(attack) else {
                continue;
            };
            let body = tuning.selection.agent_clearance;
            let reach = match descriptor.kind {
                AttackKind::Charge => body + CONTACT_SLOP,
                _ => descriptor.range_max + body,
            };

            for (target, target_transform) in targets.iter() {
                if planar_distance(transform.translation, target_transform.translation) <= reach {
                    callbacks.write(ArenaCallback::HitboxContact {
                        boss,
                        attack,
                        target,
                    });
                }
            }
        }
    }
}

/// Plugin headless движения (тесты, demo binary)
///
/// Регистрирует все системы в `EncounterSet::Motion` (после Pull).
pub struct HeadlessMotionPlugin;

impl Plugin for HeadlessMotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                apply_velocity_signals,
                drive_bosses,
                integrate_target_velocity,
                apply_repulsion,
                detect_obstacle_contacts,
                detect_hitbox_contacts,
            )
                .chain()
                .in_set(EncounterSet::Motion),
        );

        crate::log_info("🦶 HeadlessMotionPlugin initialized");
    }
}
