//! Pull system: advances every active pull once per fixed tick.

use bevy::prelude::*;

use crate::components::{ArenaObstacles, EncounterTarget};
use crate::config::BossTuning;
use crate::events::{EncounterSignal, Outbox};
use crate::suction::PullRoutine;

/// Система: tick всех активных pull'ов
///
/// Запуск/остановка: из attack routine (Controller set); здесь только
/// направление, сила и завершение по радиусу/длительности.
pub fn tick_pull_routines(
    mut bosses: Query<(Entity, &mut PullRoutine, &BossTuning)>,
    targets: Query<&Transform, With<EncounterTarget>>,
    obstacles: Res<ArenaObstacles>,
    mut signals: EventWriter<EncounterSignal>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (boss, mut pull, tuning) in bosses.iter_mut() {
        let Some(target) = pull.active().map(|p| p.target) else {
            continue;
        };

        let position = targets.get(target).ok().map(|t| t.translation);
        let mut outbox = Outbox::new(boss);
        pull.tick(position, delta, &tuning.suction, &obstacles, &mut outbox);
        outbox.flush(&mut signals);
    }
}
