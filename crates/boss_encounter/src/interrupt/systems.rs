//! Interrupt system: stun timers.

use bevy::prelude::*;

use crate::events::{EncounterSignal, Outbox};
use crate::form::systems::{split_boss, BossQuery};
use crate::interrupt::handler::advance_stun;

/// Система: tick станов всех боссов
///
/// Вход в стан: из ingest (parry / obstacle). Здесь только фазы и выход.
pub fn tick_stuns(
    mut bosses: Query<BossQuery>,
    mut signals: EventWriter<EncounterSignal>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for mut boss in bosses.iter_mut() {
        if !boss.stun.is_active() {
            continue;
        }

        let entity = boss.entity;
        let decision_interval = boss.tuning.selection.decision_interval;
        let mut parts = split_boss(&mut boss);
        let mut outbox = Outbox::new(entity);

        advance_stun(&mut parts, delta, decision_interval, &mut outbox);
        outbox.flush(&mut signals);
    }
}
