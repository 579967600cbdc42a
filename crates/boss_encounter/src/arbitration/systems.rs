//! Arbitration system: completion callbacks + timers.

use bevy::prelude::*;

use crate::arbitration::{BodyResources, TransitionDirection};
use crate::events::{AnimationCallback, EncounterSignal, Outbox};

/// System: consume deploy/retract confirmations, advance in-flight
/// transitions (fallback timeouts) and auto-retract timers.
///
/// Runs before the interruption handler and the controller, so a routine
/// awaiting a settled resource sees this tick's completion.
pub fn tick_body_resources(
    mut bosses: Query<(Entity, &mut BodyResources)>,
    mut callbacks: EventReader<AnimationCallback>,
    mut signals: EventWriter<EncounterSignal>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for callback in callbacks.read() {
        let (boss, resource, direction) = match callback {
            AnimationCallback::DeployComplete { boss, resource } => {
                (*boss, *resource, TransitionDirection::Deploy)
            }
            AnimationCallback::RetractComplete { boss, resource } => {
                (*boss, *resource, TransitionDirection::Retract)
            }
        };

        let Ok((_, mut resources)) = bosses.get_mut(boss) else {
            crate::log_warning(&format!(
                "AnimationCallback for {:?} without BodyResources, ignored",
                boss
            ));
            continue;
        };
        resources.get_mut(resource).confirm(direction);
    }

    for (boss, mut resources) in bosses.iter_mut() {
        let mut outbox = Outbox::new(boss);
        for resource in resources.iter_mut() {
            resource.tick(delta);
        }
        resources.flush(&mut outbox);
        outbox.flush(&mut signals);
    }
}
