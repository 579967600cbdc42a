//! Form controller systems: ingest arena callbacks, advance routines.

use bevy::ecs::query::QueryData;
use bevy::prelude::*;

use crate::arbitration::BodyResources;
use crate::catalog::{AnimationClips, AttackCatalog, AttackCooldowns};
use crate::charge::ChargeRuntime;
use crate::components::{
    Defeated, EncounterTarget, Facing, HitDetection, MovementCommand, MovementTuning,
    NavigationState, Repulsion, SidePanels, TrackedTarget,
};
use crate::config::BossTuning;
use crate::events::{ArenaCallback, EncounterSignal, Outbox};
use crate::form::{
    advance_controller, apply_arena_callback, BossParts, ControllerRoutine, FormState, TargetView,
    TickContext,
};
use crate::interrupt::StunState;
use crate::suction::PullRoutine;
use crate::DeterministicRng;

/// Everything one boss tick touches.
#[derive(QueryData)]
#[query_data(mutable)]
pub struct BossQuery {
    pub entity: Entity,
    pub transform: &'static Transform,
    pub facing: &'static Facing,
    pub navigation: &'static NavigationState,
    pub tuning: &'static BossTuning,
    pub tracked: &'static TrackedTarget,
    pub form: &'static mut FormState,
    pub routine: &'static mut ControllerRoutine,
    pub cooldowns: &'static mut AttackCooldowns,
    pub resources: &'static mut BodyResources,
    pub stun: &'static mut StunState,
    pub charge: &'static mut ChargeRuntime,
    pub hits: &'static mut HitDetection,
    pub pull: &'static mut PullRoutine,
    pub panels: &'static mut SidePanels,
    pub command: &'static mut MovementCommand,
    pub movement: &'static mut MovementTuning,
    pub repulsion: &'static mut Repulsion,
}

/// Borrow the owned parts of a query item.
pub fn split_boss<'a>(boss: &'a mut BossQueryItem<'_>) -> BossParts<'a> {
    BossParts {
        form: &mut boss.form,
        routine: &mut boss.routine,
        cooldowns: &mut boss.cooldowns,
        resources: &mut boss.resources,
        stun: &mut boss.stun,
        charge: &mut boss.charge,
        hits: &mut boss.hits,
        pull: &mut boss.pull,
        panels: &mut boss.panels,
        command: &mut boss.command,
        movement: &mut boss.movement,
        repulsion: &mut boss.repulsion,
    }
}

/// Per-tick read-only inputs of one boss.
#[derive(Debug, Clone, Copy)]
struct BossPose {
    now: f32,
    delta: f32,
    position: Vec3,
    facing: Vec3,
    has_valid_path: bool,
    target: Option<TargetView>,
}

impl BossPose {
    fn read(boss: &BossQueryItem<'_>, targets: &Query<&Transform, With<EncounterTarget>>, time: &Time<Fixed>) -> Self {
        let target = boss.tracked.0.and_then(|entity| {
            targets.get(entity).ok().map(|transform| TargetView {
                entity,
                position: transform.translation,
            })
        });

        Self {
            now: time.elapsed_secs(),
            delta: time.delta_secs(),
            position: boss.transform.translation,
            facing: boss.facing.0,
            has_valid_path: boss.navigation.has_valid_path,
            target,
        }
    }

    fn context<'a>(
        self,
        boss: Entity,
        tuning: &'a BossTuning,
        catalog: &'a AttackCatalog,
        clips: &'a AnimationClips,
    ) -> TickContext<'a> {
        TickContext {
            boss,
            now: self.now,
            delta: self.delta,
            position: self.position,
            facing: self.facing,
            has_valid_path: self.has_valid_path,
            target: self.target,
            tuning,
            catalog,
            clips,
        }
    }
}

/// Система: arena callbacks (parry, obstacle, zone, mount, hits, panels, defeat)
///
/// Первая в цепочке: всё, что пришло за тик, применяется до того, как
/// какая-либо routine продвинется.
pub fn ingest_arena_callbacks(
    mut commands: Commands,
    mut bosses: Query<BossQuery>,
    targets: Query<&Transform, With<EncounterTarget>>,
    mut callbacks: EventReader<ArenaCallback>,
    mut signals: EventWriter<EncounterSignal>,
    catalog: Res<AttackCatalog>,
    clips: Res<AnimationClips>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    for callback in callbacks.read() {
        let boss_entity = callback.boss();
        let Ok(mut boss) = bosses.get_mut(boss_entity) else {
            crate::log_warning(&format!(
                "⚠️ {:?} for unknown boss {:?}, ignored",
                callback, boss_entity
            ));
            continue;
        };

        let tuning = boss.tuning;
        let ctx = BossPose::read(&boss, &targets, &time).context(boss_entity, tuning, &catalog, &clips);
        let mut parts = split_boss(&mut boss);
        let mut outbox = Outbox::new(boss_entity);
        let was_defeated = parts.routine.is_defeated();

        apply_arena_callback(callback, &mut parts, &ctx, &mut rng.rng, &mut outbox);

        if !was_defeated && parts.routine.is_defeated() {
            commands.entity(boss_entity).insert(Defeated);
        }
        outbox.flush(&mut signals);
    }
}

/// Система: один тик Form Controller для каждого босса
pub fn advance_form_controllers(
    mut bosses: Query<BossQuery, Without<Defeated>>,
    targets: Query<&Transform, With<EncounterTarget>>,
    mut signals: EventWriter<EncounterSignal>,
    catalog: Res<AttackCatalog>,
    clips: Res<AnimationClips>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
) {
    // Детерминизм: RNG расходуется в фиксированном порядке Entity
    let mut order: Vec<Entity> = bosses.iter().map(|boss| boss.entity).collect();
    order.sort();

    for entity in order {
        let Ok(mut boss) = bosses.get_mut(entity) else {
            continue;
        };

        let tuning = boss.tuning;
        let ctx = BossPose::read(&boss, &targets, &time).context(entity, tuning, &catalog, &clips);
        let mut parts = split_boss(&mut boss);
        let mut outbox = Outbox::new(entity);

        advance_controller(&mut parts, &ctx, &mut rng.rng, &mut outbox);
        outbox.flush(&mut signals);
    }
}
