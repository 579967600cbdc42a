//! Per-tick view of one boss handed to routine step functions.
//!
//! `TickContext` is read-only input (time, pose, tuning, catalog).
//! `BossParts` borrows the mutable state each subsystem owns. Routine code
//! only ever touches the parts its owner is allowed to write.

use bevy::prelude::*;

use crate::arbitration::BodyResources;
use crate::catalog::{AnimationClips, AttackCatalog, AttackCooldowns};
use crate::charge::ChargeRuntime;
use crate::components::{
    HitDetection, MovementCommand, MovementTuning, Repulsion, SidePanels,
};
use crate::config::BossTuning;
use crate::form::{ControllerRoutine, FormState};
use crate::interrupt::StunState;
use crate::suction::PullRoutine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub entity: Entity,
    pub position: Vec3,
}

pub struct TickContext<'a> {
    pub boss: Entity,
    /// Simulated seconds since the encounter began
    pub now: f32,
    pub delta: f32,
    pub position: Vec3,
    pub facing: Vec3,
    pub has_valid_path: bool,
    pub target: Option<TargetView>,
    pub tuning: &'a BossTuning,
    pub catalog: &'a AttackCatalog,
    pub clips: &'a AnimationClips,
}

pub struct BossParts<'a> {
    pub form: &'a mut FormState,
    pub routine: &'a mut ControllerRoutine,
    pub cooldowns: &'a mut AttackCooldowns,
    pub resources: &'a mut BodyResources,
    pub stun: &'a mut StunState,
    pub charge: &'a mut ChargeRuntime,
    pub hits: &'a mut HitDetection,
    pub pull: &'a mut PullRoutine,
    pub panels: &'a mut SidePanels,
    pub command: &'a mut MovementCommand,
    pub movement: &'a mut MovementTuning,
    pub repulsion: &'a mut Repulsion,
}

/// Owned copy of every boss part, for unit tests of routine code.
#[cfg(test)]
#[derive(Default)]
pub struct PartsFixture {
    pub form: FormState,
    pub routine: ControllerRoutine,
    pub cooldowns: AttackCooldowns,
    pub resources: BodyResources,
    pub stun: StunState,
    pub charge: ChargeRuntime,
    pub hits: HitDetection,
    pub pull: PullRoutine,
    pub panels: SidePanels,
    pub command: MovementCommand,
    pub movement: MovementTuning,
    pub repulsion: Repulsion,
}

#[cfg(test)]
impl PartsFixture {
    pub fn parts(&mut self) -> BossParts<'_> {
        BossParts {
            form: &mut self.form,
            routine: &mut self.routine,
            cooldowns: &mut self.cooldowns,
            resources: &mut self.resources,
            stun: &mut self.stun,
            charge: &mut self.charge,
            hits: &mut self.hits,
            pull: &mut self.pull,
            panels: &mut self.panels,
            command: &mut self.command,
            movement: &mut self.movement,
            repulsion: &mut self.repulsion,
        }
    }
}

#[cfg(test)]
impl<'a> TickContext<'a> {
    /// Boss at the origin facing +Z, target 3 units ahead, one 60Hz tick.
    pub fn for_test(
        tuning: &'a BossTuning,
        catalog: &'a AttackCatalog,
        clips: &'a AnimationClips,
    ) -> Self {
        Self {
            boss: Entity::from_raw(1),
            now: 0.0,
            delta: 1.0 / 60.0,
            position: Vec3::ZERO,
            facing: Vec3::Z,
            has_valid_path: true,
            target: Some(TargetView {
                entity: Entity::from_raw(2),
                position: Vec3::new(0.0, 0.0, 3.0),
            }),
            tuning,
            catalog,
            clips,
        }
    }
}
