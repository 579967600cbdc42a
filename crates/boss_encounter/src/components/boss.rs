//! Boss entity: marker with required components, target tracking, side panels.

use bevy::prelude::*;

use crate::arbitration::BodyResources;
use crate::catalog::AttackCooldowns;
use crate::charge::ChargeRuntime;
use crate::config::{BossTuning, PanelConfig};
use crate::form::{ControllerRoutine, FormState};
use crate::interrupt::StunState;
use crate::suction::PullRoutine;

use super::combat::HitDetection;
use super::movement::{Facing, MovementCommand, MovementTuning, NavigationState, Repulsion};

/// Босс энкаунтера
///
/// Автоматически добавляет всё owned state через Required Components.
/// Для тюнинга отличного от default используй `spawn_boss` (BodyResources и
/// SidePanels строятся из BossTuning).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(
    Transform,
    BossTuning,
    FormState,
    ControllerRoutine,
    AttackCooldowns,
    BodyResources,
    StunState,
    ChargeRuntime,
    HitDetection,
    PullRoutine,
    SidePanels,
    TrackedTarget,
    MovementCommand,
    MovementTuning,
    Facing,
    NavigationState,
    Repulsion
)]
pub struct Boss;

/// Entity the boss is fighting (None → no target collaborator).
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackedTarget(pub Option<Entity>);

/// Player-side entity the boss can hit, pull and push.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Transform, super::movement::ExternalVelocity)]
pub struct EncounterTarget;

/// Terminal marker: boss defeated, never re-entered.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Defeated;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SidePanel {
    pub health: f32,
    pub destroyed: bool,
    pub vulnerability_multiplier: f32,
}

/// Результат урона по панели
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelDamage {
    /// Unknown index or already destroyed
    Ignored,
    Damaged { remaining: f32 },
    Destroyed,
}

/// Breakable side panels. Destruction is terminal until `reset()`.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SidePanels {
    panels: Vec<SidePanel>,
    max_health: f32,
}

impl SidePanels {
    pub fn new(config: &PanelConfig) -> Self {
        let panel = SidePanel {
            health: config.health,
            destroyed: false,
            vulnerability_multiplier: config.vulnerability_multiplier,
        };
        Self {
            panels: vec![panel; config.count],
            max_health: config.health,
        }
    }

    pub fn panels(&self) -> &[SidePanel] {
        &self.panels
    }

    pub fn destroyed_count(&self) -> usize {
        self.panels.iter().filter(|p| p.destroyed).count()
    }

    pub fn apply_damage(&mut self, index: usize, amount: f32) -> PanelDamage {
        let Some(panel) = self.panels.get_mut(index) else {
            return PanelDamage::Ignored;
        };
        if panel.destroyed || amount <= 0.0 {
            return PanelDamage::Ignored;
        }

        panel.health -= amount * panel.vulnerability_multiplier;
        if panel.health <= 0.0 {
            panel.health = 0.0;
            panel.destroyed = true;
            PanelDamage::Destroyed
        } else {
            PanelDamage::Damaged {
                remaining: panel.health,
            }
        }
    }

    /// Explicit restore (the only way a destroyed panel comes back).
    pub fn reset(&mut self) {
        for panel in &mut self.panels {
            panel.health = self.max_health;
            panel.destroyed = false;
        }
    }
}

impl Default for SidePanels {
    fn default() -> Self {
        Self::new(&PanelConfig::default())
    }
}
