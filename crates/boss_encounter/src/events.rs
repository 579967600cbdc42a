//! Encounter events: inbound callbacks from collaborators and outbound signals.
//!
//! Collaborators (animation, physics, navigation, VFX) never call into
//! mid-flight state. They push events; the owning system reads them once
//! per fixed tick before any routine advances.
//!
//! Animation layer → `AnimationCallback` → arbitration
//! Physics/arena   → `ArenaCallback`     → interruption handler, form controller
//! Core            → `EncounterSignal`   → hit detection, damage, external velocity, triggers

use bevy::prelude::*;

use crate::arbitration::BodyResource;
use crate::catalog::AttackId;
use crate::form::Form;
use crate::interrupt::{StunKind, StunPhase};

/// Deploy/retract confirmations from the animation layer.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum AnimationCallback {
    DeployComplete { boss: Entity, resource: BodyResource },
    RetractComplete { boss: Entity, resource: BodyResource },
}

/// Physics/arena callbacks.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ArenaCallback {
    /// Boss body hit an arena obstacle
    ObstacleCollision { boss: Entity, obstacle: u32 },
    /// Target parried; `attack` is the identity the physics layer saw
    ParryReported { boss: Entity, attack: AttackId },
    HealthDepleted { boss: Entity },
    /// Outcome of the transition attack: did the target end up in the zone
    TargetEnteredZone { boss: Entity, inside: bool },
    TargetMounted { boss: Entity, mounted: bool },
    /// Attack hitbox overlapped a target
    HitboxContact {
        boss: Entity,
        attack: AttackId,
        target: Entity,
    },
    PanelDamaged {
        boss: Entity,
        panel: usize,
        amount: f32,
    },
}

impl ArenaCallback {
    pub fn boss(&self) -> Entity {
        match self {
            ArenaCallback::ObstacleCollision { boss, .. }
            | ArenaCallback::ParryReported { boss, .. }
            | ArenaCallback::HealthDepleted { boss }
            | ArenaCallback::TargetEnteredZone { boss, .. }
            | ArenaCallback::TargetMounted { boss, .. }
            | ArenaCallback::HitboxContact { boss, .. }
            | ArenaCallback::PanelDamaged { boss, .. } => *boss,
        }
    }
}

/// Signals produced for collaborators.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum EncounterSignal {
    /// Fire-and-forget animation trigger
    AnimationTrigger { boss: Entity, name: String },
    HitDetection {
        boss: Entity,
        attack: AttackId,
        enabled: bool,
    },
    DamageRequest {
        boss: Entity,
        target: Entity,
        amount: f32,
    },
    ExternalVelocity { target: Entity, velocity: Vec3 },
    ClearExternalVelocity { target: Entity },
    PanelDestroyed { boss: Entity, panel: usize },
    FormChanged { boss: Entity, form: Form },
    /// `phase: None`: stun finished
    StunChanged {
        boss: Entity,
        kind: StunKind,
        phase: Option<StunPhase>,
    },
    MovementRestored { boss: Entity },
    Defeated { boss: Entity },
}

/// Per-boss signal buffer filled by pure routine code, flushed by systems.
#[derive(Debug)]
pub struct Outbox {
    boss: Entity,
    signals: Vec<EncounterSignal>,
}

impl Outbox {
    pub fn new(boss: Entity) -> Self {
        Self {
            boss,
            signals: Vec::new(),
        }
    }

    pub fn boss(&self) -> Entity {
        self.boss
    }

    pub fn push(&mut self, signal: EncounterSignal) {
        self.signals.push(signal);
    }

    pub fn trigger(&mut self, name: impl Into<String>) {
        let boss = self.boss;
        self.push(EncounterSignal::AnimationTrigger {
            boss,
            name: name.into(),
        });
    }

    pub fn hit_detection(&mut self, attack: AttackId, enabled: bool) {
        let boss = self.boss;
        self.push(EncounterSignal::HitDetection {
            boss,
            attack,
            enabled,
        });
    }

    pub fn signals(&self) -> &[EncounterSignal] {
        &self.signals
    }

    pub fn flush(&mut self, writer: &mut EventWriter<EncounterSignal>) {
        for signal in self.signals.drain(..) {
            writer.write(signal);
        }
    }

    pub fn into_signals(self) -> Vec<EncounterSignal> {
        self.signals
    }
}
