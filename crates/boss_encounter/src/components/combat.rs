//! Combat компоненты: активные hitbox'ы босса

use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::catalog::AttackId;
use crate::events::Outbox;

/// Which attacks currently have hit detection enabled, and who each has
/// already struck during this execution (one damage request per target).
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct HitDetection {
    enabled: BTreeSet<AttackId>,
    struck: Vec<(AttackId, Entity)>,
}

impl HitDetection {
    pub fn is_enabled(&self, attack: AttackId) -> bool {
        self.enabled.contains(&attack)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    pub fn enabled(&self) -> impl Iterator<Item = AttackId> + '_ {
        self.enabled.iter().copied()
    }

    /// Enable for a fresh execution; forgets previous strikes of this attack.
    pub fn enable(&mut self, attack: AttackId, outbox: &mut Outbox) {
        self.struck.retain(|(id, _)| *id != attack);
        if self.enabled.insert(attack) {
            outbox.hit_detection(attack, true);
        }
    }

    pub fn disable(&mut self, attack: AttackId, outbox: &mut Outbox) {
        if self.enabled.remove(&attack) {
            outbox.hit_detection(attack, false);
        }
    }

    pub fn disable_all(&mut self, outbox: &mut Outbox) {
        for attack in std::mem::take(&mut self.enabled) {
            outbox.hit_detection(attack, false);
        }
    }

    /// Register a contact. True if it should produce a damage request.
    pub fn register_contact(&mut self, attack: AttackId, target: Entity) -> bool {
        if !self.is_enabled(attack) || self.struck.contains(&(attack, target)) {
            return false;
        }
        self.struck.push((attack, target));
        true
    }
}
