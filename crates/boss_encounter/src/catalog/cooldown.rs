//! Cooldown tracker: attack identity → next-eligible timestamp.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::catalog::{AttackDescriptor, AttackId};

/// Next-eligible simulated time per attack.
///
/// No entry means the attack has never been used and is eligible.
/// Written only by the attack executor when an attack completes; an
/// interrupted attack leaves no entry.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AttackCooldowns {
    next_eligible: BTreeMap<AttackId, f32>,
}

impl AttackCooldowns {
    pub fn is_off_cooldown(&self, attack: AttackId, now: f32) -> bool {
        self.next_eligible
            .get(&attack)
            .map_or(true, |next| now >= *next)
    }

    pub fn mark_used(&mut self, attack: &AttackDescriptor, now: f32) {
        self.next_eligible
            .insert(attack.id, now + attack.cooldown_seconds);
    }

    pub fn next_eligible(&self, attack: AttackId) -> Option<f32> {
        self.next_eligible.get(&attack).copied()
    }
}
