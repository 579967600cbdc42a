//! Attack catalog: the static table every other subsystem reads.
//!
//! Built once per encounter and never mutated. Phase timing is derived from
//! animation clip lengths (see `AnimationClips`), so retuning a clip in the
//! engine automatically retimes the attack.

use bevy::prelude::*;

use crate::error::ConfigError;
use crate::form::Form;

pub mod animation;
pub mod cooldown;

#[cfg(test)]
mod cooldown_tests;

pub use animation::AnimationClips;
pub use cooldown::AttackCooldowns;

/// Identity of every move the boss can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect)]
pub enum AttackId {
    ClawSwipeLeft,
    ClawSwipeRight,
    TailSweep,
    PlateSlam,
    SporeVolley,
    Inhale,
    TopShake,
    TopSpikes,
    /// One-shot form transition (Primary → Secondary on success)
    Engulf,
    /// Dash used by the Secondary form charge subsystem
    ChargeDash,
}

/// Broad behaviour class of an attack; drives who may pick it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackKind {
    Melee,
    Ranged,
    /// Ranged attack that runs a pull during its active phase
    Suction,
    /// Only while the target is mounted on top of the boss
    TopExclusive,
    Transition,
    Charge,
}

/// Three sequential phases of any timed attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum AttackPhase {
    Windup,
    Active,
    Recovery,
}

impl AttackPhase {
    pub fn clip_suffix(self) -> &'static str {
        match self {
            AttackPhase::Windup => "windup",
            AttackPhase::Active => "active",
            AttackPhase::Recovery => "recovery",
        }
    }

    fn index(self) -> usize {
        match self {
            AttackPhase::Windup => 0,
            AttackPhase::Active => 1,
            AttackPhase::Recovery => 2,
        }
    }
}

/// Phase timing: clip stem + fallback lengths + time scale.
///
/// duration(phase) = (clip length, or base length if the clip is unknown) × time_scale
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTiming {
    pub clip: &'static str,
    pub base: [f32; 3],
    pub time_scale: f32,
}

impl PhaseTiming {
    pub fn new(clip: &'static str, windup: f32, active: f32, recovery: f32) -> Self {
        Self {
            clip,
            base: [windup, active, recovery],
            time_scale: 1.0,
        }
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn clip_name(&self, phase: AttackPhase) -> String {
        format!("{}_{}", self.clip, phase.clip_suffix())
    }

    pub fn duration(&self, phase: AttackPhase, clips: &AnimationClips) -> f32 {
        let length = clips
            .clip_length(&self.clip_name(phase))
            .unwrap_or(self.base[phase.index()]);
        length * self.time_scale
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackDescriptor {
    pub id: AttackId,
    pub kind: AttackKind,
    pub form: Form,
    pub parryable: bool,
    pub cooldown_seconds: f32,
    pub range_min: f32,
    pub range_max: f32,
    pub timing: PhaseTiming,
    pub requires_limbs: bool,
    /// Raises plating for its duration and lowers it itself at the end
    pub raises_plating: bool,
    pub damage: f32,
}

impl AttackDescriptor {
    pub fn in_range(&self, effective_distance: f32) -> bool {
        effective_distance >= self.range_min && effective_distance <= self.range_max
    }

    /// Picked by the normal selection loop (not forced, not mount-only, not a charge).
    pub fn is_regular(&self) -> bool {
        matches!(
            self.kind,
            AttackKind::Melee | AttackKind::Ranged | AttackKind::Suction
        )
    }
}

#[derive(Resource, Debug, Clone)]
pub struct AttackCatalog {
    attacks: Vec<AttackDescriptor>,
}

impl AttackCatalog {
    pub fn new(attacks: Vec<AttackDescriptor>) -> Self {
        Self { attacks }
    }

    pub fn get(&self, id: AttackId) -> Option<&AttackDescriptor> {
        self.attacks.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttackDescriptor> {
        self.attacks.iter()
    }

    pub fn transition_attack(&self) -> Option<&AttackDescriptor> {
        self.attacks.iter().find(|a| a.kind == AttackKind::Transition)
    }

    pub fn charge_attack(&self) -> Option<&AttackDescriptor> {
        self.attacks.iter().find(|a| a.kind == AttackKind::Charge)
    }

    /// Startup validation: both forms need something to do.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self
            .attacks
            .iter()
            .any(|a| a.form == Form::Primary && a.is_regular())
        {
            return Err(ConfigError::EmptyFormSubset(Form::Primary));
        }
        if self.charge_attack().is_none() {
            return Err(ConfigError::EmptyFormSubset(Form::Secondary));
        }
        if self.transition_attack().is_none() {
            return Err(ConfigError::MissingTransitionAttack);
        }
        for attack in &self.attacks {
            if attack.range_min > attack.range_max {
                return Err(ConfigError::InvertedRange {
                    field: "attack.range",
                    min: attack.range_min,
                    max: attack.range_max,
                });
            }
            if attack.cooldown_seconds < 0.0 {
                return Err(ConfigError::NonPositive {
                    field: "attack.cooldown_seconds",
                    value: attack.cooldown_seconds,
                });
            }
        }
        Ok(())
    }

    /// Default move set of the encounter.
    pub fn standard() -> Self {
        use AttackKind::*;

        let attack = |id, kind, form, timing| AttackDescriptor {
            id,
            kind,
            form,
            parryable: false,
            cooldown_seconds: 0.0,
            range_min: 0.0,
            range_max: 0.0,
            timing,
            requires_limbs: false,
            raises_plating: false,
            damage: 0.0,
        };

        Self::new(vec![
            // Left/right варианты одного удара: равновероятны при выборе
            AttackDescriptor {
                parryable: true,
                cooldown_seconds: 4.0,
                range_max: 6.0,
                requires_limbs: true,
                damage: 20.0,
                ..attack(
                    AttackId::ClawSwipeLeft,
                    Melee,
                    Form::Primary,
                    PhaseTiming::new("claw_swipe_l", 0.7, 0.3, 0.8),
                )
            },
            AttackDescriptor {
                parryable: true,
                cooldown_seconds: 4.0,
                range_max: 6.0,
                requires_limbs: true,
                damage: 20.0,
                ..attack(
                    AttackId::ClawSwipeRight,
                    Melee,
                    Form::Primary,
                    PhaseTiming::new("claw_swipe_r", 0.7, 0.3, 0.8),
                )
            },
            AttackDescriptor {
                cooldown_seconds: 8.0,
                range_max: 5.0,
                damage: 25.0,
                ..attack(
                    AttackId::TailSweep,
                    Melee,
                    Form::Primary,
                    PhaseTiming::new("tail_sweep", 0.9, 0.5, 1.0),
                )
            },
            AttackDescriptor {
                parryable: true,
                cooldown_seconds: 10.0,
                range_max: 4.0,
                raises_plating: true,
                damage: 35.0,
                ..attack(
                    AttackId::PlateSlam,
                    Melee,
                    Form::Primary,
                    PhaseTiming::new("plate_slam", 1.1, 0.4, 1.2),
                )
            },
            AttackDescriptor {
                cooldown_seconds: 6.0,
                range_min: 6.0,
                range_max: 30.0,
                damage: 10.0,
                ..attack(
                    AttackId::SporeVolley,
                    Ranged,
                    Form::Primary,
                    PhaseTiming::new("spore_volley", 0.8, 1.2, 0.6),
                )
            },
            AttackDescriptor {
                cooldown_seconds: 14.0,
                range_min: 8.0,
                range_max: 35.0,
                ..attack(
                    AttackId::Inhale,
                    Suction,
                    Form::Primary,
                    PhaseTiming::new("inhale", 1.0, 4.0, 1.0),
                )
            },
            AttackDescriptor {
                cooldown_seconds: 3.0,
                damage: 5.0,
                ..attack(
                    AttackId::TopShake,
                    TopExclusive,
                    Form::Primary,
                    PhaseTiming::new("top_shake", 0.4, 0.8, 0.5),
                )
            },
            AttackDescriptor {
                cooldown_seconds: 5.0,
                raises_plating: true,
                damage: 15.0,
                ..attack(
                    AttackId::TopSpikes,
                    TopExclusive,
                    Form::Primary,
                    PhaseTiming::new("top_spikes", 0.6, 0.4, 0.7),
                )
            },
            AttackDescriptor {
                range_max: f32::MAX,
                damage: 40.0,
                ..attack(
                    AttackId::Engulf,
                    Transition,
                    Form::Primary,
                    PhaseTiming::new("engulf", 1.4, 1.0, 1.5),
                )
            },
            AttackDescriptor {
                range_max: f32::MAX,
                damage: 30.0,
                ..attack(
                    AttackId::ChargeDash,
                    Charge,
                    Form::Secondary,
                    PhaseTiming::new("charge_dash", 0.6, 2.0, 0.8),
                )
            },
        ])
    }
}

impl Default for AttackCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = AttackCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.transition_attack().map(|a| a.id), Some(AttackId::Engulf));
        assert_eq!(catalog.charge_attack().map(|a| a.id), Some(AttackId::ChargeDash));
    }

    #[test]
    fn test_left_right_variants_are_symmetric() {
        let catalog = AttackCatalog::standard();
        let left = catalog.get(AttackId::ClawSwipeLeft).unwrap();
        let right = catalog.get(AttackId::ClawSwipeRight).unwrap();

        assert_eq!(left.cooldown_seconds, right.cooldown_seconds);
        assert_eq!(left.range_max, right.range_max);
        assert_eq!(left.timing.base, right.timing.base);
        assert!(left.parryable && right.parryable);
    }

    #[test]
    fn test_phase_duration_prefers_clip_length() {
        let timing = PhaseTiming::new("tail_sweep", 0.9, 0.5, 1.0).with_time_scale(2.0);
        let mut clips = AnimationClips::default();

        // Нет клипа → base × scale
        assert_eq!(timing.duration(AttackPhase::Windup, &clips), 1.8);

        clips.insert("tail_sweep_windup", 0.25);
        assert_eq!(timing.duration(AttackPhase::Windup, &clips), 0.5);
        assert_eq!(timing.duration(AttackPhase::Recovery, &clips), 2.0);
    }

    #[test]
    fn test_catalog_without_transition_rejected() {
        let attacks = AttackCatalog::standard()
            .iter()
            .filter(|a| a.kind != AttackKind::Transition)
            .cloned()
            .collect();

        assert!(matches!(
            AttackCatalog::new(attacks).validate(),
            Err(ConfigError::MissingTransitionAttack)
        ));
    }
}
