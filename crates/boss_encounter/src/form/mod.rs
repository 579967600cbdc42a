//! Form Controller: top-level loop of the boss.
//!
//! Два режима:
//! - `Primary`: цикл выбора атак против tracked target + периодическая
//!   transition-атака по порогу счётчика
//! - `Secondary`: цикл charge-комбо (N случайных комбо + один targeted charge)
//!
//! Primary → Secondary только после успешной transition-атаки.
//! Secondary → Primary только через obstacle-collision стан.
//! Defeat терминален из обоих режимов.
//!
//! Владеет `FormState`, `ControllerRoutine` и `ChargeRuntime`.

use bevy::prelude::*;
use rand::Rng;

use crate::config::SelectionConfig;

pub mod attack;
pub mod context;
pub mod controller;
pub mod ingest;
pub mod primary;
pub mod secondary;
pub mod systems;


pub use attack::{AttackExecution, AttackOutcome, AttackProgress, AttackStep};
pub use context::{BossParts, TargetView, TickContext};
pub use controller::{abandon_routine, advance_controller, defeat, resume_after_stun, ControllerRoutine};
pub use ingest::apply_arena_callback;
pub use primary::PrimaryStep;
pub use secondary::{LoopStall, SecondaryLoop, SecondaryStage};
pub use systems::{advance_form_controllers, ingest_arena_callbacks, BossQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Form {
    #[default]
    Primary,
    Secondary,
}

/// Top-level form bookkeeping.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct FormState {
    pub current_form: Form,
    /// Successful non-special attacks since the last reset
    pub attack_counter: u32,
    /// Counter value that forces the transition attack (re-rolled on form change)
    pub attack_threshold: u32,
    pub is_mounted: bool,
    /// Simulated time of the last dismount
    pub last_mounted_time: Option<f32>,
    pub failed_transitions: u32,
}

impl Default for FormState {
    fn default() -> Self {
        let selection = SelectionConfig::default();
        Self::with_threshold(selection.threshold_min)
    }
}

impl FormState {
    pub fn with_threshold(attack_threshold: u32) -> Self {
        Self {
            current_form: Form::Primary,
            attack_counter: 0,
            attack_threshold,
            is_mounted: false,
            last_mounted_time: None,
            failed_transitions: 0,
        }
    }

    /// Threshold rolled uniformly in `[threshold_min, threshold_max]`.
    pub fn rolled<R: Rng + ?Sized>(config: &SelectionConfig, rng: &mut R) -> Self {
        Self::with_threshold(roll_threshold(config, rng))
    }

    pub fn threshold_reached(&self) -> bool {
        self.attack_counter >= self.attack_threshold
    }

    pub fn record_success(&mut self) {
        self.attack_counter += 1;
    }

    /// Target dodged the transition: counter resets, form unchanged.
    pub fn record_failed_transition(&mut self) {
        self.attack_counter = 0;
        self.failed_transitions += 1;
    }

    /// Switch form; counter resets and the threshold is re-rolled.
    pub fn switch_to<R: Rng + ?Sized>(&mut self, form: Form, config: &SelectionConfig, rng: &mut R) {
        self.current_form = form;
        self.attack_counter = 0;
        self.attack_threshold = roll_threshold(config, rng);
    }

    pub fn set_mounted(&mut self, mounted: bool, now: f32) {
        if self.is_mounted && !mounted {
            self.last_mounted_time = Some(now);
        }
        self.is_mounted = mounted;
    }

    /// Mounted now, or dismounted less than `grace` seconds ago.
    pub fn mounted_within_grace(&self, now: f32, grace: f32) -> bool {
        self.is_mounted
            || self
                .last_mounted_time
                .is_some_and(|t| now - t <= grace)
    }
}

fn roll_threshold<R: Rng + ?Sized>(config: &SelectionConfig, rng: &mut R) -> u32 {
    rng.gen_range(config.threshold_min..=config.threshold_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_threshold_rolled_within_range() {
        let config = SelectionConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..50 {
            let state = FormState::rolled(&config, &mut rng);
            assert!((config.threshold_min..=config.threshold_max).contains(&state.attack_threshold));
        }
    }

    #[test]
    fn test_failed_transition_resets_counter_only() {
        let mut state = FormState::with_threshold(10);
        state.attack_counter = 10;

        state.record_failed_transition();

        assert_eq!(state.attack_counter, 0);
        assert_eq!(state.attack_threshold, 10);
        assert_eq!(state.current_form, Form::Primary);
        assert_eq!(state.failed_transitions, 1);
    }

    #[test]
    fn test_mount_grace_window() {
        let mut state = FormState::default();
        state.set_mounted(true, 1.0);
        assert!(state.mounted_within_grace(1.0, 1.0));

        state.set_mounted(false, 2.0);
        assert!(state.mounted_within_grace(2.5, 1.0));
        assert!(!state.mounted_within_grace(3.5, 1.0));
    }
}
