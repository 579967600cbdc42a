//! Interruption handler: preemption channel for stuns.
//!
//! `Idle → Windup → Active → Recovery → Idle`, entered by a parry or by a
//! targeted charge hitting an obstacle. Phases split the total duration
//! 20% / 60% / 20%.
//!
//! Only this module writes `StunState`.

use bevy::prelude::*;

pub mod handler;
pub mod systems;

#[cfg(test)]
mod handler_tests;

pub use handler::{advance_stun, enter_stun, obstacle_stuns, parry_is_valid, StunOutcome};
pub use systems::tick_stuns;

/// Доли фаз стана (windup / active / recovery)
pub const STUN_PHASE_SPLIT: [f32; 3] = [0.2, 0.6, 0.2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum StunKind {
    #[default]
    None,
    Parry,
    ObstacleCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum StunPhase {
    #[default]
    Windup,
    Active,
    Recovery,
}

impl StunPhase {
    fn index(self) -> usize {
        match self {
            StunPhase::Windup => 0,
            StunPhase::Active => 1,
            StunPhase::Recovery => 2,
        }
    }

    fn next(self) -> Option<StunPhase> {
        match self {
            StunPhase::Windup => Some(StunPhase::Active),
            StunPhase::Active => Some(StunPhase::Recovery),
            StunPhase::Recovery => None,
        }
    }

    pub fn clip_name(self) -> &'static str {
        match self {
            StunPhase::Windup => "stun_windup",
            StunPhase::Active => "stun_active",
            StunPhase::Recovery => "stun_recovery",
        }
    }
}

/// Result of advancing the stun timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunStep {
    Idle,
    Holding,
    /// Crossed into a new phase this tick
    Entered(StunPhase),
    /// Recovery finished; back to Idle
    Finished(StunKind),
}

#[derive(Component, Debug, Clone, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct StunState {
    active: bool,
    kind: StunKind,
    phase: StunPhase,
    /// Time remaining in current phase (seconds)
    timer: f32,
    durations: [f32; 3],
}

impl StunState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kind(&self) -> StunKind {
        self.kind
    }

    /// Current phase; meaningless while inactive.
    pub fn phase(&self) -> StunPhase {
        self.phase
    }

    pub fn phase_duration(&self, phase: StunPhase) -> f32 {
        self.durations[phase.index()]
    }

    /// Start a stun. Returns false (no change) if one is already running.
    pub(crate) fn begin(&mut self, kind: StunKind, total: f32) -> bool {
        if self.active || kind == StunKind::None {
            return false;
        }
        let total = total.max(0.0);
        self.durations = STUN_PHASE_SPLIT.map(|share| share * total);
        self.active = true;
        self.kind = kind;
        self.phase = StunPhase::Windup;
        self.timer = self.durations[0];
        true
    }

    pub(crate) fn tick(&mut self, delta: f32) -> StunStep {
        if !self.active {
            return StunStep::Idle;
        }

        self.timer -= delta;
        let mut entered = None;

        // Большой delta может перескочить несколько фаз за тик
        while self.timer <= 0.0 {
            match self.phase.next() {
                Some(next) => {
                    self.phase = next;
                    self.timer += self.durations[next.index()];
                    entered = Some(next);
                }
                None => {
                    let kind = self.kind;
                    self.clear();
                    return StunStep::Finished(kind);
                }
            }
        }

        match entered {
            Some(phase) => StunStep::Entered(phase),
            None => StunStep::Holding,
        }
    }

    /// Drop the stun without running recovery (defeat).
    pub(crate) fn clear(&mut self) {
        *self = StunState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stun_phase_split() {
        let mut stun = StunState::default();
        assert!(stun.begin(StunKind::Parry, 5.0));

        assert_eq!(stun.phase(), StunPhase::Windup);
        assert_eq!(stun.phase_duration(StunPhase::Windup), 1.0);
        assert_eq!(stun.phase_duration(StunPhase::Active), 3.0);
        assert_eq!(stun.phase_duration(StunPhase::Recovery), 1.0);
    }

    #[test]
    fn test_stun_runs_through_phases() {
        let mut stun = StunState::default();
        stun.begin(StunKind::ObstacleCollision, 5.0);

        assert_eq!(stun.tick(0.5), StunStep::Holding);
        assert_eq!(stun.tick(0.5), StunStep::Entered(StunPhase::Active));
        assert_eq!(stun.tick(3.0), StunStep::Entered(StunPhase::Recovery));
        assert_eq!(stun.tick(1.0), StunStep::Finished(StunKind::ObstacleCollision));

        assert!(!stun.is_active());
        assert_eq!(stun.kind(), StunKind::None);
        assert_eq!(stun.tick(1.0), StunStep::Idle);
    }

    #[test]
    fn test_second_stun_ignored_while_active() {
        let mut stun = StunState::default();
        assert!(stun.begin(StunKind::Parry, 2.0));
        assert!(!stun.begin(StunKind::ObstacleCollision, 4.0));
        assert_eq!(stun.kind(), StunKind::Parry);
    }

    #[test]
    fn test_large_delta_finishes_stun() {
        let mut stun = StunState::default();
        stun.begin(StunKind::Parry, 1.0);
        assert_eq!(stun.tick(10.0), StunStep::Finished(StunKind::Parry));
    }
}
