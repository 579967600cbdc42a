//! Charge subsystem: steerable and targeted dashes, plus combos of segments.
//!
//! Sequencing contract (both kinds):
//! 1. disable target repulsion for the whole charge
//! 2. hit detection enabled only after windup
//! 3. both restored on EVERY exit (arrival, timeout, obstacle, preemption)
//!
//! `end_charge` is the single exit; every path goes through it.

use bevy::prelude::*;

pub mod combo;
pub mod execution;

#[cfg(test)]
mod execution_tests;

pub use combo::{ChargeSegment, ComboProgress, ComboRoutine, SegmentRun, SegmentStep};
pub use execution::{end_charge, ChargeExecution, ChargeStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ChargeKind {
    /// Continuous heading correction toward a fixed endpoint
    Steerable,
    /// Heading locked at charge start (dodgeable)
    Targeted,
}

/// Why a charge stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ChargeEnd {
    Arrived,
    TimedOut,
    Obstacle,
    /// Stun or defeat cut the routine
    Preempted,
}

/// Live charge flags, read by the obstacle-collision handler.
///
/// Owned by the Form Controller.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct ChargeRuntime {
    pub is_charging: bool,
    pub is_targeted: bool,
    /// Planar unit heading at charge start
    pub direction: Vec3,
    /// How the most recent charge ended
    pub last_end: Option<ChargeEnd>,
}
