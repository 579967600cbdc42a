//! Suction / pull subsystem.
//!
//! `start_pull(target, goal, duration)` drives an external velocity on the
//! target every tick:
//! - direction: straight to `goal`, or next waypoint around obstacles
//!   (re-planned at `repath_interval`, not every tick)
//! - magnitude: `base → max` as the target closes in, exponentially smoothed
//!   from zero (no velocity jump at activation)
//! - ends on the arrived radius or after `duration`, then clears the velocity
//!
//! `stop_pull()` is idempotent and always clears residual velocity.

use bevy::prelude::*;

pub mod route;
pub mod systems;

pub use route::plan_route;
pub use systems::tick_pull_routines;

use crate::components::{planar, planar_distance, ArenaObstacles};
use crate::config::SuctionConfig;
use crate::events::{EncounterSignal, Outbox};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivePull {
    pub target: Entity,
    pub goal: Vec3,
    pub duration: f32,
    pub elapsed: f32,
    /// Smoothed magnitude currently applied
    pub strength: f32,
    pub path: Vec<Vec3>,
    pub repath_in: f32,
}

/// Outcome of one pull tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PullStatus {
    Idle,
    Pulling { velocity: Vec3 },
    Arrived,
    Expired,
}

#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct PullRoutine {
    active: Option<ActivePull>,
    /// Target whose velocity we last wrote (cleared on stop)
    applied_to: Option<Entity>,
}

impl PullRoutine {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActivePull> {
        self.active.as_ref()
    }

    pub fn start_pull(&mut self, target: Entity, goal: Vec3, duration: f32, outbox: &mut Outbox) {
        if self.active.is_some() {
            self.stop_pull(outbox);
        }
        self.active = Some(ActivePull {
            target,
            goal,
            duration,
            elapsed: 0.0,
            strength: 0.0,
            path: Vec::new(),
            repath_in: 0.0,
        });
        crate::log(&format!(
            "🌀 {:?}: pull started on {:?} → {:.1?} for {:.1}s",
            outbox.boss(),
            target,
            goal,
            duration
        ));
    }

    pub fn stop_pull(&mut self, outbox: &mut Outbox) {
        if self.active.take().is_some() {
            crate::log(&format!("🌀 {:?}: pull stopped", outbox.boss()));
        }
        if let Some(target) = self.applied_to.take() {
            outbox.push(EncounterSignal::ClearExternalVelocity { target });
        }
    }

    /// Advance the pull. `target_position: None` means the target vanished.
    pub fn tick(
        &mut self,
        target_position: Option<Vec3>,
        delta: f32,
        config: &SuctionConfig,
        obstacles: &ArenaObstacles,
        outbox: &mut Outbox,
    ) -> PullStatus {
        let Some(pull) = self.active.as_mut() else {
            return PullStatus::Idle;
        };

        let Some(position) = target_position else {
            crate::log_warning(&format!(
                "⚠️ {:?}: pull target {:?} has no position, pull dropped",
                outbox.boss(),
                pull.target
            ));
            self.stop_pull(outbox);
            return PullStatus::Expired;
        };

        pull.elapsed += delta;
        if pull.elapsed >= pull.duration {
            self.stop_pull(outbox);
            return PullStatus::Expired;
        }

        let distance = planar_distance(position, pull.goal);
        if distance <= config.arrived_radius {
            crate::log(&format!("🌀 {:?}: pull target arrived", outbox.boss()));
            self.stop_pull(outbox);
            return PullStatus::Arrived;
        }

        pull.repath_in -= delta;
        if pull.repath_in <= 0.0 || pull.path.is_empty() {
            pull.path = plan_route(position, pull.goal, obstacles, config.obstacle_margin);
            pull.repath_in = config.repath_interval;
        }
        // Пройденные waypoint'ы отбрасываем (последний: сама цель)
        while pull.path.len() > 1 && planar_distance(position, pull.path[0]) <= config.arrived_radius {
            pull.path.remove(0);
        }
        let waypoint = pull.path.first().copied().unwrap_or(pull.goal);
        let direction = planar(waypoint - position).normalize_or_zero();

        let proximity = 1.0 - (distance / config.falloff_distance).clamp(0.0, 1.0);
        let target_strength =
            config.base_strength + (config.max_strength - config.base_strength) * proximity;
        let alpha = if config.ramp_time > 0.0 {
            1.0 - (-delta / config.ramp_time).exp()
        } else {
            1.0
        };
        pull.strength += (target_strength - pull.strength) * alpha;

        let velocity = direction * pull.strength;
        let target = pull.target;
        self.applied_to = Some(target);
        outbox.push(EncounterSignal::ExternalVelocity { target, velocity });

        PullStatus::Pulling { velocity }
    }
}
