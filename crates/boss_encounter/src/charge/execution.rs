//! One charge: windup → dash → end.

use bevy::prelude::*;

use crate::catalog::{AttackId, AttackPhase};
use crate::charge::{ChargeEnd, ChargeKind};
use crate::components::{planar, planar_distance, MovementCommand};
use crate::events::Outbox;
use crate::form::{BossParts, TickContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeStep {
    Windup { remaining: f32 },
    Dashing { elapsed: f32 },
}

/// Resumable charge routine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeExecution {
    pub kind: ChargeKind,
    pub destination: Vec3,
    pub direction: Vec3,
    pub step: ChargeStep,
}

impl ChargeExecution {
    /// Steerable charge toward a fixed endpoint.
    pub fn steerable(
        destination: Vec3,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> Self {
        Self::begin(ChargeKind::Steerable, destination, parts, ctx, outbox)
    }

    /// Targeted charge: aim at `target` plus overshoot, heading locked now.
    pub fn targeted(
        target: Vec3,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> Self {
        let heading = planar(target - ctx.position).normalize_or(ctx.facing);
        let destination = target + heading * ctx.tuning.charge.overshoot;
        Self::begin(ChargeKind::Targeted, destination, parts, ctx, outbox)
    }

    fn begin(
        kind: ChargeKind,
        destination: Vec3,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> Self {
        let config = &ctx.tuning.charge;
        let direction = planar(destination - ctx.position).normalize_or(ctx.facing);

        parts.charge.is_charging = true;
        parts.charge.is_targeted = kind == ChargeKind::Targeted;
        parts.charge.direction = direction;
        parts.charge.last_end = None;

        // Репульсия выключена на весь рывок
        parts.repulsion.enabled = false;

        let turn = match kind {
            ChargeKind::Steerable => config.steerable_turn_multiplier,
            ChargeKind::Targeted => config.targeted_turn_multiplier,
        };
        parts.movement.set_multipliers(config.speed_multiplier, turn);
        *parts.command = MovementCommand::Stop;

        // Длительность windup: из клипа ChargeDash (как у любой атаки)
        let windup = match ctx.catalog.charge_attack() {
            Some(dash) => {
                outbox.trigger(dash.timing.clip_name(AttackPhase::Windup));
                dash.timing.duration(AttackPhase::Windup, ctx.clips)
            }
            None => {
                crate::log_warning(&format!(
                    "⚠️ {:?}: catalog has no charge attack, dash starts without windup",
                    ctx.boss
                ));
                0.0
            }
        };
        crate::log(&format!(
            "🐗 {:?}: {:?} charge windup → {:.1?} (dir {:.2?})",
            ctx.boss, kind, destination, direction
        ));

        Self {
            kind,
            destination,
            direction,
            step: ChargeStep::Windup {
                remaining: windup,
            },
        }
    }

    /// Advance one tick. `Some(end)` once the charge is over (restoration
    /// already done).
    pub fn advance(
        &mut self,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> Option<ChargeEnd> {
        // Уже остановлен снаружи (steerable obstacle, preempt)
        if !parts.charge.is_charging {
            return Some(parts.charge.last_end.unwrap_or(ChargeEnd::Preempted));
        }

        let config = &ctx.tuning.charge;

        match &mut self.step {
            ChargeStep::Windup { remaining } => {
                *remaining -= ctx.delta;
                if *remaining > 0.0 {
                    return None;
                }

                parts.hits.enable(AttackId::ChargeDash, outbox);
                outbox.trigger("charge_dash_active");
                *parts.command = match self.kind {
                    ChargeKind::Steerable => MovementCommand::SteerTo {
                        destination: self.destination,
                    },
                    ChargeKind::Targeted => MovementCommand::DashLocked {
                        direction: self.direction,
                    },
                };
                self.step = ChargeStep::Dashing { elapsed: 0.0 };
                None
            }
            ChargeStep::Dashing { elapsed } => {
                *elapsed += ctx.delta;

                let arrived = match self.kind {
                    ChargeKind::Steerable => {
                        planar_distance(ctx.position, self.destination) <= config.arrival_threshold
                    }
                    // Без руления: считаем только остаток вдоль зафиксированного курса
                    ChargeKind::Targeted => {
                        planar(self.destination - ctx.position).dot(self.direction)
                            <= config.arrival_threshold
                    }
                };

                let end = if arrived {
                    ChargeEnd::Arrived
                } else if *elapsed >= config.safety_timeout {
                    crate::log_warning(&format!(
                        "⏱️ {:?}: charge hit safety timeout ({:.1}s) before arrival",
                        ctx.boss, config.safety_timeout
                    ));
                    ChargeEnd::TimedOut
                } else {
                    return None;
                };

                end_charge(parts, end, outbox);
                Some(end)
            }
        }
    }
}

/// Single exit of every charge: restores repulsion, hit detection and
/// movement knobs. No-op when no charge is running.
pub fn end_charge(parts: &mut BossParts, end: ChargeEnd, outbox: &mut Outbox) {
    if !parts.charge.is_charging {
        return;
    }

    parts.hits.disable(AttackId::ChargeDash, outbox);
    parts.repulsion.enabled = true;
    parts.movement.reset_multipliers();
    *parts.command = MovementCommand::Stop;

    let was_targeted = parts.charge.is_targeted;
    parts.charge.is_charging = false;
    parts.charge.is_targeted = false;
    parts.charge.last_end = Some(end);

    outbox.trigger("charge_dash_recovery");
    crate::log_info(&format!(
        "🐗 {:?}: charge ended ({:?}, targeted={})",
        outbox.boss(),
        end,
        was_targeted
    ));
}
