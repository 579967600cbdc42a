//! Attack executor: one timed attack from request to recovery.
//!
//! ```text
//! AwaitingResources ─▶ Windup ─▶ Active ─▶ [AwaitingZoneReport] ─▶ Recovery ─▶ done
//! ```
//!
//! - start: cancels pending auto-retracts, requests limbs/plating as needed
//! - Active: hit detection on (or pull for suction attacks)
//! - done: cooldown recorded; limbs left deployed get an auto-retract;
//!   plating raised by the attack is lowered by the attack itself
//!
//! Phase durations are resolved once, when the phase starts.

use bevy::prelude::*;

use crate::catalog::{AttackDescriptor, AttackId, AttackKind, AttackPhase};
use crate::components::MovementCommand;
use crate::events::Outbox;
use crate::form::{BossParts, TickContext};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackStep {
    /// Limbs / plating requested, waiting for them to settle
    AwaitingResources,
    Phase { phase: AttackPhase, remaining: f32 },
    /// Transition attack: active over, zone report not in yet
    AwaitingZoneReport { remaining: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Finished,
    TransitionSucceeded,
    TransitionFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackProgress {
    Running,
    Completed(AttackOutcome),
}

/// Resumable attack routine (only one per boss at a time).
#[derive(Debug, Clone, PartialEq)]
pub struct AttackExecution {
    pub attack: AttackId,
    pub step: AttackStep,
    /// Transition attack only: did the target end up inside the zone
    pub zone_report: Option<bool>,
}

impl AttackExecution {
    pub fn begin(
        descriptor: &AttackDescriptor,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> Self {
        // Новая атака отменяет отложенные auto-retract
        parts.resources.cancel_auto_retracts();
        if descriptor.requires_limbs {
            parts.resources.limbs.request_deploy();
        }
        if descriptor.raises_plating {
            parts.resources.plating.request_deploy();
        }
        parts.resources.flush(outbox);

        *parts.command = match ctx.target {
            Some(target) => MovementCommand::FaceTowards {
                point: target.position,
            },
            None => MovementCommand::Stop,
        };

        crate::log_info(&format!(
            "⚔️ {:?}: attack {:?} started ({:?})",
            ctx.boss, descriptor.id, descriptor.kind
        ));

        let mut execution = Self {
            attack: descriptor.id,
            step: AttackStep::AwaitingResources,
            zone_report: None,
        };
        if resources_ready(descriptor, parts) {
            execution.enter_phase(AttackPhase::Windup, descriptor, parts, ctx, outbox);
        }
        execution
    }

    pub fn is_transition(&self, ctx: &TickContext) -> bool {
        ctx.catalog
            .get(self.attack)
            .is_some_and(|a| a.kind == AttackKind::Transition)
    }

    /// Current attack phase, if past resource setup.
    pub fn phase(&self) -> Option<AttackPhase> {
        match self.step {
            AttackStep::Phase { phase, .. } => Some(phase),
            _ => None,
        }
    }

    pub fn advance(
        &mut self,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> AttackProgress {
        let Some(descriptor) = ctx.catalog.get(self.attack) else {
            crate::log_warning(&format!(
                "⚠️ {:?}: attack {:?} missing from catalog, abandoned",
                ctx.boss, self.attack
            ));
            self.abort(parts, outbox);
            return AttackProgress::Completed(AttackOutcome::Finished);
        };

        match self.step {
            AttackStep::AwaitingResources => {
                if resources_ready(descriptor, parts) {
                    self.enter_phase(AttackPhase::Windup, descriptor, parts, ctx, outbox);
                }
                AttackProgress::Running
            }
            AttackStep::Phase { phase, remaining } => {
                let remaining = remaining - ctx.delta;
                if phase == AttackPhase::Windup {
                    if let Some(target) = ctx.target {
                        *parts.command = MovementCommand::FaceTowards {
                            point: target.position,
                        };
                    }
                }
                if remaining > 0.0 {
                    self.step = AttackStep::Phase { phase, remaining };
                    return AttackProgress::Running;
                }

                match phase {
                    AttackPhase::Windup => {
                        *parts.command = MovementCommand::Stop;
                        self.enter_phase(AttackPhase::Active, descriptor, parts, ctx, outbox);
                        AttackProgress::Running
                    }
                    AttackPhase::Active => {
                        self.leave_active(descriptor, parts, outbox);
                        if descriptor.kind == AttackKind::Transition && self.zone_report.is_none() {
                            self.step = AttackStep::AwaitingZoneReport {
                                remaining: ctx.tuning.transition.zone_report_grace,
                            };
                        } else {
                            self.enter_phase(AttackPhase::Recovery, descriptor, parts, ctx, outbox);
                        }
                        AttackProgress::Running
                    }
                    AttackPhase::Recovery => {
                        AttackProgress::Completed(self.finish(descriptor, parts, ctx, outbox))
                    }
                }
            }
            AttackStep::AwaitingZoneReport { remaining } => {
                let remaining = remaining - ctx.delta;
                if self.zone_report.is_none() && remaining > 0.0 {
                    self.step = AttackStep::AwaitingZoneReport { remaining };
                    return AttackProgress::Running;
                }
                if self.zone_report.is_none() {
                    crate::log_warning(&format!(
                        "⏱️ {:?}: no zone report within {:.1}s, transition counted as failed",
                        ctx.boss, ctx.tuning.transition.zone_report_grace
                    ));
                }
                self.enter_phase(AttackPhase::Recovery, descriptor, parts, ctx, outbox);
                AttackProgress::Running
            }
        }
    }

    /// Preemption (stun/defeat): drop the progression and anything the
    /// attack switched on. Resource transitions are left alone.
    pub fn abort(&mut self, parts: &mut BossParts, outbox: &mut Outbox) {
        parts.hits.disable(self.attack, outbox);
        parts.pull.stop_pull(outbox);
        crate::log(&format!(
            "✋ {:?}: attack {:?} interrupted at {:?}",
            outbox.boss(),
            self.attack,
            self.step
        ));
    }

    fn enter_phase(
        &mut self,
        phase: AttackPhase,
        descriptor: &AttackDescriptor,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) {
        let duration = descriptor.timing.duration(phase, ctx.clips);
        outbox.trigger(descriptor.timing.clip_name(phase));

        if phase == AttackPhase::Active {
            if descriptor.kind == AttackKind::Suction {
                match ctx.target {
                    Some(target) => {
                        let goal = ctx.position + ctx.facing * ctx.tuning.selection.agent_clearance;
                        parts.pull.start_pull(target.entity, goal, duration, outbox);
                    }
                    None => crate::log_warning(&format!(
                        "⚠️ {:?}: {:?} has no target to pull, active phase runs empty",
                        ctx.boss, descriptor.id
                    )),
                }
            } else {
                parts.hits.enable(descriptor.id, outbox);
            }
        }

        self.step = AttackStep::Phase {
            phase,
            remaining: duration,
        };
    }

    fn leave_active(&mut self, descriptor: &AttackDescriptor, parts: &mut BossParts, outbox: &mut Outbox) {
        parts.hits.disable(descriptor.id, outbox);
        if descriptor.kind == AttackKind::Suction {
            parts.pull.stop_pull(outbox);
        }
    }

    fn finish(
        &mut self,
        descriptor: &AttackDescriptor,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> AttackOutcome {
        if descriptor.raises_plating {
            parts.resources.plating.request_retract();
        }
        if descriptor.requires_limbs && parts.resources.limbs.is_deployed() {
            parts.resources.limbs.arm_auto_retract();
        }
        parts.resources.flush(outbox);

        let outcome = match (descriptor.kind, self.zone_report) {
            (AttackKind::Transition, Some(true)) => AttackOutcome::TransitionSucceeded,
            (AttackKind::Transition, _) => AttackOutcome::TransitionFailed,
            _ => AttackOutcome::Finished,
        };
        // Cooldown только за завершённую атаку (прерванная остаётся доступной)
        if outcome == AttackOutcome::Finished {
            parts.cooldowns.mark_used(descriptor, ctx.now);
        }

        crate::log_info(&format!(
            "⚔️ {:?}: attack {:?} finished ({:?})",
            ctx.boss, descriptor.id, outcome
        ));
        outcome
    }
}

fn resources_ready(descriptor: &AttackDescriptor, parts: &BossParts) -> bool {
    (!descriptor.requires_limbs || parts.resources.limbs.is_deployed())
        && (!descriptor.raises_plating || parts.resources.plating.is_deployed())
}
