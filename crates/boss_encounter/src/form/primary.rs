//! Primary form loop: decide → (attack | close distance) → decide …

use rand::Rng;

use crate::catalog::AttackKind;
use crate::components::{planar_distance, MovementCommand};
use crate::events::{EncounterSignal, Outbox};
use crate::form::{
    AttackExecution, AttackOutcome, AttackProgress, BossParts, ControllerRoutine, Form,
    SecondaryLoop, TickContext,
};
use crate::selector::{select_attack, Selection, SelectionInput};

#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryStep {
    /// Pause before the next selector query
    Deciding { wait: f32 },
    /// No attack in range: walk toward the target, then re-query
    ClosingDistance { remaining: f32 },
    Attacking(AttackExecution),
}

impl Default for PrimaryStep {
    fn default() -> Self {
        PrimaryStep::Deciding { wait: 0.0 }
    }
}

/// One tick of the Primary loop. Returns the routine to continue with.
pub fn advance_primary<R: Rng + ?Sized>(
    step: PrimaryStep,
    parts: &mut BossParts,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) -> ControllerRoutine {
    let selection_config = &ctx.tuning.selection;

    let next = match step {
        PrimaryStep::Deciding { wait } => {
            let wait = wait - ctx.delta;
            if wait > 0.0 {
                PrimaryStep::Deciding { wait }
            } else {
                decide(parts, ctx, rng, outbox)
            }
        }
        PrimaryStep::ClosingDistance { remaining } => {
            let remaining = remaining - ctx.delta;
            match ctx.target {
                Some(target) if remaining > 0.0 => {
                    *parts.command = MovementCommand::MoveToPosition {
                        target: target.position,
                        speed_scale: 1.0,
                    };
                    PrimaryStep::ClosingDistance { remaining }
                }
                // Время вышло (или цель пропала): переспрашиваем selector
                _ => PrimaryStep::Deciding { wait: 0.0 },
            }
        }
        PrimaryStep::Attacking(mut execution) => match execution.advance(parts, ctx, outbox) {
            AttackProgress::Running => PrimaryStep::Attacking(execution),
            AttackProgress::Completed(AttackOutcome::Finished) => {
                let counts = ctx
                    .catalog
                    .get(execution.attack)
                    .is_some_and(|a| a.is_regular() || a.kind == AttackKind::TopExclusive);
                if counts {
                    parts.form.record_success();
                    crate::log(&format!(
                        "📈 {:?}: attack counter {}/{}",
                        ctx.boss, parts.form.attack_counter, parts.form.attack_threshold
                    ));
                }
                PrimaryStep::Deciding {
                    wait: selection_config.decision_interval,
                }
            }
            AttackProgress::Completed(AttackOutcome::TransitionSucceeded) => {
                parts.form.switch_to(Form::Secondary, selection_config, rng);
                outbox.push(EncounterSignal::FormChanged {
                    boss: ctx.boss,
                    form: Form::Secondary,
                });
                crate::log_info(&format!(
                    "🔄 {:?}: Primary → Secondary (transition succeeded, new threshold {})",
                    ctx.boss, parts.form.attack_threshold
                ));
                return ControllerRoutine::Secondary(SecondaryLoop::default());
            }
            AttackProgress::Completed(AttackOutcome::TransitionFailed) => {
                parts.form.record_failed_transition();
                crate::log_info(&format!(
                    "🔁 {:?}: transition failed (target outside zone), counter reset ({} failures)",
                    ctx.boss, parts.form.failed_transitions
                ));
                PrimaryStep::Deciding {
                    wait: selection_config.decision_interval,
                }
            }
        },
    };

    ControllerRoutine::Primary(next)
}

fn decide<R: Rng + ?Sized>(
    parts: &mut BossParts,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) -> PrimaryStep {
    let config = &ctx.tuning.selection;

    let Some(target) = ctx.target else {
        crate::log_warning(&format!(
            "⚠️ {:?}: no tracked target, holding position",
            ctx.boss
        ));
        *parts.command = MovementCommand::Stop;
        return PrimaryStep::Deciding {
            wait: config.decision_interval.max(ctx.delta),
        };
    };

    let input = SelectionInput {
        distance: planar_distance(ctx.position, target.position),
        mounted: parts
            .form
            .mounted_within_grace(ctx.now, config.mount_grace_seconds),
        now: ctx.now,
    };

    match select_attack(ctx.catalog, parts.cooldowns, parts.form, &input, config, rng) {
        Selection::Attack(id) | Selection::ForceTransition(id) => match ctx.catalog.get(id) {
            Some(descriptor) => {
                PrimaryStep::Attacking(AttackExecution::begin(descriptor, parts, ctx, outbox))
            }
            None => PrimaryStep::Deciding {
                wait: config.decision_interval,
            },
        },
        Selection::CloseDistance => {
            crate::log(&format!(
                "🏃 {:?}: nothing in range at {:.1}, closing distance",
                ctx.boss, input.distance
            ));
            *parts.command = MovementCommand::MoveToPosition {
                target: target.position,
                speed_scale: 1.0,
            };
            PrimaryStep::ClosingDistance {
                remaining: config.close_distance_duration,
            }
        }
        Selection::Wait => {
            *parts.command = MovementCommand::FaceTowards {
                point: target.position,
            };
            PrimaryStep::Deciding {
                wait: config.decision_interval.max(ctx.delta),
            }
        }
    }
}
