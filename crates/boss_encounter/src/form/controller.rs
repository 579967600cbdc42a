//! Controller routine: which loop the boss is running and its step function.

use bevy::prelude::*;
use rand::Rng;

use crate::charge::{end_charge, ChargeEnd};
use crate::components::MovementCommand;
use crate::events::{EncounterSignal, Outbox};
use crate::form::primary::advance_primary;
use crate::form::{AttackExecution, BossParts, Form, PrimaryStep, SecondaryLoop, TickContext};

/// Top-level routine of one boss. Only one attack routine is ever active.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum ControllerRoutine {
    Primary(PrimaryStep),
    Secondary(SecondaryLoop),
    /// Parked by the interruption handler until the stun ends
    Suspended,
    /// Terminal
    Defeated,
}

impl Default for ControllerRoutine {
    fn default() -> Self {
        ControllerRoutine::Primary(PrimaryStep::default())
    }
}

impl ControllerRoutine {
    pub fn attack_in_flight(&self) -> Option<&AttackExecution> {
        match self {
            ControllerRoutine::Primary(PrimaryStep::Attacking(execution)) => Some(execution),
            ControllerRoutine::Secondary(secondary) => secondary.attack_in_flight(),
            _ => None,
        }
    }

    pub fn attack_in_flight_mut(&mut self) -> Option<&mut AttackExecution> {
        match self {
            ControllerRoutine::Primary(PrimaryStep::Attacking(execution)) => Some(execution),
            ControllerRoutine::Secondary(secondary) => secondary.attack_in_flight_mut(),
            _ => None,
        }
    }

    pub fn is_defeated(&self) -> bool {
        matches!(self, ControllerRoutine::Defeated)
    }

    /// Short label for logs/snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            ControllerRoutine::Primary(PrimaryStep::Deciding { .. }) => "primary:deciding",
            ControllerRoutine::Primary(PrimaryStep::ClosingDistance { .. }) => "primary:closing",
            ControllerRoutine::Primary(PrimaryStep::Attacking(_)) => "primary:attacking",
            ControllerRoutine::Secondary(_) => "secondary",
            ControllerRoutine::Suspended => "suspended",
            ControllerRoutine::Defeated => "defeated",
        }
    }
}

/// One controller tick. Does nothing while stunned or defeated.
pub fn advance_controller<R: Rng + ?Sized>(
    parts: &mut BossParts,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) {
    if parts.stun.is_active() || parts.routine.is_defeated() {
        return;
    }

    let routine = std::mem::take(parts.routine);
    let next = match routine {
        ControllerRoutine::Primary(step) => advance_primary(step, parts, ctx, rng, outbox),
        ControllerRoutine::Secondary(mut secondary) => {
            secondary.advance(parts, ctx, rng, outbox);
            ControllerRoutine::Secondary(secondary)
        }
        // Стан закончился без resume (не должно случаться): продолжаем по форме
        ControllerRoutine::Suspended => resumed_routine(parts.form.current_form, ctx),
        ControllerRoutine::Defeated => ControllerRoutine::Defeated,
    };
    *parts.routine = next;

    parts.resources.flush(outbox);
}

/// Drop the current routine (stun entry / defeat). Everything the routine
/// switched on is restored; resource transitions in flight are not touched.
pub fn abandon_routine(parts: &mut BossParts, outbox: &mut Outbox) {
    let routine = std::mem::replace(parts.routine, ControllerRoutine::Suspended);
    match routine {
        ControllerRoutine::Primary(PrimaryStep::Attacking(mut execution)) => {
            execution.abort(parts, outbox);
        }
        ControllerRoutine::Secondary(mut secondary) => {
            secondary.abort(parts, outbox);
        }
        ControllerRoutine::Defeated => {
            *parts.routine = ControllerRoutine::Defeated;
        }
        _ => {}
    }

    end_charge(parts, ChargeEnd::Preempted, outbox);
    parts.pull.stop_pull(outbox);
    *parts.command = MovementCommand::Stop;
}

/// Stun over: pick the loop back up according to the current form.
pub fn resume_after_stun(parts: &mut BossParts, decision_interval: f32) {
    if !matches!(parts.routine, ControllerRoutine::Suspended) {
        return;
    }
    *parts.routine = match parts.form.current_form {
        Form::Primary => ControllerRoutine::Primary(PrimaryStep::Deciding {
            wait: decision_interval,
        }),
        Form::Secondary => ControllerRoutine::Secondary(SecondaryLoop::default()),
    };
}

fn resumed_routine(form: Form, ctx: &TickContext) -> ControllerRoutine {
    match form {
        Form::Primary => ControllerRoutine::Primary(PrimaryStep::Deciding {
            wait: ctx.tuning.selection.decision_interval,
        }),
        Form::Secondary => ControllerRoutine::Secondary(SecondaryLoop::default()),
    }
}

/// Terminal defeat from either form. Never re-entered.
///
/// Returns false if the boss was already defeated.
pub fn defeat(parts: &mut BossParts, outbox: &mut Outbox) -> bool {
    if parts.routine.is_defeated() {
        return false;
    }

    abandon_routine(parts, outbox);
    crate::interrupt::handler::cancel_for_defeat(parts);
    parts.hits.disable_all(outbox);
    parts.resources.force_neutral();
    parts.resources.flush(outbox);
    parts.movement.freeze();
    *parts.routine = ControllerRoutine::Defeated;

    outbox.trigger("defeated");
    outbox.push(EncounterSignal::Defeated { boss: outbox.boss() });
    crate::log_info(&format!("💀 {:?}: defeated", outbox.boss()));
    true
}
