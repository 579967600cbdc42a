//! Stun entry/exit and the validation rules for what may cause one.

use crate::catalog::{AttackCatalog, AttackId, AttackPhase};
use crate::charge::ChargeRuntime;
use crate::components::MovementCommand;
use crate::events::{EncounterSignal, Outbox};
use crate::form::{abandon_routine, resume_after_stun, AttackExecution, BossParts};
use crate::interrupt::{StunKind, StunPhase, StunStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunOutcome {
    Entered,
    /// A stun was already running; the new one is dropped
    AlreadyStunned,
}

/// Parry counts only for the attack actually in flight, only while its hit
/// window (Active phase) is open, and only if it is parryable.
pub fn parry_is_valid(
    in_flight: Option<&AttackExecution>,
    reported: AttackId,
    catalog: &AttackCatalog,
) -> bool {
    in_flight.is_some_and(|exec| exec.attack == reported && exec.phase() == Some(AttackPhase::Active))
        && catalog.get(reported).is_some_and(|a| a.parryable)
}

/// Obstacle collisions stun only during a targeted charge.
pub fn obstacle_stuns(charge: &ChargeRuntime) -> bool {
    charge.is_charging && charge.is_targeted
}

/// Enter a stun: halt the attack routine (resources untouched), kill all
/// hit detection, zero movement.
pub fn enter_stun(
    kind: StunKind,
    duration: f32,
    parts: &mut BossParts,
    outbox: &mut Outbox,
) -> StunOutcome {
    if !parts.stun.begin(kind, duration) {
        crate::log(&format!(
            "💫 {:?}: {:?} stun ignored, already stunned ({:?})",
            outbox.boss(),
            kind,
            parts.stun.kind()
        ));
        return StunOutcome::AlreadyStunned;
    }

    abandon_routine(parts, outbox);
    parts.hits.disable_all(outbox);
    parts.movement.freeze();
    *parts.command = MovementCommand::Stop;

    announce_phase(kind, StunPhase::Windup, outbox);
    crate::log_info(&format!(
        "💫 {:?}: stunned ({:?}, {:.1}s)",
        outbox.boss(),
        kind,
        duration
    ));
    StunOutcome::Entered
}

/// Advance the stun timer; on exit restore movement once and re-arm
/// auto-retract for anything left deployed.
pub fn advance_stun(
    parts: &mut BossParts,
    delta: f32,
    decision_interval: f32,
    outbox: &mut Outbox,
) -> StunStep {
    let step = parts.stun.tick(delta);

    match step {
        StunStep::Idle | StunStep::Holding => {}
        StunStep::Entered(phase) => {
            if phase == StunPhase::Active {
                parts.hits.disable_all(outbox);
            }
            announce_phase(parts.stun.kind(), phase, outbox);
        }
        StunStep::Finished(kind) => {
            if parts.movement.unfreeze() {
                outbox.push(EncounterSignal::MovementRestored { boss: outbox.boss() });
            }
            parts.resources.rearm_deployed();
            parts.resources.flush(outbox);
            resume_after_stun(parts, decision_interval);

            outbox.push(EncounterSignal::StunChanged {
                boss: outbox.boss(),
                kind,
                phase: None,
            });
            crate::log_info(&format!("💫 {:?}: stun over ({:?})", outbox.boss(), kind));
        }
    }

    step
}

/// Defeat drops a running stun without recovery.
pub(crate) fn cancel_for_defeat(parts: &mut BossParts) {
    parts.stun.clear();
}

fn announce_phase(kind: StunKind, phase: StunPhase, outbox: &mut Outbox) {
    outbox.trigger(phase.clip_name());
    outbox.push(EncounterSignal::StunChanged {
        boss: outbox.boss(),
        kind,
        phase: Some(phase),
    });
}
