//! Arena callbacks → state changes of one boss.
//!
//! Called once per callback, before any routine advances this tick.

use rand::Rng;

use crate::charge::{end_charge, ChargeEnd};
use crate::components::PanelDamage;
use crate::events::{ArenaCallback, EncounterSignal, Outbox};
use crate::form::{defeat, BossParts, Form, TickContext};
use crate::interrupt::{enter_stun, obstacle_stuns, parry_is_valid, StunKind, StunOutcome};

pub fn apply_arena_callback<R: Rng + ?Sized>(
    callback: &ArenaCallback,
    parts: &mut BossParts,
    ctx: &TickContext,
    rng: &mut R,
    outbox: &mut Outbox,
) {
    if parts.routine.is_defeated() {
        crate::log(&format!("💀 {:?}: defeated, {:?} ignored", ctx.boss, callback));
        return;
    }

    match callback {
        ArenaCallback::HealthDepleted { .. } => {
            defeat(parts, outbox);
        }

        ArenaCallback::ParryReported { attack, .. } => {
            let in_flight = parts.routine.attack_in_flight();
            if !parry_is_valid(in_flight, *attack, ctx.catalog) {
                // Не ошибка: чужой/непарируемый удар или закрытое окно просто игнорируются
                crate::log(&format!(
                    "🛡️ {:?}: parry of {:?} ignored (in flight: {:?})",
                    ctx.boss,
                    attack,
                    in_flight.map(|exec| (exec.attack, exec.step))
                ));
                return;
            }
            crate::log_info(&format!("🛡️ {:?}: {:?} parried", ctx.boss, attack));
            enter_stun(StunKind::Parry, ctx.tuning.stun.parry_duration, parts, outbox);
        }

        ArenaCallback::ObstacleCollision { obstacle, .. } => {
            if !parts.charge.is_charging {
                return;
            }
            if !obstacle_stuns(parts.charge) {
                // Steerable: просто стоп, без стана
                crate::log(&format!(
                    "🪨 {:?}: steerable charge hit obstacle {}, stopping",
                    ctx.boss, obstacle
                ));
                end_charge(parts, ChargeEnd::Obstacle, outbox);
                return;
            }

            crate::log_info(&format!(
                "🪨 {:?}: targeted charge slammed into obstacle {}",
                ctx.boss, obstacle
            ));
            end_charge(parts, ChargeEnd::Obstacle, outbox);
            let outcome = enter_stun(
                StunKind::ObstacleCollision,
                ctx.tuning.stun.obstacle_duration,
                parts,
                outbox,
            );
            if outcome == StunOutcome::Entered && parts.form.current_form == Form::Secondary {
                parts.form.switch_to(Form::Primary, &ctx.tuning.selection, rng);
                outbox.push(EncounterSignal::FormChanged {
                    boss: ctx.boss,
                    form: Form::Primary,
                });
                crate::log_info(&format!(
                    "🔄 {:?}: Secondary → Primary (obstacle stun, new threshold {})",
                    ctx.boss, parts.form.attack_threshold
                ));
            }
        }

        ArenaCallback::TargetEnteredZone { inside, .. } => {
            let is_transition = |id| {
                ctx.catalog
                    .transition_attack()
                    .is_some_and(|t| t.id == id)
            };
            match parts.routine.attack_in_flight_mut() {
                Some(execution) if is_transition(execution.attack) => {
                    execution.zone_report = Some(*inside);
                    crate::log(&format!("🎯 {:?}: zone report inside={}", ctx.boss, inside));
                }
                _ => crate::log_warning(&format!(
                    "⚠️ {:?}: zone report with no transition attack in flight, ignored",
                    ctx.boss
                )),
            }
        }

        ArenaCallback::TargetMounted { mounted, .. } => {
            parts.form.set_mounted(*mounted, ctx.now);
            crate::log(&format!("🧗 {:?}: target mounted={}", ctx.boss, mounted));
        }

        ArenaCallback::HitboxContact { attack, target, .. } => {
            if !parts.hits.register_contact(*attack, *target) {
                return;
            }
            let amount = ctx.catalog.get(*attack).map_or(0.0, |a| a.damage);
            outbox.push(EncounterSignal::DamageRequest {
                boss: ctx.boss,
                target: *target,
                amount,
            });
            crate::log(&format!(
                "💥 {:?}: {:?} hit {:?} for {}",
                ctx.boss, attack, target, amount
            ));
        }

        ArenaCallback::PanelDamaged { panel, amount, .. } => {
            match parts.panels.apply_damage(*panel, *amount) {
                PanelDamage::Destroyed => {
                    outbox.push(EncounterSignal::PanelDestroyed {
                        boss: ctx.boss,
                        panel: *panel,
                    });
                    crate::log_info(&format!("🧱 {:?}: panel {} destroyed", ctx.boss, panel));
                }
                PanelDamage::Damaged { remaining } => {
                    crate::log(&format!(
                        "🧱 {:?}: panel {} at {:.0} hp",
                        ctx.boss, panel, remaining
                    ));
                }
                PanelDamage::Ignored => {}
            }
        }
    }
}
