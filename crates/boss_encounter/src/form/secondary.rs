//! Secondary form loop: N random combos, then one committed targeted
//! charge, then again.
//!
//! If the target can't be reached for the final charge the loop falls back
//! to a melee substitute (any in-range, off-cooldown melee attack).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::AttackKind;
use crate::charge::{ChargeExecution, ComboProgress, ComboRoutine};
use crate::components::{angle_between, planar_distance, MovementCommand};
use crate::events::Outbox;
use crate::form::{AttackExecution, AttackProgress, BossParts, Form, TickContext};
use crate::selector::effective_distance;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SecondaryStage {
    /// Roll the combo count for a new cycle
    #[default]
    Start,
    Combo(ComboRoutine),
    /// Face the target before the committed charge
    FinalTurn { elapsed: f32 },
    FinalCharge(ChargeExecution),
    /// Melee fallback when the dash target is unreachable
    Substitute(AttackExecution),
}

/// Why the loop restarted without doing anything this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStall {
    NoCombos,
    EmptyCombo,
    NoTarget,
    NoMelee,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecondaryLoop {
    /// Combos left in this cycle (after the current one)
    pub combos_remaining: u32,
    pub stage: SecondaryStage,
    pub cycles_completed: u32,
    /// Stalls already warned about; cleared once the loop acts again
    pub stalls: Vec<LoopStall>,
}

impl SecondaryLoop {
    /// Attack executing inside this loop (melee substitute only).
    pub fn attack_in_flight(&self) -> Option<&AttackExecution> {
        match &self.stage {
            SecondaryStage::Substitute(execution) => Some(execution),
            _ => None,
        }
    }

    pub fn attack_in_flight_mut(&mut self) -> Option<&mut AttackExecution> {
        match &mut self.stage {
            SecondaryStage::Substitute(execution) => Some(execution),
            _ => None,
        }
    }

    /// Preemption: drop the current stage, restoring what it switched on.
    pub fn abort(&mut self, parts: &mut BossParts, outbox: &mut Outbox) {
        if let SecondaryStage::Substitute(execution) = &mut self.stage {
            execution.abort(parts, outbox);
        }
        if let SecondaryStage::Combo(combo) = &self.stage {
            crate::log(&format!(
                "✋ {:?}: combo '{}' abandoned ({} segments left)",
                outbox.boss(),
                combo.name,
                combo.remaining_segments()
            ));
        }
        self.stage = SecondaryStage::Start;
    }

    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        parts: &mut BossParts,
        ctx: &TickContext,
        rng: &mut R,
        outbox: &mut Outbox,
    ) {
        let config = &ctx.tuning.charge;

        let stage = std::mem::take(&mut self.stage);
        self.stage = match stage {
            SecondaryStage::Start => {
                self.combos_remaining =
                    rng.gen_range(config.combos_per_cycle_min..=config.combos_per_cycle_max);
                if self.stalls.is_empty() {
                    crate::log(&format!(
                        "🎲 {:?}: charge cycle with {} combos",
                        ctx.boss, self.combos_remaining
                    ));
                }
                self.next_combo(ctx, rng)
            }
            SecondaryStage::Combo(mut combo) => match combo.advance(parts, ctx, outbox) {
                ComboProgress::Running => SecondaryStage::Combo(combo),
                ComboProgress::Finished => {
                    crate::log(&format!("🐗 {:?}: combo '{}' finished", ctx.boss, combo.name));
                    self.next_combo(ctx, rng)
                }
            },
            SecondaryStage::FinalTurn { elapsed } => self.final_turn(elapsed, parts, ctx, outbox),
            SecondaryStage::FinalCharge(mut charge) => match charge.advance(parts, ctx, outbox) {
                None => SecondaryStage::FinalCharge(charge),
                Some(end) => {
                    crate::log_info(&format!(
                        "🎯 {:?}: committed charge done ({:?})",
                        ctx.boss, end
                    ));
                    self.complete_cycle()
                }
            },
            SecondaryStage::Substitute(mut execution) => {
                match execution.advance(parts, ctx, outbox) {
                    AttackProgress::Running => SecondaryStage::Substitute(execution),
                    AttackProgress::Completed(_) => self.complete_cycle(),
                }
            }
        };
    }

    fn next_combo<R: Rng + ?Sized>(&mut self, ctx: &TickContext, rng: &mut R) -> SecondaryStage {
        if self.combos_remaining == 0 {
            return SecondaryStage::FinalTurn { elapsed: 0.0 };
        }
        self.combos_remaining -= 1;

        match ctx.tuning.charge.combos.choose(rng) {
            Some(config) if !config.segments.is_empty() => {
                crate::log(&format!("🐗 {:?}: combo '{}' begins", ctx.boss, config.name));
                self.stalls.clear();
                SecondaryStage::Combo(ComboRoutine::from_config(config))
            }
            Some(config) => {
                self.warn_stall(LoopStall::EmptyCombo, || {
                    format!("⚠️ {:?}: combo '{}' has no segments, skipped", ctx.boss, config.name)
                });
                self.next_combo(ctx, rng)
            }
            None => {
                self.warn_stall(LoopStall::NoCombos, || {
                    format!(
                        "⚠️ {:?}: no charge combos configured, going straight to the committed charge",
                        ctx.boss
                    )
                });
                self.combos_remaining = 0;
                SecondaryStage::FinalTurn { elapsed: 0.0 }
            }
        }
    }

    fn final_turn(
        &mut self,
        elapsed: f32,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) -> SecondaryStage {
        let config = &ctx.tuning.charge;

        let Some(target) = ctx.target else {
            self.warn_stall(LoopStall::NoTarget, || {
                format!("⚠️ {:?}: no tracked target for committed charge, cycle restarts", ctx.boss)
            });
            *parts.command = MovementCommand::Stop;
            return self.complete_cycle();
        };

        if !ctx.has_valid_path {
            return self.substitute(parts, ctx, outbox);
        }

        let elapsed = elapsed + ctx.delta;
        *parts.command = MovementCommand::FaceTowards {
            point: target.position,
        };

        let aligned = angle_between(ctx.facing, target.position - ctx.position)
            <= config.facing_tolerance_degrees.to_radians();
        if aligned || elapsed >= config.turn_timeout {
            self.stalls.clear();
            SecondaryStage::FinalCharge(ChargeExecution::targeted(target.position, parts, ctx, outbox))
        } else {
            SecondaryStage::FinalTurn { elapsed }
        }
    }

    fn substitute(&mut self, parts: &mut BossParts, ctx: &TickContext, outbox: &mut Outbox) -> SecondaryStage {
        let distance = ctx
            .target
            .map(|t| planar_distance(ctx.position, t.position))
            .unwrap_or(f32::MAX);
        let effective = effective_distance(distance, &ctx.tuning.selection);

        let melee = ctx.catalog.iter().find(|a| {
            a.form == Form::Primary
                && a.kind == AttackKind::Melee
                && a.in_range(effective)
                && parts.cooldowns.is_off_cooldown(a.id, ctx.now)
        });

        match melee {
            Some(descriptor) => {
                crate::log_warning(&format!(
                    "⚠️ {:?}: dash target unreachable, melee substitute {:?}",
                    ctx.boss, descriptor.id
                ));
                self.stalls.clear();
                SecondaryStage::Substitute(AttackExecution::begin(descriptor, parts, ctx, outbox))
            }
            None => {
                self.warn_stall(LoopStall::NoMelee, || {
                    format!(
                        "⚠️ {:?}: dash target unreachable and no melee in range, cycle restarts",
                        ctx.boss
                    )
                });
                self.complete_cycle()
            }
        }
    }

    /// Один warning на причину, пока цикл крутится вхолостую
    fn warn_stall(&mut self, stall: LoopStall, message: impl FnOnce() -> String) {
        if !self.stalls.contains(&stall) {
            crate::log_warning(&message());
            self.stalls.push(stall);
        }
    }

    fn complete_cycle(&mut self) -> SecondaryStage {
        self.cycles_completed += 1;
        self.combos_remaining = 0;
        SecondaryStage::Start
    }
}
