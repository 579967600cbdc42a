//! Tests for charge execution and combos.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::catalog::{AnimationClips, AttackCatalog, AttackId};
    use crate::charge::{
        end_charge, ChargeEnd, ChargeExecution, ChargeSegment, ChargeStep, ComboProgress,
        ComboRoutine, SegmentStep,
    };
    use crate::components::MovementCommand;
    use crate::config::BossTuning;
    use crate::events::{EncounterSignal, Outbox};
    use crate::form::context::PartsFixture;
    use crate::form::{BossParts, TickContext};

    struct Env {
        tuning: BossTuning,
        catalog: AttackCatalog,
        clips: AnimationClips,
    }

    impl Env {
        fn new() -> Self {
            Self {
                tuning: BossTuning::default(),
                catalog: AttackCatalog::standard(),
                clips: AnimationClips::default(),
            }
        }

        fn ctx(&self) -> TickContext<'_> {
            TickContext::for_test(&self.tuning, &self.catalog, &self.clips)
        }
    }

    fn assert_restored(parts: &BossParts) {
        assert!(!parts.charge.is_charging);
        assert!(!parts.charge.is_targeted);
        assert!(parts.repulsion.enabled);
        assert!(!parts.hits.is_enabled(AttackId::ChargeDash));
        assert_eq!(parts.movement.speed_multiplier, 1.0);
        assert_eq!(parts.movement.turn_multiplier, 1.0);
        assert_eq!(*parts.command, MovementCommand::Stop);
    }

    /// Гоняет windup до конца (hit detection включается на выходе)
    fn finish_windup(
        charge: &mut ChargeExecution,
        parts: &mut BossParts,
        ctx: &TickContext,
        outbox: &mut Outbox,
    ) {
        for _ in 0..120 {
            if matches!(charge.step, ChargeStep::Dashing { .. }) {
                return;
            }
            assert_eq!(charge.advance(parts, ctx, outbox), None);
        }
        panic!("windup never finished");
    }

    #[test]
    fn test_steerable_charge_sequencing_and_arrival() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let destination = Vec3::new(0.0, 0.0, 10.0);
        let mut charge = ChargeExecution::steerable(destination, &mut parts, &ctx, &mut outbox);

        // Repulsion выключена сразу, hit detection: только после windup
        assert!(parts.charge.is_charging);
        assert!(!parts.charge.is_targeted);
        assert!(!parts.repulsion.enabled);
        assert!(!parts.hits.is_enabled(AttackId::ChargeDash));
        assert_eq!(parts.movement.speed_multiplier, env.tuning.charge.speed_multiplier);

        finish_windup(&mut charge, &mut parts, &ctx, &mut outbox);
        assert!(parts.hits.is_enabled(AttackId::ChargeDash));
        assert_eq!(*parts.command, MovementCommand::SteerTo { destination });

        let arrived = TickContext {
            position: Vec3::new(0.0, 0.0, 9.5),
            ..env.ctx()
        };
        assert_eq!(
            charge.advance(&mut parts, &arrived, &mut outbox),
            Some(ChargeEnd::Arrived)
        );
        assert_restored(&parts);
        assert_eq!(parts.charge.last_end, Some(ChargeEnd::Arrived));
    }

    #[test]
    fn test_targeted_charge_locks_heading_with_overshoot() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let target = Vec3::new(0.0, 0.0, 3.0);
        let mut charge = ChargeExecution::targeted(target, &mut parts, &ctx, &mut outbox);

        assert!(parts.charge.is_targeted);
        assert_eq!(charge.destination, Vec3::new(0.0, 0.0, 3.0 + env.tuning.charge.overshoot));
        assert_eq!(parts.movement.turn_multiplier, env.tuning.charge.targeted_turn_multiplier);

        finish_windup(&mut charge, &mut parts, &ctx, &mut outbox);
        let locked = MovementCommand::DashLocked { direction: Vec3::Z };
        assert_eq!(*parts.command, locked);

        // Цель ушла вбок: курс не меняется
        let dodged = TickContext {
            position: Vec3::new(0.0, 0.0, 2.0),
            target: ctx.target.map(|mut t| {
                t.position = Vec3::new(6.0, 0.0, 3.0);
                t
            }),
            ..env.ctx()
        };
        assert_eq!(charge.advance(&mut parts, &dodged, &mut outbox), None);
        assert_eq!(*parts.command, locked);

        // Прибытие считается вдоль зафиксированного курса
        let past = TickContext {
            position: Vec3::new(1.0, 0.0, 7.5),
            ..env.ctx()
        };
        assert_eq!(
            charge.advance(&mut parts, &past, &mut outbox),
            Some(ChargeEnd::Arrived)
        );
        assert_restored(&parts);
    }

    #[test]
    fn test_safety_timeout_restores_everything() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let mut charge =
            ChargeExecution::steerable(Vec3::new(0.0, 0.0, 30.0), &mut parts, &ctx, &mut outbox);
        finish_windup(&mut charge, &mut parts, &ctx, &mut outbox);

        // Тело не двигается: упёрлось во что-то без коллизии
        let mut end = None;
        for _ in 0..600 {
            end = charge.advance(&mut parts, &ctx, &mut outbox);
            if end.is_some() {
                break;
            }
        }

        assert_eq!(end, Some(ChargeEnd::TimedOut));
        assert_restored(&parts);
    }

    #[test]
    fn test_external_end_is_single_and_observed_by_routine() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let mut charge =
            ChargeExecution::steerable(Vec3::new(0.0, 0.0, 10.0), &mut parts, &ctx, &mut outbox);
        finish_windup(&mut charge, &mut parts, &ctx, &mut outbox);

        end_charge(&mut parts, ChargeEnd::Obstacle, &mut outbox);
        end_charge(&mut parts, ChargeEnd::Preempted, &mut outbox);
        assert_restored(&parts);

        let recoveries = outbox
            .signals()
            .iter()
            .filter(|s| {
                matches!(s, EncounterSignal::AnimationTrigger { name, .. } if name == "charge_dash_recovery")
            })
            .count();
        assert_eq!(recoveries, 1);

        // Routine видит, что рывок уже закончен
        assert_eq!(
            charge.advance(&mut parts, &ctx, &mut outbox),
            Some(ChargeEnd::Obstacle)
        );
    }

    #[test]
    fn test_combo_skips_invalid_segments() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let valid = ChargeSegment::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        let mut combo = ComboRoutine::new(
            "broken",
            vec![
                ChargeSegment::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO),
                ChargeSegment::new(Vec3::ZERO, Vec3::new(0.2, 0.0, 0.0)),
                valid,
            ],
        );

        assert_eq!(combo.advance(&mut parts, &ctx, &mut outbox), ComboProgress::Running);

        let run = combo.current().unwrap();
        assert_eq!(run.segment, valid);
        // Уже на старте: сразу пауза
        assert!(matches!(run.step, SegmentStep::Pause { .. }));
        assert_eq!(combo.remaining_segments(), 0);
    }

    #[test]
    fn test_combo_skips_unreachable_start() {
        let env = Env::new();
        let ctx = TickContext {
            has_valid_path: false,
            ..env.ctx()
        };
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let mut combo = ComboRoutine::new(
            "far",
            vec![ChargeSegment::new(
                Vec3::new(20.0, 0.0, 0.0),
                Vec3::new(20.0, 0.0, 15.0),
            )],
        );

        // Первый тик: навигация ещё считает путь
        assert_eq!(combo.advance(&mut parts, &ctx, &mut outbox), ComboProgress::Running);
        // Второй: пути нет: сегмент пропущен, комбо закончено
        assert_eq!(combo.advance(&mut parts, &ctx, &mut outbox), ComboProgress::Finished);
        assert!(!parts.charge.is_charging);
        assert_eq!(*parts.command, MovementCommand::Stop);
    }

    fn windup_ticks(env: &Env) -> usize {
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let mut charge =
            ChargeExecution::steerable(Vec3::new(0.0, 0.0, 10.0), &mut parts, &ctx, &mut outbox);
        let mut ticks = 0;
        while matches!(charge.step, ChargeStep::Windup { .. }) {
            charge.advance(&mut parts, &ctx, &mut outbox);
            ticks += 1;
            assert!(ticks < 600, "windup never finished");
        }
        ticks
    }

    #[test]
    fn test_windup_follows_charge_dash_clip() {
        // Базовая длина ChargeDash windup 0.6s
        let env = Env::new();
        assert!((36..=37).contains(&windup_ticks(&env)));

        let mut short = Env::new();
        short.clips.insert("charge_dash_windup", 0.25);
        assert!((15..=16).contains(&windup_ticks(&short)));
    }

    #[test]
    fn test_segment_pause_turn_then_charge() {
        let env = Env::new();
        let ctx = env.ctx();
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        // Старт под боссом, конец прямо по курсу (+Z)
        let mut combo = ComboRoutine::new(
            "line",
            vec![ChargeSegment::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 12.0))],
        );

        let mut ticks = 0;
        while !parts.charge.is_charging {
            assert_eq!(combo.advance(&mut parts, &ctx, &mut outbox), ComboProgress::Running);
            ticks += 1;
            assert!(ticks < 120, "charge never started");
        }

        // pause_seconds 0.4 при 60Hz
        assert!(ticks >= 24);
        assert!(matches!(
            combo.current().map(|run| run.step),
            Some(SegmentStep::Charge(_))
        ));
        assert!(!parts.repulsion.enabled);
    }
}
