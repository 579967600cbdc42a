//! Tests for stun entry/exit.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::arbitration::{BodyResources, ResourceState, TransitionDirection};
    use crate::catalog::{AnimationClips, AttackCatalog, AttackId, AttackPhase};
    use crate::charge::ChargeRuntime;
    use crate::components::MovementCommand;
    use crate::config::BossTuning;
    use crate::events::{EncounterSignal, Outbox};
    use crate::form::context::PartsFixture;
    use crate::form::{AttackExecution, AttackStep, ControllerRoutine, PrimaryStep, TickContext};
    use crate::interrupt::{
        advance_stun, enter_stun, obstacle_stuns, parry_is_valid, StunKind, StunOutcome,
        StunPhase, StunStep,
    };

    const DELTA: f32 = 0.1;

    fn run_stun_to_end(fixture: &mut PartsFixture, outbox: &mut Outbox) -> usize {
        let mut ticks = 0;
        let mut parts = fixture.parts();
        while parts.stun.is_active() {
            advance_stun(&mut parts, DELTA, 0.4, outbox);
            ticks += 1;
            assert!(ticks < 1000, "stun never finished");
        }
        ticks
    }

    fn swinging(attack: AttackId, phase: AttackPhase) -> AttackExecution {
        AttackExecution {
            attack,
            step: AttackStep::Phase {
                phase,
                remaining: 0.2,
            },
            zone_report: None,
        }
    }

    #[test]
    fn test_parry_requires_in_flight_parryable_attack() {
        let catalog = AttackCatalog::standard();
        let left = swinging(AttackId::ClawSwipeLeft, AttackPhase::Active);

        assert!(parry_is_valid(Some(&left), AttackId::ClawSwipeLeft, &catalog));
        // Другая атака в полёте
        let right = swinging(AttackId::ClawSwipeRight, AttackPhase::Active);
        assert!(!parry_is_valid(Some(&right), AttackId::ClawSwipeLeft, &catalog));
        // Ничего не в полёте
        assert!(!parry_is_valid(None, AttackId::ClawSwipeLeft, &catalog));
        // Tail sweep не парируется
        let sweep = swinging(AttackId::TailSweep, AttackPhase::Active);
        assert!(!parry_is_valid(Some(&sweep), AttackId::TailSweep, &catalog));
    }

    #[test]
    fn test_parry_only_inside_hit_window() {
        let catalog = AttackCatalog::standard();
        let id = AttackId::ClawSwipeLeft;

        let awaiting = AttackExecution {
            attack: id,
            step: AttackStep::AwaitingResources,
            zone_report: None,
        };
        assert!(!parry_is_valid(Some(&awaiting), id, &catalog));
        assert!(!parry_is_valid(Some(&swinging(id, AttackPhase::Windup)), id, &catalog));
        assert!(parry_is_valid(Some(&swinging(id, AttackPhase::Active)), id, &catalog));
        assert!(!parry_is_valid(Some(&swinging(id, AttackPhase::Recovery)), id, &catalog));
    }

    #[test]
    fn test_obstacle_stuns_only_targeted_charge() {
        let mut charge = ChargeRuntime::default();
        assert!(!obstacle_stuns(&charge));

        charge.is_charging = true;
        assert!(!obstacle_stuns(&charge));

        charge.is_targeted = true;
        assert!(obstacle_stuns(&charge));
    }

    #[test]
    fn test_stun_halts_attack_but_not_resources() {
        let tuning = BossTuning::default();
        let catalog = AttackCatalog::standard();
        let clips = AnimationClips::default();
        let ctx = TickContext::for_test(&tuning, &catalog, &clips);

        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let sweep = catalog.get(AttackId::TailSweep).unwrap();
        let execution = AttackExecution::begin(sweep, &mut parts, &ctx, &mut outbox);
        *parts.routine = ControllerRoutine::Primary(PrimaryStep::Attacking(execution));
        parts.hits.enable(AttackId::TailSweep, &mut outbox);
        parts.resources.limbs.request_deploy();

        let outcome = enter_stun(StunKind::Parry, 2.5, &mut parts, &mut outbox);

        assert_eq!(outcome, StunOutcome::Entered);
        assert_eq!(*parts.routine, ControllerRoutine::Suspended);
        assert!(!parts.hits.any_enabled());
        assert!(parts.movement.frozen);
        assert_eq!(*parts.command, MovementCommand::Stop);
        // Переход ресурса продолжается
        assert_eq!(parts.resources.limbs.state(), ResourceState::Deploying);
        assert!(outbox.signals().contains(&EncounterSignal::StunChanged {
            boss: ctx.boss,
            kind: StunKind::Parry,
            phase: Some(StunPhase::Windup),
        }));
    }

    #[test]
    fn test_new_stun_while_stunned_is_ignored() {
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(Entity::from_raw(1));
        let mut parts = fixture.parts();

        assert_eq!(
            enter_stun(StunKind::Parry, 2.5, &mut parts, &mut outbox),
            StunOutcome::Entered
        );
        assert_eq!(
            enter_stun(StunKind::ObstacleCollision, 4.0, &mut parts, &mut outbox),
            StunOutcome::AlreadyStunned
        );
        assert_eq!(parts.stun.kind(), StunKind::Parry);
        assert_eq!(parts.stun.phase_duration(StunPhase::Active), 1.5);
    }

    #[test]
    fn test_movement_restored_exactly_once() {
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(Entity::from_raw(1));
        enter_stun(StunKind::ObstacleCollision, 4.0, &mut fixture.parts(), &mut outbox);

        run_stun_to_end(&mut fixture, &mut outbox);
        // Лишние тики после выхода ничего не делают
        let step = advance_stun(&mut fixture.parts(), DELTA, 0.4, &mut outbox);
        assert_eq!(step, StunStep::Idle);

        let restored = outbox
            .signals()
            .iter()
            .filter(|s| matches!(s, EncounterSignal::MovementRestored { .. }))
            .count();
        assert_eq!(restored, 1);
        assert!(!fixture.movement.frozen);
        assert_eq!(
            fixture.routine,
            ControllerRoutine::Primary(PrimaryStep::Deciding { wait: 0.4 })
        );
    }

    #[test]
    fn test_stun_phases_announced_in_order() {
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(Entity::from_raw(1));
        enter_stun(StunKind::Parry, 2.5, &mut fixture.parts(), &mut outbox);

        run_stun_to_end(&mut fixture, &mut outbox);

        let phases: Vec<_> = outbox
            .signals()
            .iter()
            .filter_map(|s| match s {
                EncounterSignal::StunChanged { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                Some(StunPhase::Windup),
                Some(StunPhase::Active),
                Some(StunPhase::Recovery),
                None
            ]
        );

        let triggers: Vec<_> = outbox
            .signals()
            .iter()
            .filter_map(|s| match s {
                EncounterSignal::AnimationTrigger { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(triggers, vec!["stun_windup", "stun_active", "stun_recovery"]);
    }

    #[test]
    fn test_stun_exit_rearms_deployed_limbs() {
        let mut fixture = PartsFixture::default();
        let mut outbox = Outbox::new(Entity::from_raw(1));

        fixture.resources.limbs.request_deploy();
        assert!(fixture.resources.limbs.confirm(TransitionDirection::Deploy));
        fixture.resources.limbs.drain_events();

        enter_stun(StunKind::Parry, 2.5, &mut fixture.parts(), &mut outbox);
        assert!(fixture.resources.limbs.auto_retract().is_none());

        run_stun_to_end(&mut fixture, &mut outbox);

        assert!(fixture.resources.limbs.is_deployed());
        assert!(fixture.resources.limbs.auto_retract().is_some());
        // Plating не был выдвинут: таймера нет
        assert!(fixture.resources.plating.auto_retract().is_none());
    }

    #[test]
    fn test_deploy_landing_after_stun_exit_still_auto_retracts() {
        let mut tuning = BossTuning::default();
        tuning.limbs.deploy_seconds = 5.0;
        tuning.limbs.await_confirmation = false;
        let catalog = AttackCatalog::standard();
        let clips = AnimationClips::default();
        let ctx = TickContext::for_test(&tuning, &catalog, &clips);

        let mut fixture = PartsFixture::default();
        fixture.resources = BodyResources::new(&tuning);
        let mut outbox = Outbox::new(ctx.boss);
        let mut parts = fixture.parts();

        let swipe = catalog.get(AttackId::ClawSwipeLeft).unwrap();
        let execution = AttackExecution::begin(swipe, &mut parts, &ctx, &mut outbox);
        *parts.routine = ControllerRoutine::Primary(PrimaryStep::Attacking(execution));
        assert_eq!(parts.resources.limbs.state(), ResourceState::Deploying);

        enter_stun(StunKind::Parry, 1.0, &mut parts, &mut outbox);

        // 20s при 60Hz: стан кончается раньше, чем limbs доезжают
        let dt = 1.0 / 60.0;
        let mut deployed_after_stun = false;
        for _ in 0..1200 {
            for resource in parts.resources.iter_mut() {
                resource.tick(dt);
            }
            advance_stun(&mut parts, dt, 0.4, &mut outbox);
            if !parts.stun.is_active() && parts.resources.limbs.is_deployed() {
                deployed_after_stun = true;
            }
        }

        assert!(deployed_after_stun);
        assert!(!parts.stun.is_active());
        assert_eq!(parts.resources.limbs.state(), ResourceState::Retracted);
    }
}
