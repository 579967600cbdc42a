//! Tests for the cooldown tracker.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::catalog::{AttackCatalog, AttackCooldowns, AttackId};

    #[test]
    fn test_unused_attack_is_eligible() {
        let cooldowns = AttackCooldowns::default();
        assert!(cooldowns.is_off_cooldown(AttackId::TailSweep, 0.0));
        assert_eq!(cooldowns.next_eligible(AttackId::TailSweep), None);
    }

    #[test]
    fn test_mark_used_blocks_until_cooldown_elapsed() {
        let catalog = AttackCatalog::standard();
        let sweep = catalog.get(AttackId::TailSweep).unwrap(); // 8s
        let mut cooldowns = AttackCooldowns::default();

        cooldowns.mark_used(sweep, 10.0);
        assert!(!cooldowns.is_off_cooldown(AttackId::TailSweep, 10.0));
        assert!(!cooldowns.is_off_cooldown(AttackId::TailSweep, 17.9));
        assert!(cooldowns.is_off_cooldown(AttackId::TailSweep, 18.0));

        // Другие атаки не затронуты
        assert!(cooldowns.is_off_cooldown(AttackId::ClawSwipeLeft, 10.0));
    }

    proptest! {
        #[test]
        fn prop_cooldown_never_bypassed(
            start in 0.0f32..1000.0,
            offset in 0.0f32..20.0,
            index in 0usize..10,
        ) {
            let catalog = AttackCatalog::standard();
            let attack = catalog.iter().nth(index % catalog.iter().count()).unwrap();
            let mut cooldowns = AttackCooldowns::default();

            cooldowns.mark_used(attack, start);
            let ready_at = start + attack.cooldown_seconds;
            let now = start + offset;

            if attack.cooldown_seconds > 0.0 {
                prop_assert!(!cooldowns.is_off_cooldown(attack.id, start));
            }
            prop_assert_eq!(cooldowns.is_off_cooldown(attack.id, now), now >= ready_at);
        }
    }
}
