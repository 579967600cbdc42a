//! Attack Selector: picks the next move for the Primary form loop.
//!
//! 1. threshold reached → forced transition attack (no range/cooldown gate)
//! 2. mounted (incl. grace) → top-exclusive subset, range ignored
//! 3. otherwise regular attacks of the form whose range contains
//!    `distance − max(clearance, buffer)` and that are off cooldown
//!
//! Ties are uniform random (left/right swipe variants are separate entries).

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{AttackCatalog, AttackCooldowns, AttackId, AttackKind};
use crate::config::SelectionConfig;
use crate::form::{Form, FormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Attack(AttackId),
    /// Threshold override: the one-shot transition attack
    ForceTransition(AttackId),
    /// Nothing in range: move toward the target for a bounded time
    CloseDistance,
    /// Nothing eligible and moving would not help (mounted, all on cooldown)
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionInput {
    /// Raw planar distance boss → target
    pub distance: f32,
    pub mounted: bool,
    pub now: f32,
}

/// Distance used for range checks (never negative).
pub fn effective_distance(distance: f32, config: &SelectionConfig) -> f32 {
    (distance - config.agent_clearance.max(config.range_buffer)).max(0.0)
}

/// All attacks currently eligible, in catalog order.
pub fn eligible_attacks(
    catalog: &AttackCatalog,
    cooldowns: &AttackCooldowns,
    form: Form,
    input: &SelectionInput,
    config: &SelectionConfig,
) -> Vec<AttackId> {
    let effective = effective_distance(input.distance, config);

    catalog
        .iter()
        .filter(|attack| attack.form == form)
        .filter(|attack| cooldowns.is_off_cooldown(attack.id, input.now))
        .filter(|attack| {
            if input.mounted {
                attack.kind == AttackKind::TopExclusive
            } else {
                attack.is_regular() && attack.in_range(effective)
            }
        })
        .map(|attack| attack.id)
        .collect()
}

pub fn select_attack<R: Rng + ?Sized>(
    catalog: &AttackCatalog,
    cooldowns: &AttackCooldowns,
    state: &FormState,
    input: &SelectionInput,
    config: &SelectionConfig,
    rng: &mut R,
) -> Selection {
    if state.current_form == Form::Primary && state.threshold_reached() {
        if let Some(transition) = catalog.transition_attack() {
            return Selection::ForceTransition(transition.id);
        }
    }

    let candidates = eligible_attacks(catalog, cooldowns, state.current_form, input, config);
    if let Some(&attack) = candidates.choose(rng) {
        return Selection::Attack(attack);
    }

    if input.mounted {
        Selection::Wait
    } else if any_in_range(catalog, state.current_form, input, config) {
        // В радиусе есть атака, просто на cooldown: подходить бессмысленно
        Selection::Wait
    } else {
        Selection::CloseDistance
    }
}

fn any_in_range(
    catalog: &AttackCatalog,
    form: Form,
    input: &SelectionInput,
    config: &SelectionConfig,
) -> bool {
    let effective = effective_distance(input.distance, config);
    catalog
        .iter()
        .any(|a| a.form == form && a.is_regular() && a.in_range(effective))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn input(distance: f32) -> SelectionInput {
        SelectionInput {
            distance,
            mounted: false,
            now: 0.0,
        }
    }

    #[test]
    fn test_effective_distance_subtracts_larger_clearance() {
        let config = SelectionConfig::default();
        // max(1.5, 1.0) = 1.5
        assert_eq!(effective_distance(5.0, &config), 3.5);
        assert_eq!(effective_distance(0.5, &config), 0.0);
    }

    #[test]
    fn test_melee_range_picks_melee() {
        let catalog = AttackCatalog::standard();
        let cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();

        let eligible = eligible_attacks(&catalog, &cooldowns, Form::Primary, &input(4.0), &config);
        assert!(eligible.contains(&AttackId::ClawSwipeLeft));
        assert!(eligible.contains(&AttackId::ClawSwipeRight));
        assert!(!eligible.contains(&AttackId::SporeVolley));
        assert!(!eligible.contains(&AttackId::Engulf));
        assert!(!eligible.contains(&AttackId::TopShake));
    }

    #[test]
    fn test_left_right_variety() {
        let catalog = AttackCatalog::standard();
        let cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();
        let state = FormState::with_threshold(100);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        // eff 0.5: оба свайпа, tail sweep, plate slam
        let picks: Vec<_> = (0..200)
            .map(|_| select_attack(&catalog, &cooldowns, &state, &input(2.0), &config, &mut rng))
            .collect();
        assert!(picks.contains(&Selection::Attack(AttackId::ClawSwipeLeft)));
        assert!(picks.contains(&Selection::Attack(AttackId::ClawSwipeRight)));
    }

    #[test]
    fn test_mounted_restricts_to_top_exclusive() {
        let catalog = AttackCatalog::standard();
        let cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();
        let mounted = SelectionInput {
            mounted: true,
            ..input(0.0)
        };

        let eligible = eligible_attacks(&catalog, &cooldowns, Form::Primary, &mounted, &config);
        assert_eq!(eligible, vec![AttackId::TopShake, AttackId::TopSpikes]);
    }

    #[test]
    fn test_out_of_range_closes_distance() {
        let catalog = AttackCatalog::standard();
        let cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();
        let state = FormState::with_threshold(10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let selection = select_attack(&catalog, &cooldowns, &state, &input(60.0), &config, &mut rng);
        assert_eq!(selection, Selection::CloseDistance);
    }

    #[test]
    fn test_in_range_but_cooling_down_waits() {
        let catalog = AttackCatalog::standard();
        let mut cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();
        let state = FormState::with_threshold(10);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for attack in catalog.iter() {
            cooldowns.mark_used(attack, 0.0);
        }
        let mut later = input(3.0);
        later.now = 0.5;
        assert_eq!(
            select_attack(&catalog, &cooldowns, &state, &later, &config, &mut rng),
            Selection::Wait
        );
    }

    #[test]
    fn test_threshold_forces_transition() {
        // Counter 0, threshold 10; ten successes → forced transition
        let catalog = AttackCatalog::standard();
        let mut cooldowns = AttackCooldowns::default();
        let config = SelectionConfig::default();
        let mut state = FormState::with_threshold(10);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..10 {
            assert!(!state.threshold_reached());
            state.record_success();
        }

        // Всё на cooldown и цель вне радиуса: override всё равно срабатывает
        for attack in catalog.iter() {
            cooldowns.mark_used(attack, 0.0);
        }
        let far = SelectionInput {
            distance: 500.0,
            mounted: false,
            now: 0.1,
        };
        assert_eq!(
            select_attack(&catalog, &cooldowns, &state, &far, &config, &mut rng),
            Selection::ForceTransition(AttackId::Engulf)
        );
    }
}
