//! Property tests for layouts, combat, and the round state machine.

use std::collections::{HashMap, HashSet};

use gambit_core::combat;
use gambit_core::config::LayoutSpacing;
use gambit_core::formation::layout;
use gambit_core::prelude::*;
use gambit_test_utils::determinism::strategies::{
    arb_archetype_name, arb_atk_multiplier, arb_layout_name, arb_stats,
};
use gambit_test_utils::fixtures::{battle_with, neutral_grid, troop_setup};
use proptest::prelude::*;

proptest! {
    #[test]
    fn layout_has_exactly_count_distinct_offsets(
        name in arb_layout_name(),
        count in 1usize..150,
    ) {
        let offsets = layout(&name, count, &LayoutSpacing::default());
        prop_assert_eq!(offsets.len(), count);
        let distinct: HashSet<_> = offsets
            .iter()
            .map(|o| (o.x.to_bits(), o.z.to_bits()))
            .collect();
        prop_assert_eq!(distinct.len(), count);
    }

    #[test]
    fn resolve_subtracts_attack_times_bonus(
        stats in arb_stats(),
        atk in arb_atk_multiplier(),
    ) {
        let attacker = Combatant::from_spec(
            0,
            &CombatantSpec::troop("melee", Side::Player).with_stats(stats),
        );
        let mut defender = Combatant::from_spec(
            1,
            &CombatantSpec::troop("melee", Side::Enemy)
                .with_stats(BaseStats::new(100_000, 1, Fixed::ONE, 1)),
        );
        let bonus = FormationBonus { atk, ..FormationBonus::NEUTRAL };
        let before = defender.hp;
        let mut events = Vec::new();

        combat::resolve(&attacker, &bonus, &mut defender, &mut events);

        prop_assert_eq!(before - defender.hp, attacker.attack * atk);
        prop_assert_eq!(events.len(), 1);
    }

    #[test]
    fn factory_never_fails(name in arb_archetype_name(), stats in arb_stats()) {
        let spec = CombatantSpec::troop(name, Side::Enemy).with_stats(stats);
        let c = Combatant::from_spec(9, &spec);
        prop_assert!(c.is_alive());
        prop_assert_eq!(c.hp, c.max_hp);
        prop_assert_eq!(c.cooldown, 0);
        prop_assert!(c.attack_rate >= 1);
    }

    #[test]
    fn round_increases_until_game_over(limit in 1u32..6) {
        let mut ctx = BattleContext::new(
            BattleConfig::default().with_round_limit(limit).with_troops_per_side(1),
        );
        ctx.enter_formation_select();
        let mut last_round = ctx.state().round;

        loop {
            prop_assert!(ctx.start_battle(&FlatTerrain::default()));
            ctx.end_battle(Side::Enemy, WinReason::Timeout);
            let phase = ctx.advance_round().unwrap();
            prop_assert!(ctx.state().round > last_round);
            last_round = ctx.state().round;

            prop_assert_eq!(phase == Phase::GameOver, ctx.state().round > limit);
            if phase == Phase::GameOver {
                break;
            }
        }
        prop_assert_eq!(ctx.summary().unwrap().enemy_score, limit);
    }

    #[test]
    fn combatants_die_at_most_once(
        player in arb_stats(),
        enemy in arb_stats(),
    ) {
        let config = BattleConfig::default()
            .with_troops_per_side(5)
            .with_timeout_ticks(300);
        let mut ctx = battle_with(
            config,
            troop_setup("melee", player, neutral_grid()),
            troop_setup("ranged", enemy, neutral_grid()),
        );
        let terrain = FlatTerrain::default();
        let mut deaths: HashMap<CombatantId, u32> = HashMap::new();
        let mut dead: HashSet<CombatantId> = HashSet::new();

        for _ in 0..400 {
            let events = ctx.tick(&terrain);
            for id in events.deaths() {
                *deaths.entry(id).or_default() += 1;
            }
            for view in ctx.views() {
                let alive = view.hp_fraction > Fixed::ZERO;
                if dead.contains(&view.id) {
                    prop_assert!(!alive, "combatant {} came back", view.id);
                }
                if !alive {
                    dead.insert(view.id);
                }
            }
        }
        prop_assert!(deaths.values().all(|&n| n == 1));
    }
}
