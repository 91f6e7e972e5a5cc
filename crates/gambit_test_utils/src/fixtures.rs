//! Test fixtures and helpers.
//!
//! Pre-built battle contexts and stat blocks for consistent testing.

use fixed::types::I32F32;
use gambit_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Stat block from whole numbers plus a range.
#[must_use]
pub fn stats(hp: i32, attack: i32, range: f64, rate: i32) -> BaseStats {
    BaseStats::new(hp, attack, fixed_f(range), rate)
}

/// A side fielding troops with explicit stats under a default general.
#[must_use]
pub fn troop_setup(archetype: &str, troop_stats: BaseStats, formation: Formation) -> SideSetup {
    let mut setup = SideSetup::of(archetype).with_formation(formation);
    setup.troop = setup.troop.with_stats(troop_stats);
    setup
}

/// Neutral formation that deploys as a grid.
#[must_use]
pub fn neutral_grid() -> Formation {
    Formation::new("Phalanx", FormationBonus::NEUTRAL)
}

/// A context in the `Battle` phase with both sides set up as given.
#[must_use]
pub fn battle_with(config: BattleConfig, player: SideSetup, enemy: SideSetup) -> BattleContext {
    let mut ctx = BattleContext::new(config);
    ctx.set_side(Side::Player, player);
    ctx.set_side(Side::Enemy, enemy);
    ctx.enter_formation_select();
    ctx.start_battle(&FlatTerrain::default());
    ctx
}

/// Mirrored melee armies on neutral grids, already in battle.
#[must_use]
pub fn mirrored_melee(config: BattleConfig) -> BattleContext {
    let setup = SideSetup::of("melee").with_formation(neutral_grid());
    battle_with(config, setup.clone(), setup)
}

/// Tick on flat terrain until the battle ends or `max_ticks` pass.
pub fn run_battle(ctx: &mut BattleContext, max_ticks: u64) -> Option<RoundOutcome> {
    let terrain = FlatTerrain::default();
    for _ in 0..max_ticks {
        if let Some(outcome) = ctx.tick(&terrain).outcome {
            return Some(outcome);
        }
    }
    None
}

/// Play a full game of neutral-grid rounds and return the summary.
pub fn play_game(mut ctx: BattleContext, max_ticks_per_round: u64) -> Option<GameSummary> {
    let terrain = FlatTerrain::default();
    if ctx.phase() == Phase::Setup {
        ctx.enter_formation_select();
    }
    loop {
        match ctx.phase() {
            Phase::FormationSelect => {
                ctx.start_battle(&terrain);
            }
            Phase::Battle => {
                run_battle(&mut ctx, max_ticks_per_round)?;
            }
            Phase::End => {
                ctx.advance_round();
            }
            Phase::GameOver => return ctx.summary(),
            Phase::Setup => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_melee_is_in_battle() {
        let ctx = mirrored_melee(BattleConfig::default().with_troops_per_side(5));
        assert_eq!(ctx.phase(), Phase::Battle);
        assert_eq!(ctx.roster(Side::Enemy).troops.len(), 5);
    }

    #[test]
    fn test_troop_setup_applies_stats() {
        let setup = troop_setup("ranged", stats(50, 1, 2.0, 3), neutral_grid());
        assert_eq!(setup.troop.stats.unwrap().max_hp, fixed(50));
    }
}
