//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Battles must replay bit-for-bit within one process. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`gambit_core::math::Fixed`] throughout the tick path.
//!
//! - **HashMap iteration order**: Rosters are plain vectors processed in
//!   roster order; nothing iterates a hash map.
//!
//! - **System randomness**: None. Prompt "random" picks use a stable hash.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual passes (targeting, combat, layouts)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full battles are reproducible
//! 4. **Parallel tests**: Running N battles on threads all match

use std::thread;

use gambit_core::context::BattleContext;
use gambit_core::state::RoundOutcome;
use gambit_core::terrain::FlatTerrain;

/// Where one battle run ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleRun {
    /// State hash after the last tick.
    pub state_hash: u64,
    /// Ticks actually run.
    pub ticks: u64,
    /// How the battle ended, if it ended within the tick budget.
    pub outcome: Option<RoundOutcome>,
}

/// Tick `ctx` until the battle ends or `max_ticks` have run.
pub fn play_out(ctx: &mut BattleContext, max_ticks: u64) -> BattleRun {
    let terrain = FlatTerrain::default();
    let mut outcome = None;
    let mut ticks = 0;
    while ticks < max_ticks && outcome.is_none() {
        outcome = ctx.tick(&terrain).outcome;
        ticks += 1;
    }
    BattleRun {
        state_hash: ctx.state_hash(),
        ticks,
        outcome,
    }
}

/// Several runs of the same battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayComparison {
    /// Runs in the order they were played.
    pub runs: Vec<BattleRun>,
}

impl ReplayComparison {
    /// Whether every run ended identically.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.runs.windows(2).all(|w| w[0] == w[1])
    }

    /// First run that differs from run 0.
    #[must_use]
    pub fn first_mismatch(&self) -> Option<(usize, &BattleRun)> {
        let first = self.runs.first()?;
        self.runs.iter().enumerate().skip(1).find(|(_, run)| *run != first)
    }

    /// # Panics
    ///
    /// Panics, naming the diverging run, if any two runs differ.
    pub fn assert_deterministic(&self) {
        if let Some((index, run)) = self.first_mismatch() {
            panic!(
                "Battle replay {index} of {} diverged.\n run 0: {:?}\n run {index}: {:?}",
                self.runs.len(),
                self.runs[0],
                run
            );
        }
    }
}

/// Play the battle from `setup_fn` `runs` times on flat terrain.
pub fn verify_battle_determinism<F>(setup_fn: F, runs: usize, max_ticks: u64) -> ReplayComparison
where
    F: Fn() -> BattleContext,
{
    let runs = (0..runs)
        .map(|_| play_out(&mut setup_fn(), max_ticks))
        .collect();
    ReplayComparison { runs }
}

/// Play N battles on scoped threads.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
pub fn run_parallel_battles<F>(setup_fn: F, num_sims: usize, max_ticks: u64) -> ReplayComparison
where
    F: Fn() -> BattleContext + Sync,
{
    let runs = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| s.spawn(|| play_out(&mut setup_fn(), max_ticks)))
            .collect();

        // A panicked worker becomes a run no real battle produces.
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    tracing::warn!("Battle worker panicked");
                    BattleRun {
                        state_hash: u64::MAX,
                        ticks: 0,
                        outcome: None,
                    }
                })
            })
            .collect()
    });
    ReplayComparison { runs }
}

/// Compare two battle runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs match, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> BattleContext,
{
    let terrain = FlatTerrain::default();
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick(&terrain);
        b.tick(&terrain);

        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick, "Battle runs diverged");
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot round-trip mid-battle changes nothing, and that
/// the restored context continues identically.
pub fn verify_snapshot_determinism<F>(setup_fn: F, ticks_before: u64, ticks_after: u64) -> bool
where
    F: Fn() -> BattleContext,
{
    let terrain = FlatTerrain::default();
    let mut original = setup_fn();
    for _ in 0..ticks_before {
        original.tick(&terrain);
    }

    let Ok(bytes) = original.snapshot() else {
        return false;
    };
    let Ok(mut restored) = BattleContext::restore(&bytes) else {
        return false;
    };
    if restored.state_hash() != original.state_hash() {
        return false;
    }

    for _ in 0..ticks_after {
        original.tick(&terrain);
        restored.tick(&terrain);
    }
    restored.state_hash() == original.state_hash()
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use gambit_core::combatant::{Archetype, BaseStats};
    use gambit_core::math::{Fixed, Vec2Fixed};
    use proptest::prelude::*;

    /// Generate a fixed-point coordinate on a battlefield-sized plane.
    ///
    /// Range: -500 to 500 in steps of 1/64.
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-32_000i32..32_000i32).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(64))
    }

    /// Generate a ground-plane point.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, z)| Vec2Fixed::new(x, z))
    }

    /// Generate a formation name, recognised or not, in mixed case.
    pub fn arb_layout_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("phalanx".to_string()),
            Just("Grid".to_string()),
            Just("WEDGE".to_string()),
            Just("line".to_string()),
            Just("Circle".to_string()),
            "[a-z]{1,10}",
        ]
    }

    /// Generate an archetype name, including unknown ones.
    pub fn arb_archetype_name() -> impl Strategy<Value = String> {
        prop_oneof![
            proptest::sample::select(Archetype::ALL.to_vec()).prop_map(|a| a.name().to_string()),
            "[a-z-]{0,12}",
        ]
    }

    /// Generate a plausible troop stat block.
    pub fn arb_stats() -> impl Strategy<Value = BaseStats> {
        (1i32..200, 0i32..20, 1i32..12, 1i32..30).prop_map(|(hp, atk, range, rate)| {
            BaseStats::new(hp, atk, Fixed::from_num(range), rate)
        })
    }

    /// Generate a formation attack multiplier in [0.5, 2.0].
    pub fn arb_atk_multiplier() -> impl Strategy<Value = Fixed> {
        (8i32..=32).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::mirrored_melee;
    use gambit_core::config::BattleConfig;
    use gambit_core::math::Fixed;
    use proptest::prelude::*;

    fn small() -> BattleContext {
        mirrored_melee(BattleConfig::default().with_troops_per_side(6))
    }

    #[test]
    fn test_battle_is_deterministic() {
        let replays = verify_battle_determinism(small, 3, 5_000);
        replays.assert_deterministic();
        assert_eq!(replays.runs.len(), 3);
        assert!(replays.runs[0].outcome.is_some());
    }

    #[test]
    fn test_play_out_stops_at_budget() {
        let run = play_out(&mut small(), 5);
        assert_eq!(run.ticks, 5);
        assert!(run.outcome.is_none());
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut replays = verify_battle_determinism(small, 2, 50);
        assert_eq!(replays.first_mismatch(), None);
        replays.runs[1].state_hash ^= 1;
        assert!(!replays.is_deterministic());
        assert_eq!(replays.first_mismatch().map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(small, 300), None);
    }

    #[test]
    fn test_parallel_battles_match() {
        run_parallel_battles(small, 4, 400).assert_deterministic();
    }

    #[test]
    fn test_snapshot_mid_battle() {
        assert!(verify_snapshot_determinism(small, 150, 150));
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            a in strategies::arb_vec2_position(),
            b in strategies::arb_vec2_position(),
        ) {
            prop_assert_eq!(a.distance(b), b.distance(a));
        }

        #[test]
        fn prop_step_toward_never_overshoots(
            a in strategies::arb_vec2_position(),
            b in strategies::arb_vec2_position(),
        ) {
            let step = Fixed::from_num(0.1);
            let moved = a.step_toward(b, step);
            prop_assert!(moved.distance(b) <= a.distance(b));
        }
    }
}
