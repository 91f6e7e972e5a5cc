//! Fixed-cadence battle driver.
//!
//! The scheduler owns no game state. It borrows the context for one tick
//! at a time and re-checks the phase before every tick, so ending the
//! battle from anywhere stops it cleanly at the next step.

use std::time::Duration;

use crate::config::TICK_DURATION_MS;
use crate::context::BattleContext;
use crate::events::{BattleObserver, TickEvents};
use crate::state::{Phase, RoundOutcome};
use crate::terrain::Terrain;

/// Drives battle ticks while a battle is active.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    battle_active: bool,
    interval: Duration,
    ticks_run: u64,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    /// Scheduler at the default tick rate.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(u64::from(TICK_DURATION_MS)))
    }

    /// Scheduler with a custom tick interval.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            battle_active: false,
            interval,
            ticks_run: 0,
        }
    }

    /// Wall-clock time between ticks in real-time mode.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a battle is being driven.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.battle_active
    }

    /// Ticks stepped since the last `start`.
    #[must_use]
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Begin driving the context's battle.
    ///
    /// Returns `false` if a battle is already active or the context is not
    /// in the `Battle` phase.
    pub fn start(&mut self, ctx: &BattleContext) -> bool {
        if self.battle_active || ctx.phase() != Phase::Battle {
            return false;
        }
        self.battle_active = true;
        self.ticks_run = 0;
        true
    }

    /// Stop driving without touching the context.
    pub fn stop(&mut self) {
        self.battle_active = false;
    }

    /// Run one tick.
    ///
    /// Returns `None` and deactivates if the battle has already left the
    /// `Battle` phase.
    pub fn step(&mut self, ctx: &mut BattleContext, terrain: &dyn Terrain) -> Option<TickEvents> {
        if !self.battle_active {
            return None;
        }
        if ctx.phase() != Phase::Battle {
            self.battle_active = false;
            return None;
        }

        let events = ctx.tick(terrain);
        self.ticks_run += 1;
        if events.outcome.is_some() {
            self.battle_active = false;
        }
        Some(events)
    }

    /// Step until the battle ends, reporting every tick to `observer`.
    pub fn run_to_end(
        &mut self,
        ctx: &mut BattleContext,
        terrain: &dyn Terrain,
        observer: &mut dyn BattleObserver,
    ) -> Option<RoundOutcome> {
        while let Some(events) = self.step(ctx, terrain) {
            observer.on_tick(events.tick, &ctx.views(), &events);
            if events.outcome.is_some() {
                return events.outcome;
            }
        }
        None
    }
}
