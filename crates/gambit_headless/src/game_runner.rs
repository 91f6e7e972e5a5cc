//! Full-game execution for headless runs.
//!
//! A [`GameSession`] owns one game built from a [`Scenario`] and advances
//! it a tick at a time, so the same loop can be driven flat out
//! ([`GameRunner`]) or paced against a clock (`realtime`).
//!
//! # Bounds
//!
//! Every battle is capped at `max_ticks_per_round` scheduler steps on top
//! of the configured timeout. A battle that hits the cap is closed as a
//! timeout with the usual aggregate hp comparison.

use std::result::Result;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gambit_core::prelude::*;

use crate::scenario::{Scenario, ScenarioError};

/// Hard cap on scheduler steps per battle.
pub const MAX_TICKS_PER_ROUND: u64 = 1_000_000;

/// Everything one full game produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    /// Scenario name.
    pub scenario: String,
    /// Player general's display name.
    pub player_general: String,
    /// Enemy general's display name.
    pub enemy_general: String,
    /// Player formation in the last round.
    pub player_formation: String,
    /// Enemy formation in the last round.
    pub enemy_formation: String,
    /// Outcome of every round, in order.
    pub rounds: Vec<RoundOutcome>,
    /// Final scores.
    pub summary: GameSummary,
    /// Battle ticks summed over all rounds.
    pub total_ticks: u64,
    /// State hash at game over.
    pub state_hash: u64,
}

/// One game in progress.
pub struct GameSession {
    scenario: String,
    player_general: String,
    enemy_general: String,
    ctx: BattleContext,
    terrain: Box<dyn Terrain + Send + Sync>,
    scheduler: TickScheduler,
    max_ticks_per_round: u64,
    total_ticks: u64,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("scenario", &self.scenario)
            .field("phase", &self.ctx.phase())
            .field("round", &self.ctx.state().round)
            .field("total_ticks", &self.total_ticks)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Build the context and terrain for `scenario`.
    pub fn new(scenario: &Scenario, max_ticks_per_round: u64) -> Result<Self, ScenarioError> {
        let terrain = scenario.terrain.build()?;
        let ctx = scenario.build_context()?;
        Ok(Self {
            scenario: scenario.name.clone(),
            player_general: scenario.player.general_name(Side::Player),
            enemy_general: scenario.enemy.general_name(Side::Enemy),
            ctx,
            terrain,
            scheduler: TickScheduler::new(),
            max_ticks_per_round: max_ticks_per_round.max(1),
            total_ticks: 0,
        })
    }

    /// The game being played.
    #[must_use]
    pub fn context(&self) -> &BattleContext {
        &self.ctx
    }

    /// True once every round is played.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.ctx.phase() == Phase::GameOver
    }

    /// Deploy both sides for the next battle.
    ///
    /// Returns `Ok(false)` once the game is over.
    pub fn start_round(&mut self) -> Result<bool, ScenarioError> {
        match self.ctx.phase() {
            Phase::GameOver => Ok(false),
            Phase::FormationSelect => {
                self.ctx.start_battle(&*self.terrain);
                self.scheduler.start(&self.ctx);
                Ok(true)
            }
            other => Err(GameError::InvalidState(format!("cannot start a round from {other:?}")).into()),
        }
    }

    /// Run one tick of the current battle and report it to `observer`.
    ///
    /// Returns the outcome on the tick the battle ends; the game has then
    /// already moved on to the next round or to game over.
    pub fn step(
        &mut self,
        observer: &mut dyn BattleObserver,
    ) -> Result<Option<RoundOutcome>, ScenarioError> {
        let Some(events) = self.scheduler.step(&mut self.ctx, &*self.terrain) else {
            return Err(GameError::InvalidState("no battle is running".to_string()).into());
        };
        observer.on_tick(events.tick, &self.ctx.views(), &events);

        let outcome = match events.outcome {
            Some(outcome) => outcome,
            None if self.scheduler.ticks_run() >= self.max_ticks_per_round => self.force_end()?,
            None => return Ok(None),
        };

        self.total_ticks += outcome.ticks;
        debug!(hash = self.ctx.state_hash(), round = outcome.round, "Round state hash");
        self.ctx.advance_round();
        Ok(Some(outcome))
    }

    fn force_end(&mut self) -> Result<RoundOutcome, ScenarioError> {
        warn!(
            ticks = self.scheduler.ticks_run(),
            "Battle hit the step cap, closing it as a timeout"
        );
        self.scheduler.stop();
        let player_hp = self.ctx.roster(Side::Player).aggregate_hp();
        let enemy_hp = self.ctx.roster(Side::Enemy).aggregate_hp();
        let winner = if enemy_hp > player_hp {
            Side::Enemy
        } else {
            Side::INITIATOR
        };
        self.ctx
            .end_battle(winner, WinReason::Timeout)
            .ok_or_else(|| GameError::InvalidState("battle already ended".to_string()).into())
    }

    /// Final report. Only available once the game is over.
    pub fn report(&self) -> Result<GameReport, ScenarioError> {
        let summary = self
            .ctx
            .summary()
            .ok_or_else(|| GameError::InvalidState("game is not over".to_string()))?;
        Ok(GameReport {
            scenario: self.scenario.clone(),
            player_general: self.player_general.clone(),
            enemy_general: self.enemy_general.clone(),
            player_formation: self.ctx.formation(Side::Player).name.clone(),
            enemy_formation: self.ctx.formation(Side::Enemy).name.clone(),
            rounds: self.ctx.history().to_vec(),
            summary,
            total_ticks: self.total_ticks,
            state_hash: self.ctx.state_hash(),
        })
    }
}

/// Plays whole games as fast as possible.
#[derive(Debug, Clone)]
pub struct GameRunner {
    /// Step cap per battle.
    pub max_ticks_per_round: u64,
}

impl Default for GameRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRunner {
    /// Runner with the default step cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_ticks_per_round: MAX_TICKS_PER_ROUND,
        }
    }

    /// Builder: set the step cap per battle.
    #[must_use]
    pub fn with_max_ticks_per_round(mut self, max: u64) -> Self {
        self.max_ticks_per_round = max;
        self
    }

    /// Play `scenario` to game over.
    pub fn run(&self, scenario: &Scenario) -> Result<GameReport, ScenarioError> {
        self.run_observed(scenario, &mut NullObserver)
    }

    /// Play `scenario` to game over, reporting every tick to `observer`.
    pub fn run_observed(
        &self,
        scenario: &Scenario,
        observer: &mut dyn BattleObserver,
    ) -> Result<GameReport, ScenarioError> {
        let mut session = GameSession::new(scenario, self.max_ticks_per_round)?;
        info!(scenario = %scenario.name, "Game started");

        while session.start_round()? {
            while session.step(observer)?.is_none() {}
        }

        let report = session.report()?;
        info!(
            player_score = report.summary.player_score,
            enemy_score = report.summary.enemy_score,
            ticks = report.total_ticks,
            "Game finished"
        );
        Ok(report)
    }
}

/// Play `scenario` with the default runner.
pub fn run_game(scenario: &Scenario) -> Result<GameReport, ScenarioError> {
    GameRunner::new().run(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::SideScenario;

    fn small() -> Scenario {
        let mut scenario = Scenario::skirmish();
        scenario.config = BattleConfig::default().with_troops_per_side(4);
        scenario
    }

    #[derive(Default)]
    struct CountingObserver {
        ticks: u64,
    }

    impl BattleObserver for CountingObserver {
        fn on_tick(&mut self, _tick: u64, views: &[CombatantView], _events: &TickEvents) {
            assert_eq!(views.len(), 10);
            self.ticks += 1;
        }
    }

    #[test]
    fn test_game_plays_every_round() {
        let report = run_game(&small()).unwrap();
        assert_eq!(report.rounds.len(), 3);
        assert_eq!(report.summary.rounds, 3);
        assert_eq!(report.summary.player_score + report.summary.enemy_score, 3);
        assert_eq!(
            report.total_ticks,
            report.rounds.iter().map(|r| r.ticks).sum::<u64>()
        );
        assert_eq!(report.player_formation, "Wedge");
        assert_eq!(report.enemy_formation, "Line");
    }

    #[test]
    fn test_observer_sees_every_tick() {
        let mut observer = CountingObserver::default();
        let report = GameRunner::new()
            .run_observed(&small(), &mut observer)
            .unwrap();
        assert_eq!(observer.ticks, report.total_ticks);
    }

    #[test]
    fn test_same_scenario_same_hash() {
        let a = run_game(&small()).unwrap();
        let b = run_game(&small()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_step_cap_closes_battle_as_timeout() {
        let mut scenario = small();
        scenario.config = scenario.config.with_timeout_ticks(u64::MAX).with_round_limit(1);
        let report = GameRunner::new()
            .with_max_ticks_per_round(5)
            .run(&scenario)
            .unwrap();
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].reason, WinReason::Timeout);
        assert_eq!(report.rounds[0].ticks, 5);
    }

    #[test]
    fn test_session_refuses_step_without_battle() {
        let mut session = GameSession::new(&small(), 100).unwrap();
        assert!(session.step(&mut NullObserver).is_err());
        assert!(session.report().is_err());
        assert!(!session.is_over());
    }

    #[test]
    fn test_general_names_come_from_prompts() {
        let mut scenario = small();
        scenario.enemy = SideScenario::of("knights");
        let report = run_game(&scenario).unwrap();
        assert_eq!(report.enemy_general, "Custom General");
        assert!(["Veteran", "Captain"].contains(&report.player_general.as_str()));
    }
}
