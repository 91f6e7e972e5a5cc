//! Wall-clock paced play.
//!
//! Drives a [`GameSession`] one tick per interval on a single-threaded
//! tokio runtime. Missed ticks are delayed rather than bursted, so the
//! battle never runs faster than the configured rate and the observer
//! always sees a finished tick.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use gambit_core::config::TICK_DURATION_MS;
use gambit_core::error::GameError;
use gambit_core::events::BattleObserver;

use crate::game_runner::{GameReport, GameSession, MAX_TICKS_PER_ROUND};
use crate::scenario::{Scenario, ScenarioError};

/// Default pacing: one tick every 50 ms.
#[must_use]
pub fn default_interval() -> Duration {
    Duration::from_millis(u64::from(TICK_DURATION_MS))
}

/// Play `session` to game over, one tick per `interval`.
pub async fn drive_session(
    session: &mut GameSession,
    interval: Duration,
    observer: &mut dyn BattleObserver,
) -> Result<GameReport, ScenarioError> {
    let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while session.start_round()? {
        loop {
            ticker.tick().await;
            if let Some(outcome) = session.step(observer)? {
                tracing::info!(
                    round = outcome.round,
                    winner = outcome.winner.label(),
                    ticks = outcome.ticks,
                    "Round finished"
                );
                break;
            }
        }
    }
    session.report()
}

/// Play `scenario` in real time on a fresh current-thread runtime.
pub fn run_realtime(
    scenario: &Scenario,
    interval: Duration,
    observer: &mut dyn BattleObserver,
) -> Result<GameReport, ScenarioError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| GameError::InvalidState(format!("failed to start runtime: {e}")))?;
    let mut session = GameSession::new(scenario, MAX_TICKS_PER_ROUND)?;
    runtime.block_on(drive_session(&mut session, interval, observer))
}
