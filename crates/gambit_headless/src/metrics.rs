//! Metrics for game analysis.
//!
//! Per-game records and batch aggregates, serialized to JSON for
//! formation balance analysis.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gambit_core::combatant::Side;
use gambit_core::state::{RoundOutcome, WinReason};

use crate::game_runner::GameReport;

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Player formation.
    pub player_formation: String,
    /// Enemy formation.
    pub enemy_formation: String,
    /// Winning side label, `None` on level scores.
    pub winner: Option<String>,
    /// Player rounds won.
    pub player_score: u32,
    /// Enemy rounds won.
    pub enemy_score: u32,
    /// Every round's outcome.
    pub rounds: Vec<RoundOutcome>,
    /// Battle ticks over the whole game.
    pub duration_ticks: u64,
    /// State hash at game over.
    pub state_hash: u64,
}

impl GameMetrics {
    /// Metrics for a finished game.
    #[must_use]
    pub fn from_report(game_id: impl Into<String>, report: &GameReport) -> Self {
        Self {
            game_id: game_id.into(),
            scenario: report.scenario.clone(),
            player_formation: report.player_formation.clone(),
            enemy_formation: report.enemy_formation.clone(),
            winner: report.summary.winner.map(|s| s.label().to_string()),
            player_score: report.summary.player_score,
            enemy_score: report.summary.enemy_score,
            rounds: report.rounds.clone(),
            duration_ticks: report.total_ticks,
            state_hash: report.state_hash,
        }
    }

    /// `"Player vs Enemy"` formation pairing.
    #[must_use]
    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.player_formation, self.enemy_formation)
    }

    /// Formation of the side that won the game.
    #[must_use]
    pub fn winning_formation(&self) -> Option<&str> {
        match self.winner.as_deref() {
            Some(w) if w == Side::Player.label() => Some(&self.player_formation),
            Some(w) if w == Side::Enemy.label() => Some(&self.enemy_formation),
            _ => None,
        }
    }
}

fn reason_label(reason: WinReason) -> &'static str {
    match reason {
        WinReason::GeneralDefeated => "general_defeated",
        WinReason::DefaultLoss => "default_loss",
        WinReason::Timeout => "timeout",
    }
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won by each side.
    pub wins_by_side: HashMap<String, u32>,
    /// Win rates by side.
    pub win_rates: HashMap<String, f64>,
    /// Games won by each formation, whichever side fielded it.
    pub wins_by_formation: HashMap<String, u32>,
    /// Player win rate per `"Player vs Enemy"` formation matchup.
    pub matchup_player_win_rates: HashMap<String, f64>,
    /// Rounds decided by each win reason.
    pub rounds_by_reason: HashMap<String, u32>,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
    /// Games with level scores.
    pub draws: u32,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: u32::try_from(games.len()).unwrap_or(u32::MAX),
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut min_duration = u64::MAX;
        let mut max_duration = 0u64;
        let mut matchups: HashMap<String, (u32, u32)> = HashMap::new();

        for game in games {
            duration_sum += game.duration_ticks;
            min_duration = min_duration.min(game.duration_ticks);
            max_duration = max_duration.max(game.duration_ticks);

            match &game.winner {
                Some(winner) => *summary.wins_by_side.entry(winner.clone()).or_default() += 1,
                None => summary.draws += 1,
            }
            if let Some(formation) = game.winning_formation() {
                *summary
                    .wins_by_formation
                    .entry(formation.to_string())
                    .or_default() += 1;
            }

            let entry = matchups.entry(game.matchup()).or_default();
            entry.1 += 1;
            if game.winner.as_deref() == Some(Side::Player.label()) {
                entry.0 += 1;
            }

            for round in &game.rounds {
                *summary
                    .rounds_by_reason
                    .entry(reason_label(round.reason).to_string())
                    .or_default() += 1;
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / games.len() as f64;
        summary.min_duration_ticks = min_duration;
        summary.max_duration_ticks = max_duration;

        for (side, wins) in &summary.wins_by_side {
            summary
                .win_rates
                .insert(side.clone(), *wins as f64 / summary.total_games as f64);
        }
        for (matchup, (wins, played)) in matchups {
            summary
                .matchup_player_win_rates
                .insert(matchup, wins as f64 / played as f64);
        }

        summary
    }

    /// Check if side balance is within acceptable range.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates
            .values()
            .all(|rate| (rate - 0.5).abs() <= threshold)
    }

    /// Get the dominant side (if any).
    #[must_use]
    pub fn dominant_side(&self, threshold: f64) -> Option<&String> {
        self.win_rates
            .iter()
            .find(|(_, rate)| **rate > 0.5 + threshold)
            .map(|(side, _)| side)
    }
}
