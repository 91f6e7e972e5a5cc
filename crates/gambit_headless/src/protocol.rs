//! JSON lines written to stdout.
//!
//! Every record is one JSON object on its own line, tagged by `type`.
//! Logs go to stderr, so stdout can be piped straight into a parser.
//!
//! # Example
//!
//! ```text
//! {"type":"round","round":1,"winner":"Player","reason":"GeneralDefeated","ticks":212,...}
//! {"type":"round","round":2,...}
//! {"type":"round","round":3,...}
//! {"type":"summary","scenario":"Skirmish","player_score":2,"enemy_score":1,...}
//! ```

use serde::{Deserialize, Serialize};

use gambit_core::combatant::Side;
use gambit_core::state::RoundOutcome;

use crate::batch::VerifyReport;
use crate::game_runner::GameReport;

/// One stdout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    /// A finished round.
    Round(RoundOutcome),
    /// A finished game.
    Summary {
        /// Scenario name.
        scenario: String,
        /// Player general's name.
        player_general: String,
        /// Enemy general's name.
        enemy_general: String,
        /// Rounds played.
        rounds: u32,
        /// Player rounds won.
        player_score: u32,
        /// Enemy rounds won.
        enemy_score: u32,
        /// Overall winner, `None` on level scores.
        winner: Option<Side>,
        /// Battle ticks over the whole game.
        total_ticks: u64,
        /// State hash at game over.
        state_hash: u64,
    },
    /// Result of a determinism check.
    Verify(VerifyReport),
    /// A completed batch.
    Batch {
        /// Games that finished.
        games: usize,
        /// Games that failed.
        errors: usize,
        /// Where the full results were written.
        output: String,
    },
    /// Something went wrong.
    Error {
        /// Error message.
        message: String,
    },
}

impl Output {
    /// One `round` record per round, then the `summary` record.
    #[must_use]
    pub fn from_report(report: &GameReport) -> Vec<Self> {
        report
            .rounds
            .iter()
            .cloned()
            .map(Self::Round)
            .chain(std::iter::once(Self::Summary {
                scenario: report.scenario.clone(),
                player_general: report.player_general.clone(),
                enemy_general: report.enemy_general.clone(),
                rounds: report.summary.rounds,
                player_score: report.summary.player_score,
                enemy_score: report.summary.enemy_score,
                winner: report.summary.winner,
                total_ticks: report.total_ticks,
                state_hash: report.state_hash,
            }))
            .collect()
    }

    /// Create an error record.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }

    /// Parse one line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::math::Fixed;
    use gambit_core::state::{GameSummary, WinReason};

    fn report() -> GameReport {
        let outcome = RoundOutcome {
            round: 1,
            winner: Side::Enemy,
            reason: WinReason::Timeout,
            ticks: 601,
            player_hp: Fixed::from_num(40),
            enemy_hp: Fixed::from_num(62.5),
        };
        GameReport {
            scenario: "Test".to_string(),
            player_general: "Captain".to_string(),
            enemy_general: "Marksman".to_string(),
            player_formation: "Wedge".to_string(),
            enemy_formation: "Line".to_string(),
            rounds: vec![outcome],
            summary: GameSummary {
                rounds: 1,
                player_score: 0,
                enemy_score: 1,
                winner: Some(Side::Enemy),
            },
            total_ticks: 601,
            state_hash: 42,
        }
    }

    #[test]
    fn test_report_becomes_rounds_then_summary() {
        let lines = Output::from_report(&report());
        assert_eq!(lines.len(), 2);
        assert!(matches!(lines[0], Output::Round(RoundOutcome { ticks: 601, .. })));
        assert!(matches!(
            lines[1],
            Output::Summary { enemy_score: 1, state_hash: 42, .. }
        ));
    }

    #[test]
    fn test_round_line_is_flat_and_decimal() {
        let line = Output::from_report(&report())[0].to_json_line();
        assert!(line.ends_with('\n'));
        assert!(line.starts_with(r#"{"type":"round","round":1,"#));
        assert!(line.contains(r#""enemy_hp":62.5"#));
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_lines_parse_back() {
        for output in Output::from_report(&report()) {
            let line = output.to_json_line();
            assert_eq!(Output::from_json(line.trim_end()).unwrap(), output);
        }
    }

    #[test]
    fn test_error_record() {
        let line = Output::error("boom").to_json_line();
        assert_eq!(line, "{\"type\":\"error\",\"message\":\"boom\"}\n");
    }
}
