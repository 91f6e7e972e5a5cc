//! Round state machine data and win conditions.

use serde::{Deserialize, Serialize};

use crate::combatant::Side;
use crate::config::BattleConfig;
use crate::math::{decimal_serde, Fixed};
use crate::roster::Roster;

/// Game phase.
///
/// `Setup -> FormationSelect -> Battle -> End`, then back to
/// `FormationSelect` for the next round or on to `GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Rosters are being configured.
    Setup,
    /// Formations are being chosen for the coming round.
    FormationSelect,
    /// Battle in progress; the only phase in which ticks do anything.
    Battle,
    /// Round finished, waiting for `advance_round`.
    End,
    /// All rounds played.
    GameOver,
}

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinReason {
    /// The loser's general died.
    GeneralDefeated,
    /// Both sides ran out of troops with both generals standing; the
    /// initiating side is charged with the loss.
    DefaultLoss,
    /// The tick cap ran out; higher aggregate hp won.
    Timeout,
}

/// Round-level bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    /// Current phase.
    pub phase: Phase,
    /// Current round, starting at 1.
    pub round: u32,
    /// Rounds won by the player.
    pub player_score: u32,
    /// Rounds won by the enemy.
    pub enemy_score: u32,
    /// Ticks elapsed in the current battle.
    pub battle_elapsed_ticks: u64,
}

impl Default for BattleState {
    fn default() -> Self {
        Self {
            phase: Phase::Setup,
            round: 1,
            player_score: 0,
            enemy_score: 0,
            battle_elapsed_ticks: 0,
        }
    }
}

impl BattleState {
    /// Rounds won by `side`.
    #[must_use]
    pub const fn score(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_score,
            Side::Enemy => self.enemy_score,
        }
    }

    pub(crate) fn award(&mut self, side: Side) {
        match side {
            Side::Player => self.player_score += 1,
            Side::Enemy => self.enemy_score += 1,
        }
    }
}

/// Result of one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Round number.
    pub round: u32,
    /// Winning side.
    pub winner: Side,
    /// How the battle was decided.
    pub reason: WinReason,
    /// Battle length in ticks.
    pub ticks: u64,
    /// Player aggregate hp at the end.
    #[serde(with = "decimal_serde")]
    pub player_hp: Fixed,
    /// Enemy aggregate hp at the end.
    #[serde(with = "decimal_serde")]
    pub enemy_hp: Fixed,
}

/// Final results once every round is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Rounds played.
    pub rounds: u32,
    /// Player rounds won.
    pub player_score: u32,
    /// Enemy rounds won.
    pub enemy_score: u32,
    /// Overall winner; `None` when the scores are level.
    pub winner: Option<Side>,
}

impl GameSummary {
    pub(crate) fn from_state(state: &BattleState, rounds: u32) -> Self {
        let (player_score, enemy_score) = (state.score(Side::Player), state.score(Side::Enemy));
        let winner = match player_score.cmp(&enemy_score) {
            std::cmp::Ordering::Greater => Some(Side::Player),
            std::cmp::Ordering::Less => Some(Side::Enemy),
            std::cmp::Ordering::Equal => None,
        };
        Self {
            rounds,
            player_score,
            enemy_score,
            winner,
        }
    }
}

/// Decide whether the battle is over.
///
/// Checked in order: a fallen general, then both troop lines wiped out,
/// then the tick cap. The initiating side wins when both generals fall
/// together and on an exact hp tie at timeout, and takes the loss when
/// both troop lines are gone.
#[must_use]
pub fn evaluate(
    player: &Roster,
    enemy: &Roster,
    elapsed_ticks: u64,
    config: &BattleConfig,
) -> Option<(Side, WinReason)> {
    let initiator = Side::INITIATOR;

    if !enemy.general_alive() {
        return Some((Side::Player, WinReason::GeneralDefeated));
    }
    if !player.general_alive() {
        return Some((Side::Enemy, WinReason::GeneralDefeated));
    }

    if player.living_troops() == 0 && enemy.living_troops() == 0 {
        return Some((initiator.opponent(), WinReason::DefaultLoss));
    }

    if elapsed_ticks > config.battle_timeout_ticks {
        let (player_hp, enemy_hp) = (player.aggregate_hp(), enemy.aggregate_hp());
        let winner = if player_hp > enemy_hp {
            Side::Player
        } else if enemy_hp > player_hp {
            Side::Enemy
        } else {
            initiator
        };
        return Some((winner, WinReason::Timeout));
    }

    None
}
