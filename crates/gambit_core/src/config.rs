//! Battle configuration.
//!
//! Every tunable constant of the simulation lives in [`BattleConfig`].
//! Configs are plain serde data and are usually written in RON:
//!
//! ```ron
//! BattleConfig(
//!     round_limit: 3,
//!     troops_per_side: 20,
//!     battle_timeout_ticks: 600,
//!     move_step: 0.1,
//! )
//! ```
//!
//! Missing fields fall back to [`BattleConfig::default`].

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed};

/// Ticks per second for the battle scheduler.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Number of rounds in a game.
pub const ROUND_LIMIT: u32 = 3;

/// Troops per side, not counting the general.
pub const TROOPS_PER_SIDE: usize = 20;

/// Tunable simulation constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Rounds per game; the game ends once `round > round_limit`.
    pub round_limit: u32,
    /// Troops per side (each side also fields one general).
    pub troops_per_side: usize,
    /// Battle length cap; the timeout tie-break runs once elapsed ticks
    /// exceed this value.
    pub battle_timeout_ticks: u64,
    /// Base distance a combatant advances per tick, before the formation
    /// speed multiplier.
    #[serde(with = "decimal_serde")]
    pub move_step: Fixed,
    /// Generals within this distance of each other trade blows regardless
    /// of troop presence.
    #[serde(with = "decimal_serde")]
    pub general_duel_range: Fixed,
    /// Distance of each side's anchor from the midline along x.
    #[serde(with = "decimal_serde")]
    pub anchor_distance: Fixed,
    /// How far behind its anchor a general is placed.
    #[serde(with = "decimal_serde")]
    pub general_offset: Fixed,
    /// Layout spacing constants.
    pub spacing: LayoutSpacing,
}

/// Distances used by the formation layout generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSpacing {
    /// Cell size of the grid (phalanx) layout.
    #[serde(with = "decimal_serde")]
    pub grid: Fixed,
    /// Slot spacing in the wedge layout.
    #[serde(with = "decimal_serde")]
    pub wedge: Fixed,
    /// Slot spacing in the line layout.
    #[serde(with = "decimal_serde")]
    pub line: Fixed,
    /// Radius of the ring fallback.
    #[serde(with = "decimal_serde")]
    pub ring_radius: Fixed,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            grid: Fixed::from_num(1.2),
            wedge: Fixed::from_num(1.5),
            line: Fixed::from_num(1.5),
            ring_radius: Fixed::from_num(3),
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            round_limit: ROUND_LIMIT,
            troops_per_side: TROOPS_PER_SIDE,
            // 30 seconds of battle time.
            battle_timeout_ticks: u64::from(TICK_RATE) * 30,
            move_step: Fixed::from_num(0.1),
            general_duel_range: Fixed::from_num(3),
            anchor_distance: Fixed::from_num(15),
            general_offset: Fixed::from_num(5),
            spacing: LayoutSpacing::default(),
        }
    }
}

impl BattleConfig {
    /// Parse a config from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: override the round limit.
    #[must_use]
    pub fn with_round_limit(mut self, round_limit: u32) -> Self {
        self.round_limit = round_limit;
        self
    }

    /// Builder: override the roster size.
    #[must_use]
    pub fn with_troops_per_side(mut self, troops: usize) -> Self {
        self.troops_per_side = troops;
        self
    }

    /// Builder: override the timeout cap.
    #[must_use]
    pub fn with_timeout_ticks(mut self, ticks: u64) -> Self {
        self.battle_timeout_ticks = ticks;
        self
    }

    /// Reject configs the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.round_limit == 0 {
            return Err(GameError::InvalidConfig(
                "round_limit must be at least 1".to_string(),
            ));
        }
        if self.move_step <= Fixed::ZERO {
            return Err(GameError::InvalidConfig(format!(
                "move_step must be positive, got {}",
                self.move_step
            )));
        }
        if self.spacing.grid <= Fixed::ZERO
            || self.spacing.wedge <= Fixed::ZERO
            || self.spacing.line <= Fixed::ZERO
            || self.spacing.ring_radius <= Fixed::ZERO
        {
            return Err(GameError::InvalidConfig(
                "layout spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BattleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.troops_per_side, 20);
        assert_eq!(config.battle_timeout_ticks, 600);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = BattleConfig::from_ron_str("(round_limit: 5, move_step: 0.25)").unwrap();
        assert_eq!(config.round_limit, 5);
        assert_eq!(config.move_step, Fixed::from_num(0.25));
        assert_eq!(config.troops_per_side, TROOPS_PER_SIDE);
        assert_eq!(config.spacing, LayoutSpacing::default());
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let err = BattleConfig::from_ron_str("(round_limit: 0)").unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = BattleConfig::from_ron_str("(round_limit: \"many\")").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }
}
