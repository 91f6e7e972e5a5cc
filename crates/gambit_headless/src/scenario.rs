//! Scenario loading and configuration.
//!
//! Scenarios describe one full game: the battle configuration, what each
//! side fields (as free-text prompts), and the terrain. They are written
//! in RON:
//!
//! ```ron
//! (
//!     name: "Archers against the wall",
//!     config: (round_limit: 3, troops_per_side: 12),
//!     player: (troops: "longbow archers", formation: Some("line")),
//!     enemy: (troops: "shield guard", general: Some("heavy tank warlord")),
//!     terrain: Flat(height: 0.0),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gambit_core::combatant::{Archetype, BaseStats, CombatantSpec, Kind, Side};
use gambit_core::config::BattleConfig;
use gambit_core::context::{BattleContext, SideSetup};
use gambit_core::error::GameError;
use gambit_core::math::{Fixed, Vec2Fixed};
use gambit_core::prompt::{formation_from_prompt, general_from_prompt, spec_from_prompt};
use gambit_core::terrain::{FlatTerrain, HeightGrid, Terrain};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed, but the values cannot be used.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
    /// A decimal value does not fit the fixed-point range.
    #[error("Value out of range for '{field}': {value}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// The value as written.
        value: f64,
    },
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Battle rules.
    #[serde(default)]
    pub config: BattleConfig,
    /// The initiating side.
    pub player: SideScenario,
    /// The opposing side.
    pub enemy: SideScenario,
    /// Ground the battle is fought on.
    #[serde(default)]
    pub terrain: TerrainSpec,
}

/// What one side fields, as prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideScenario {
    /// Troop description, e.g. `"crossbow militia"`.
    pub troops: String,
    /// General description. `None` leaves the side with a default general.
    pub general: Option<String>,
    /// Formation name or description. `None` deploys a neutral grid.
    pub formation: Option<String>,
    /// Stat overrides applied on top of the troop archetype defaults.
    pub troop_stats: Option<StatOverrides>,
}

/// Optional per-field stat overrides, in human units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatOverrides {
    /// Maximum hit points.
    pub max_hp: Option<f64>,
    /// Damage per blow.
    pub attack: Option<f64>,
    /// Attack range.
    pub range: Option<f64>,
    /// Ticks between attacks.
    pub attack_rate: Option<i32>,
}

/// Terrain description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerrainSpec {
    /// Constant height everywhere.
    Flat {
        /// Ground height.
        height: f64,
    },
    /// Row-major height samples.
    Grid {
        /// Samples per row.
        width: usize,
        /// Number of rows.
        depth: usize,
        /// Distance between neighbouring samples.
        cell_size: f64,
        /// World position of sample (0, 0).
        origin: (f64, f64),
        /// `width * depth` heights.
        heights: Vec<f64>,
    },
}

impl Default for TerrainSpec {
    fn default() -> Self {
        Self::Flat { height: 0.0 }
    }
}

fn to_fixed(field: &'static str, value: f64) -> Result<Fixed, ScenarioError> {
    Fixed::checked_from_num(value).ok_or(ScenarioError::OutOfRange { field, value })
}

impl TerrainSpec {
    /// Build the terrain this spec describes.
    pub fn build(&self) -> Result<Box<dyn Terrain + Send + Sync>, ScenarioError> {
        match self {
            Self::Flat { height } => Ok(Box::new(FlatTerrain::at(to_fixed("height", *height)?))),
            Self::Grid {
                width,
                depth,
                cell_size,
                origin,
                heights,
            } => {
                let samples = heights
                    .iter()
                    .map(|&h| to_fixed("heights", h))
                    .collect::<Result<Vec<_>, _>>()?;
                let origin =
                    Vec2Fixed::new(to_fixed("origin", origin.0)?, to_fixed("origin", origin.1)?);
                let grid = HeightGrid::new(
                    *width,
                    *depth,
                    to_fixed("cell_size", *cell_size)?,
                    origin,
                    samples,
                )?;
                Ok(Box::new(grid))
            }
        }
    }
}

impl StatOverrides {
    fn apply(&self, mut stats: BaseStats) -> Result<BaseStats, ScenarioError> {
        if let Some(hp) = self.max_hp {
            stats = stats.with_max_hp(to_fixed("max_hp", hp)?);
        }
        if let Some(attack) = self.attack {
            stats = stats.with_attack(to_fixed("attack", attack)?);
        }
        if let Some(range) = self.range {
            stats = stats.with_range(to_fixed("range", range)?);
        }
        if let Some(rate) = self.attack_rate {
            stats = stats.with_attack_rate(rate);
        }
        Ok(stats)
    }
}

impl SideScenario {
    /// Side with the given troop prompt and nothing else.
    #[must_use]
    pub fn of(troops: impl Into<String>) -> Self {
        Self {
            troops: troops.into(),
            ..Self::default()
        }
    }

    /// Builder: set the general prompt.
    #[must_use]
    pub fn with_general(mut self, general: impl Into<String>) -> Self {
        self.general = Some(general.into());
        self
    }

    /// Builder: set the formation prompt.
    #[must_use]
    pub fn with_formation(mut self, formation: impl Into<String>) -> Self {
        self.formation = Some(formation.into());
        self
    }

    /// Display name of this side's general.
    #[must_use]
    pub fn general_name(&self, side: Side) -> String {
        match &self.general {
            Some(prompt) => general_from_prompt(prompt, side).name,
            None => "Custom General".to_string(),
        }
    }

    /// Turn the prompts into a setup for `side`.
    pub fn to_setup(&self, side: Side) -> Result<SideSetup, ScenarioError> {
        let mut troop = spec_from_prompt(&self.troops, side, Kind::Troop);
        if let Some(overrides) = &self.troop_stats {
            let base = troop.stats.take().unwrap_or_else(|| {
                Archetype::parse_or_default(&troop.archetype)
                    .weapon_class()
                    .troop_stats()
            });
            troop = troop.with_stats(overrides.apply(base)?);
        }

        let general: Option<CombatantSpec> = self
            .general
            .as_deref()
            .map(|prompt| general_from_prompt(prompt, side).spec);
        let formation = self.formation.as_deref().map(formation_from_prompt);

        Ok(SideSetup {
            troop,
            general,
            formation,
        })
    }
}

impl Scenario {
    /// Load scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Standard skirmish: infantry in a wedge against militia in a line.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Skirmish".to_string(),
            description: "Sword infantry against crossbow militia".to_string(),
            config: BattleConfig::default(),
            player: SideScenario::of("sword infantry")
                .with_general("veteran captain")
                .with_formation("wedge"),
            enemy: SideScenario::of("crossbow militia")
                .with_general("quick marksman")
                .with_formation("line"),
            terrain: TerrainSpec::default(),
        }
    }

    /// Same scenario with both formations replaced.
    #[must_use]
    pub fn with_formations(mut self, player: &str, enemy: &str) -> Self {
        self.player.formation = Some(player.to_string());
        self.enemy.formation = Some(enemy.to_string());
        self
    }

    /// Build a context in `FormationSelect`, ready for the first battle.
    pub fn build_context(&self) -> Result<BattleContext, ScenarioError> {
        self.config.validate()?;
        let mut ctx = BattleContext::new(self.config.clone());
        ctx.set_side(Side::Player, self.player.to_setup(Side::Player)?);
        ctx.set_side(Side::Enemy, self.enemy.to_setup(Side::Enemy)?);
        ctx.enter_formation_select();
        Ok(ctx)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::combatant::WeaponClass;
    use gambit_core::state::Phase;

    const SAMPLE: &str = r#"(
        name: "Test",
        config: (round_limit: 1, troops_per_side: 4, move_step: 0.25),
        player: (troops: "longbow archers", formation: Some("line")),
        enemy: (
            troops: "shield guard",
            general: Some("heavy tank warlord"),
            troop_stats: Some((max_hp: Some(45.5), attack_rate: Some(7))),
        ),
        terrain: Grid(
            width: 2,
            depth: 2,
            cell_size: 10.0,
            origin: (-5.0, -5.0),
            heights: [0.0, 1.0, 2.0, 3.0],
        ),
    )"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.config.round_limit, 1);
        assert_eq!(scenario.config.move_step, Fixed::from_num(0.25));
        assert_eq!(scenario.player.formation.as_deref(), Some("line"));
        assert!(scenario.player.general.is_none());
        assert!(matches!(scenario.terrain, TerrainSpec::Grid { width: 2, .. }));
    }

    #[test]
    fn test_prompts_become_setups() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();

        let player = scenario.player.to_setup(Side::Player).unwrap();
        assert_eq!(
            Archetype::parse_or_default(&player.troop.archetype).weapon_class(),
            WeaponClass::Ranged
        );
        assert_eq!(player.formation.unwrap().name, "Line");
        assert!(player.general.is_none());

        let enemy = scenario.enemy.to_setup(Side::Enemy).unwrap();
        assert_eq!(enemy.troop.archetype, "defender");
        let stats = enemy.troop.stats.unwrap();
        assert_eq!(stats.max_hp, Fixed::from_num(45.5));
        assert_eq!(stats.attack_rate, 7);
        assert!(enemy.general.is_some());
        assert!(enemy.formation.is_none());
    }

    #[test]
    fn test_build_context_is_ready_for_battle() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        let ctx = scenario.build_context().unwrap();
        assert_eq!(ctx.phase(), Phase::FormationSelect);
        assert_eq!(ctx.roster(Side::Enemy).troops.len(), 4);
        assert_eq!(ctx.roster(Side::Enemy).general.max_hp, Fixed::from_num(140));
    }

    #[test]
    fn test_grid_terrain_builds() {
        let scenario = Scenario::from_ron_str(SAMPLE).unwrap();
        let terrain = scenario.terrain.build().unwrap();
        assert_eq!(terrain.height_at(Fixed::from_num(-5), Fixed::from_num(-5)), Fixed::ZERO);
        assert_eq!(terrain.height_at(Fixed::from_num(5), Fixed::from_num(5)), Fixed::from_num(3));
    }

    #[test]
    fn test_bad_grid_is_rejected() {
        let spec = TerrainSpec::Grid {
            width: 3,
            depth: 3,
            cell_size: 1.0,
            origin: (0.0, 0.0),
            heights: vec![0.0; 4],
        };
        assert!(matches!(spec.build(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_value() {
        let spec = TerrainSpec::Flat { height: f64::NAN };
        assert!(matches!(
            spec.build(),
            Err(ScenarioError::OutOfRange { field: "height", .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let text = r#"(
            name: "Empty",
            config: (round_limit: 0),
            player: (troops: "knights"),
            enemy: (troops: "knights"),
        )"#;
        assert!(matches!(
            Scenario::from_ron_str(text),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Scenario::load("/definitely/not/here.ron");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.ron");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(Scenario::load(&path).unwrap().name, "Test");
    }

    #[test]
    fn test_shipped_scenarios_load() {
        let skirmish = Scenario::from_ron_str(include_str!("../scenarios/skirmish.ron")).unwrap();
        assert_eq!(skirmish, Scenario::skirmish());

        let ridge = Scenario::from_ron_str(include_str!("../scenarios/ridge.ron")).unwrap();
        let ctx = ridge.build_context().unwrap();
        assert_eq!(ctx.roster(Side::Player).troops.len(), 16);
        assert_eq!(ctx.roster(Side::Player).troops[0].max_hp, Fixed::from_num(22));
        assert_eq!(ctx.roster(Side::Enemy).general.max_hp, Fixed::from_num(140));
        assert!(ridge.terrain.build().is_ok());
    }

    #[test]
    fn test_default_skirmish_round_trips_through_ron() {
        let scenario = Scenario::skirmish();
        let text = ron::to_string(&scenario).unwrap();
        assert_eq!(Scenario::from_ron_str(&text).unwrap(), scenario);
    }
}
