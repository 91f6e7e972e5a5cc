//! Combatant records and the combatant factory.
//!
//! A [`Combatant`] is one troop or one general. Troops and generals share
//! the same capability surface (position, hp, attack, range), so every
//! pass of the simulation treats them uniformly; only targeting priority
//! looks at [`Kind`].

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for combatants within one battle.
pub type CombatantId = u32;

/// The two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The initiating side. Deploys on negative x and wins exact ties.
    Player,
    /// The opposing side. Deploys on positive x.
    Enemy,
}

impl Side {
    /// The side that moves first and wins exact ties.
    pub const INITIATOR: Side = Side::Player;

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Direction this side faces along x at deployment (+1 or -1).
    #[must_use]
    pub fn forward(self) -> Fixed {
        match self {
            Self::Player => Fixed::ONE,
            Self::Enemy => -Fixed::ONE,
        }
    }

    /// Lowercase label for logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}

/// Troop or commanding general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Rank-and-file unit.
    Troop,
    /// The side's commander. Its death ends the battle.
    General,
}

/// Body archetype of a combatant.
///
/// Only the derived [`WeaponClass`] matters to combat; the rest is
/// presentation data passed through to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Archetype {
    /// Biped with a close-range weapon. Fallback for unknown names.
    #[default]
    Melee,
    /// Bows, guns and other missile weapons.
    Ranged,
    /// Spellcasters.
    Magic,
    /// Shield bearers.
    Defender,
    /// Riders and beasts.
    Mounted,
    /// Winged units.
    Flying,
    /// Arthropod bodies.
    Insectoid,
}

impl Archetype {
    /// Every archetype, in declaration order.
    pub const ALL: [Archetype; 7] = [
        Self::Melee,
        Self::Ranged,
        Self::Magic,
        Self::Defender,
        Self::Mounted,
        Self::Flying,
        Self::Insectoid,
    ];

    /// Parse an archetype name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.name() == lower)
    }

    /// Parse an archetype name, substituting [`Archetype::Melee`] when the
    /// name is not recognised.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(archetype = name, "Unknown archetype, using melee");
            Self::default()
        })
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Magic => "magic",
            Self::Defender => "defender",
            Self::Mounted => "mounted",
            Self::Flying => "flying",
            Self::Insectoid => "insectoid",
        }
    }

    /// Weapon class used by the combat rules.
    #[must_use]
    pub const fn weapon_class(self) -> WeaponClass {
        match self {
            Self::Ranged => WeaponClass::Ranged,
            Self::Magic => WeaponClass::Magic,
            Self::Melee | Self::Defender | Self::Mounted | Self::Flying | Self::Insectoid => {
                WeaponClass::Melee
            }
        }
    }
}

/// Weapon class: the part of an archetype that affects combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    /// Strikes adjacent targets.
    Melee,
    /// Fires projectiles.
    Ranged,
    /// Casts bolts.
    Magic,
}

impl WeaponClass {
    /// Whether attacks from this class are drawn as projectiles.
    #[must_use]
    pub const fn fires_projectiles(self) -> bool {
        matches!(self, Self::Ranged | Self::Magic)
    }

    /// Default troop stats for this weapon class.
    #[must_use]
    pub fn troop_stats(self) -> BaseStats {
        match self {
            Self::Melee => BaseStats::new(30, 4, Fixed::from_num(1.5), 10),
            Self::Ranged => BaseStats::new(20, 3, Fixed::from_num(8), 15),
            Self::Magic => BaseStats::new(18, 6, Fixed::from_num(6), 20),
        }
    }
}

/// Default general stats, independent of archetype.
#[must_use]
pub fn general_stats() -> BaseStats {
    BaseStats::new(100, 5, Fixed::from_num(2), 6)
}

/// Base combat statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub max_hp: Fixed,
    /// Damage per attack before formation bonuses.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,
    /// Attack reach on the ground plane.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Ticks between attacks.
    pub attack_rate: i32,
}

impl BaseStats {
    /// Create stats from whole-number hp and attack.
    #[must_use]
    pub fn new(max_hp: i32, attack: i32, range: Fixed, attack_rate: i32) -> Self {
        Self {
            max_hp: Fixed::from_num(max_hp),
            attack: Fixed::from_num(attack),
            range,
            attack_rate,
        }
    }

    /// Builder: override max hp.
    #[must_use]
    pub fn with_max_hp(mut self, max_hp: Fixed) -> Self {
        self.max_hp = max_hp;
        self
    }

    /// Builder: override attack.
    #[must_use]
    pub fn with_attack(mut self, attack: Fixed) -> Self {
        self.attack = attack;
        self
    }

    /// Builder: override range.
    #[must_use]
    pub fn with_range(mut self, range: Fixed) -> Self {
        self.range = range;
        self
    }

    /// Builder: override attack rate.
    #[must_use]
    pub fn with_attack_rate(mut self, attack_rate: i32) -> Self {
        self.attack_rate = attack_rate;
        self
    }

    /// Repair values the simulation cannot use.
    ///
    /// Non-positive hp takes `fallback`'s hp, an attack rate below one
    /// becomes one, a negative range becomes zero.
    #[must_use]
    fn sanitized(mut self, fallback: &BaseStats) -> Self {
        if self.max_hp <= Fixed::ZERO {
            tracing::warn!(max_hp = %self.max_hp, "Non-positive max hp, using default");
            self.max_hp = fallback.max_hp;
        }
        if self.attack_rate < 1 {
            tracing::warn!(attack_rate = self.attack_rate, "Attack rate below 1, clamping");
            self.attack_rate = 1;
        }
        if self.range < Fixed::ZERO {
            tracing::warn!(range = %self.range, "Negative range, clamping to zero");
            self.range = Fixed::ZERO;
        }
        self
    }
}

/// Input to the combatant factory.
///
/// The archetype is kept as free text because it usually comes from an
/// external source (a prompt or a scenario file); the factory resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSpec {
    /// Archetype name, resolved case-insensitively.
    pub archetype: String,
    /// Owning side.
    pub side: Side,
    /// Troop or general.
    pub kind: Kind,
    /// Explicit stats; `None` uses the defaults for the archetype and kind.
    #[serde(default)]
    pub stats: Option<BaseStats>,
}

impl CombatantSpec {
    /// A troop spec with default stats.
    #[must_use]
    pub fn troop(archetype: impl Into<String>, side: Side) -> Self {
        Self {
            archetype: archetype.into(),
            side,
            kind: Kind::Troop,
            stats: None,
        }
    }

    /// A general spec with default stats.
    #[must_use]
    pub fn general(archetype: impl Into<String>, side: Side) -> Self {
        Self {
            archetype: archetype.into(),
            side,
            kind: Kind::General,
            stats: None,
        }
    }

    /// Builder: set explicit stats.
    #[must_use]
    pub fn with_stats(mut self, stats: BaseStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// The same spec for the other side.
    #[must_use]
    pub fn for_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// One troop or general on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    /// Identifier, unique within the battle.
    pub id: CombatantId,
    /// Owning side.
    pub side: Side,
    /// Troop or general.
    pub kind: Kind,
    /// Body archetype.
    pub archetype: Archetype,
    /// Current hit points. Never negative; never rises during a battle.
    #[serde(with = "fixed_serde")]
    pub hp: Fixed,
    /// Hit points at spawn.
    #[serde(with = "fixed_serde")]
    pub max_hp: Fixed,
    /// Damage per attack before formation bonuses.
    #[serde(with = "fixed_serde")]
    pub attack: Fixed,
    /// Attack reach on the ground plane.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Ticks between attacks.
    pub attack_rate: i32,
    /// Ticks until the next legal attack. Attacks need `cooldown <= 0`.
    pub cooldown: i32,
    /// Ground-plane position. The origin until placed.
    pub position: Vec2Fixed,
    /// Terrain height under the combatant. Rendering only.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
    /// Unit facing direction on the ground plane.
    pub facing: Vec2Fixed,
    /// Cleared when the combatant dies.
    pub visible: bool,
}

impl Combatant {
    /// Build a combatant from a spec.
    ///
    /// Never fails: unknown archetypes become [`Archetype::Melee`] and
    /// unusable stats are repaired, each with a warning.
    #[must_use]
    pub fn from_spec(id: CombatantId, spec: &CombatantSpec) -> Self {
        let archetype = Archetype::parse_or_default(&spec.archetype);
        let defaults = match spec.kind {
            Kind::Troop => archetype.weapon_class().troop_stats(),
            Kind::General => general_stats(),
        };
        let stats = spec.stats.unwrap_or(defaults).sanitized(&defaults);

        Self {
            id,
            side: spec.side,
            kind: spec.kind,
            archetype,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            attack: stats.attack,
            range: stats.range,
            attack_rate: stats.attack_rate,
            cooldown: 0,
            position: Vec2Fixed::ZERO,
            height: Fixed::ZERO,
            facing: Vec2Fixed::new(spec.side.forward(), Fixed::ZERO),
            visible: true,
        }
    }

    /// Whether the combatant is still fighting.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > Fixed::ZERO
    }

    /// Ground-plane distance to another combatant.
    #[must_use]
    pub fn distance_to(&self, other: &Combatant) -> Fixed {
        self.position.distance(other.position)
    }

    /// Whether `other` is within attack range.
    #[must_use]
    pub fn in_range_of(&self, other: &Combatant) -> bool {
        self.position.distance_squared(other.position) <= self.range.saturating_mul(self.range)
    }

    /// Remaining hp as a fraction of max hp.
    #[must_use]
    pub fn hp_fraction(&self) -> Fixed {
        if self.max_hp <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        self.hp / self.max_hp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_full_health_no_cooldown() {
        let c = Combatant::from_spec(1, &CombatantSpec::troop("ranged", Side::Enemy));
        assert_eq!(c.archetype, Archetype::Ranged);
        assert_eq!(c.hp, c.max_hp);
        assert_eq!(c.hp, Fixed::from_num(20));
        assert_eq!(c.cooldown, 0);
        assert!(c.is_alive());
        assert!(c.visible);
    }

    #[test]
    fn test_unknown_archetype_falls_back_to_melee() {
        let c = Combatant::from_spec(7, &CombatantSpec::troop("unknown-xyz", Side::Player));
        assert_eq!(c.archetype, Archetype::Melee);
        assert_eq!(c.max_hp, WeaponClass::Melee.troop_stats().max_hp);
        assert_eq!(c.side, Side::Player);
        assert!(c.is_alive());
    }

    #[test]
    fn test_archetype_parse_case_insensitive() {
        assert_eq!(Archetype::parse("  MaGiC "), Some(Archetype::Magic));
        assert_eq!(Archetype::parse("insectoid"), Some(Archetype::Insectoid));
        assert_eq!(Archetype::parse("dragon"), None);
    }

    #[test]
    fn test_visual_archetypes_fight_as_melee() {
        for archetype in [
            Archetype::Defender,
            Archetype::Mounted,
            Archetype::Flying,
            Archetype::Insectoid,
        ] {
            assert_eq!(archetype.weapon_class(), WeaponClass::Melee);
        }
        assert!(WeaponClass::Magic.fires_projectiles());
        assert!(!WeaponClass::Melee.fires_projectiles());
    }

    #[test]
    fn test_general_uses_general_stats() {
        let c = Combatant::from_spec(0, &CombatantSpec::general("magic", Side::Player));
        assert_eq!(c.kind, Kind::General);
        assert_eq!(c.max_hp, Fixed::from_num(100));
        assert_eq!(c.attack, Fixed::from_num(5));
    }

    #[test]
    fn test_explicit_stats_are_repaired() {
        let broken = BaseStats::new(-5, 3, Fixed::from_num(-1), 0);
        let c = Combatant::from_spec(2, &CombatantSpec::troop("melee", Side::Enemy).with_stats(broken));
        assert_eq!(c.max_hp, WeaponClass::Melee.troop_stats().max_hp);
        assert_eq!(c.attack_rate, 1);
        assert_eq!(c.range, Fixed::ZERO);
        assert_eq!(c.attack, Fixed::from_num(3));
    }

    #[test]
    fn test_in_range_matches_distance() {
        let mut a = Combatant::from_spec(1, &CombatantSpec::troop("melee", Side::Player));
        let mut b = Combatant::from_spec(2, &CombatantSpec::troop("melee", Side::Enemy));
        a.position = Vec2Fixed::ZERO;
        b.position = Vec2Fixed::new(Fixed::from_num(1.5), Fixed::ZERO);
        assert!(a.in_range_of(&b));
        b.position = Vec2Fixed::new(Fixed::from_num(1.6), Fixed::ZERO);
        assert!(!a.in_range_of(&b));
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::INITIATOR, Side::Player);
        assert_eq!(Side::Enemy.forward(), -Fixed::ONE);
    }
}
