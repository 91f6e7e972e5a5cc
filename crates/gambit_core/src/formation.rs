//! Formations: stat bonuses and spatial layouts.
//!
//! A [`Formation`] pairs a name with a [`FormationBonus`]. The name also
//! selects the layout used to deploy the side's troops; names with no
//! dedicated layout fall back to a ring.

use serde::{Deserialize, Serialize};

use crate::combatant::Side;
use crate::config::{BattleConfig, LayoutSpacing};
use crate::math::{decimal_serde, Fixed, Vec2Fixed};
use crate::roster::Roster;
use crate::terrain::Terrain;

// ============================================================================
// Bonuses and catalogue
// ============================================================================

/// Multipliers a formation applies to its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationBonus {
    /// Outgoing damage multiplier.
    #[serde(with = "decimal_serde")]
    pub atk: Fixed,
    /// Incoming damage multiplier. Carried and reported, not applied.
    #[serde(with = "decimal_serde")]
    pub def: Fixed,
    /// Movement speed multiplier.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
}

impl FormationBonus {
    /// All multipliers at 1.0.
    pub const NEUTRAL: Self = Self {
        atk: Fixed::ONE,
        def: Fixed::ONE,
        speed: Fixed::ONE,
    };

    /// Build a bonus from decimal multipliers.
    #[must_use]
    pub fn new(atk: f64, def: f64, speed: f64) -> Self {
        Self {
            atk: Fixed::from_num(atk),
            def: Fixed::from_num(def),
            speed: Fixed::from_num(speed),
        }
    }
}

impl Default for FormationBonus {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A named formation. Immutable for the duration of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    /// Display name; also selects the layout.
    pub name: String,
    /// Stat multipliers.
    pub bonus: FormationBonus,
}

impl Formation {
    /// Create a formation.
    #[must_use]
    pub fn new(name: impl Into<String>, bonus: FormationBonus) -> Self {
        Self {
            name: name.into(),
            bonus,
        }
    }

    /// The standard formations, in a fixed order.
    #[must_use]
    pub fn catalogue() -> Vec<Formation> {
        vec![
            Self::new("Phalanx", FormationBonus::new(1.0, 1.3, 0.8)),
            Self::new("Wedge", FormationBonus::new(1.3, 0.9, 1.1)),
            Self::new("Line", FormationBonus::new(1.1, 1.0, 1.0)),
            Self::new("Circle", FormationBonus::new(0.9, 1.2, 0.9)),
        ]
    }

    /// Look up a catalogue formation by name (case-insensitive).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Formation> {
        Self::catalogue()
            .into_iter()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Layout this formation deploys in.
    #[must_use]
    pub fn layout_kind(&self) -> LayoutKind {
        LayoutKind::from_name(&self.name)
    }
}

impl Default for Formation {
    fn default() -> Self {
        Self::new("Grid", FormationBonus::NEUTRAL)
    }
}

// ============================================================================
// Layout generator
// ============================================================================

/// Spatial arrangement families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Near-square grid.
    Grid,
    /// Triangle with the point toward the enemy.
    Wedge,
    /// Single rank.
    Line,
    /// Evenly spaced circle. Used for any unrecognised name.
    Ring,
}

impl LayoutKind {
    /// Map a formation name to its layout (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "phalanx" | "grid" => Self::Grid,
            "wedge" => Self::Wedge,
            "line" => Self::Line,
            _ => Self::Ring,
        }
    }

    /// Generate `count` offsets in this arrangement.
    #[must_use]
    pub fn offsets(self, count: usize, spacing: &LayoutSpacing) -> Vec<Vec2Fixed> {
        match self {
            Self::Grid => grid_layout(count, spacing.grid),
            Self::Wedge => wedge_layout(count, spacing.wedge),
            Self::Line => line_layout(count, spacing.line),
            Self::Ring => ring_layout(count, spacing.ring_radius),
        }
    }
}

/// Generate `count` offsets for the named layout.
///
/// Offsets are in the side-local frame: `x` lateral across the front,
/// `z` depth behind the front rank. The result is deterministic and has
/// exactly `count` distinct entries.
#[must_use]
pub fn layout(name: &str, count: usize, spacing: &LayoutSpacing) -> Vec<Vec2Fixed> {
    LayoutKind::from_name(name).offsets(count, spacing)
}

/// Offset of slot `index` in a centred run of `len` slots.
///
/// Computed as `(2 * index - (len - 1)) * spacing / 2` so odd and even
/// runs both stay exact.
fn centred(index: usize, len: usize, spacing: Fixed) -> Fixed {
    let doubled = Fixed::from_num(2 * index) - Fixed::from_num(len.saturating_sub(1));
    doubled * spacing / Fixed::from_num(2)
}

/// Smallest `n` with `n * n >= count`.
fn ceil_sqrt(count: usize) -> usize {
    let mut n = 0;
    while n * n < count {
        n += 1;
    }
    n
}

fn grid_layout(count: usize, spacing: Fixed) -> Vec<Vec2Fixed> {
    if count == 0 {
        return Vec::new();
    }
    let rows = ceil_sqrt(count);
    let cols = count.div_ceil(rows);

    (0..count)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Vec2Fixed::new(centred(col, cols, spacing), centred(row, rows, spacing))
        })
        .collect()
}

fn wedge_layout(count: usize, spacing: Fixed) -> Vec<Vec2Fixed> {
    let mut offsets = Vec::with_capacity(count);
    let mut row = 0;
    while offsets.len() < count {
        let slots = (row + 1).min(count - offsets.len());
        for slot in 0..slots {
            offsets.push(Vec2Fixed::new(
                centred(slot, row + 1, spacing),
                Fixed::from_num(row) * spacing,
            ));
        }
        row += 1;
    }
    offsets
}

fn line_layout(count: usize, spacing: Fixed) -> Vec<Vec2Fixed> {
    (0..count)
        .map(|i| Vec2Fixed::new(centred(i, count, spacing), Fixed::ZERO))
        .collect()
}

fn ring_layout(count: usize, radius: Fixed) -> Vec<Vec2Fixed> {
    // Trig runs in f64 once per deployment; the results are snapped to
    // fixed point before they touch simulation state.
    let r = radius.to_num::<f64>();
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = std::f64::consts::TAU * i as f64 / count as f64;
            Vec2Fixed::new(
                Fixed::from_num(r * angle.cos()),
                Fixed::from_num(r * angle.sin()),
            )
        })
        .collect()
}

// ============================================================================
// Placement
// ============================================================================

/// Deploy a roster around its side's anchor.
///
/// The player anchors at `-anchor_distance` on x and faces +x, the enemy
/// at `+anchor_distance` facing -x. Depth runs away from the enemy, so
/// the two deployments mirror each other across `x = 0`. The general
/// stands `general_offset` behind the anchor on the centre line.
pub fn deploy(
    roster: &mut Roster,
    formation: &Formation,
    config: &BattleConfig,
    terrain: &dyn Terrain,
) {
    let side = roster.side;
    let forward = side.forward();
    let anchor = anchor_x(side, config);
    let offsets = formation
        .layout_kind()
        .offsets(roster.troops.len(), &config.spacing);

    for (troop, offset) in roster.troops.iter_mut().zip(offsets) {
        troop.position = Vec2Fixed::new(anchor.saturating_sub(forward * offset.z), offset.x);
        troop.height = terrain.height_at(troop.position.x, troop.position.z);
        troop.facing = Vec2Fixed::new(forward, Fixed::ZERO);
    }

    let general = &mut roster.general;
    general.position = Vec2Fixed::new(
        anchor.saturating_sub(forward.saturating_mul(config.general_offset)),
        Fixed::ZERO,
    );
    general.height = terrain.height_at(general.position.x, general.position.z);
    general.facing = Vec2Fixed::new(forward, Fixed::ZERO);

    tracing::debug!(
        side = side.label(),
        formation = %formation.name,
        troops = roster.troops.len(),
        "Deployed roster"
    );
}

/// Anchor x coordinate for a side.
#[must_use]
pub fn anchor_x(side: Side, config: &BattleConfig) -> Fixed {
    -side.forward().saturating_mul(config.anchor_distance)
}
