//! Per-tick output consumed by renderers and reports.

use serde::{Deserialize, Serialize};

use crate::combatant::{Archetype, Combatant, CombatantId, Kind, Side, WeaponClass};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::state::RoundOutcome;

/// Discrete things that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A blow landed.
    Attack {
        /// Attacker id.
        attacker: CombatantId,
        /// Defender id.
        defender: CombatantId,
        /// Damage dealt.
        #[serde(with = "fixed_serde")]
        damage: Fixed,
    },
    /// A ranged or magic attack was fired. Visual only.
    Projectile {
        /// Attacker id.
        attacker: CombatantId,
        /// Launch point.
        from: Vec2Fixed,
        /// Impact point.
        to: Vec2Fixed,
        /// Projectile style.
        weapon: WeaponClass,
    },
    /// A combatant fell. Reported once per combatant.
    Death {
        /// Fallen combatant.
        id: CombatantId,
        /// Its side.
        side: Side,
        /// Troop or general.
        kind: Kind,
    },
}

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Battle tick this output belongs to (1-based).
    pub tick: u64,
    /// Combat events in resolution order.
    pub combat: Vec<CombatEvent>,
    /// Set on the tick that ended the battle.
    pub outcome: Option<RoundOutcome>,
}

impl TickEvents {
    /// Whether `id` already attacked this tick.
    #[must_use]
    pub fn attacked(&self, id: CombatantId) -> bool {
        self.combat
            .iter()
            .any(|e| matches!(e, CombatEvent::Attack { attacker, .. } if *attacker == id))
    }

    /// Deaths recorded this tick.
    pub fn deaths(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.combat.iter().filter_map(|e| match e {
            CombatEvent::Death { id, .. } => Some(*id),
            _ => None,
        })
    }
}

/// Read-only snapshot of one combatant for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantView {
    /// Combatant id.
    pub id: CombatantId,
    /// Owning side.
    pub side: Side,
    /// Troop or general.
    pub kind: Kind,
    /// Body archetype.
    pub archetype: Archetype,
    /// Ground-plane position.
    pub position: Vec2Fixed,
    /// Terrain height.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
    /// Facing direction.
    pub facing: Vec2Fixed,
    /// False once dead.
    pub visible: bool,
    /// Remaining hp over max hp.
    #[serde(with = "fixed_serde")]
    pub hp_fraction: Fixed,
}

impl From<&Combatant> for CombatantView {
    fn from(c: &Combatant) -> Self {
        Self {
            id: c.id,
            side: c.side,
            kind: c.kind,
            archetype: c.archetype,
            position: c.position,
            height: c.height,
            facing: c.facing,
            visible: c.visible,
            hp_fraction: c.hp_fraction(),
        }
    }
}

/// Receives the battlefield after every tick.
pub trait BattleObserver {
    /// Called once per tick with the post-tick views and that tick's events.
    fn on_tick(&mut self, tick: u64, views: &[CombatantView], events: &TickEvents);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl BattleObserver for NullObserver {
    fn on_tick(&mut self, _tick: u64, _views: &[CombatantView], _events: &TickEvents) {}
}
