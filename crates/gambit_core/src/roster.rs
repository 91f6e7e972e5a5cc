//! Per-side rosters.

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId, CombatantSpec, Side};
use crate::math::Fixed;
use crate::targeting::Target;

/// One side's combatants: troops in roster order plus the general.
///
/// Dead combatants stay in place; roster order never changes during a
/// battle, which keeps tie-breaks and iteration deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Owning side.
    pub side: Side,
    /// Troops in roster order.
    pub troops: Vec<Combatant>,
    /// The side's general.
    pub general: Combatant,
}

impl Roster {
    /// Build a roster of `count` identical troops plus a general.
    ///
    /// Ids are assigned sequentially from `first_id`, troops first. The
    /// specs are forced onto `side`.
    #[must_use]
    pub fn build(
        side: Side,
        troop: &CombatantSpec,
        general: &CombatantSpec,
        count: usize,
        first_id: CombatantId,
    ) -> Self {
        let troop = troop.clone().for_side(side);
        let mut next_id = first_id;
        let troops = (0..count)
            .map(|_| {
                let c = Combatant::from_spec(next_id, &troop);
                next_id += 1;
                c
            })
            .collect();
        let general = Combatant::from_spec(next_id, &general.clone().for_side(side));
        Self {
            side,
            troops,
            general,
        }
    }

    /// Mutable combatant in a slot.
    pub fn get_mut(&mut self, slot: Target) -> &mut Combatant {
        match slot {
            Target::Troop(i) => &mut self.troops[i],
            Target::General => &mut self.general,
        }
    }

    /// All combatants in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.troops.iter().chain(std::iter::once(&self.general))
    }

    /// Living troops, excluding the general.
    #[must_use]
    pub fn living_troops(&self) -> usize {
        self.troops.iter().filter(|t| t.is_alive()).count()
    }

    /// Sum of hp over troops and general, saturating at `Fixed::MAX`.
    #[must_use]
    pub fn aggregate_hp(&self) -> Fixed {
        self.iter().fold(Fixed::ZERO, |sum, c| sum.saturating_add(c.hp))
    }

    /// Whether the general still stands.
    #[must_use]
    pub fn general_alive(&self) -> bool {
        self.general.is_alive()
    }

    /// Number of combatants, general included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.troops.len() + 1
    }

    /// Always false: a roster holds at least its general.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{BaseStats, Kind};

    fn roster(count: usize) -> Roster {
        Roster::build(
            Side::Enemy,
            &CombatantSpec::troop("ranged", Side::Player),
            &CombatantSpec::general("melee", Side::Player),
            count,
            10,
        )
    }

    #[test]
    fn test_build_assigns_side_and_ids() {
        let r = roster(3);
        let ids: Vec<_> = r.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11, 12, 13]);
        assert!(r.iter().all(|c| c.side == Side::Enemy));
        assert_eq!(r.general.kind, Kind::General);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_get_mut_by_slot() {
        let mut r = roster(2);
        r.get_mut(Target::Troop(1)).hp = Fixed::ONE;
        r.get_mut(Target::General).hp = Fixed::from_num(7);
        assert_eq!(r.troops[1].hp, Fixed::ONE);
        assert_eq!(r.general.hp, Fixed::from_num(7));
    }

    #[test]
    fn test_aggregate_hp_saturates() {
        let stats = BaseStats::new(200_000_000, 1, Fixed::ONE, 10);
        let r = Roster::build(
            Side::Player,
            &CombatantSpec::troop("melee", Side::Player).with_stats(stats),
            &CombatantSpec::general("melee", Side::Player),
            20,
            0,
        );
        assert_eq!(r.aggregate_hp(), Fixed::MAX);
    }

    #[test]
    fn test_aggregate_hp_counts_general() {
        let mut r = roster(2);
        assert_eq!(r.aggregate_hp(), Fixed::from_num(20 + 20 + 100));
        r.troops[0].hp = Fixed::ZERO;
        assert_eq!(r.living_troops(), 1);
        assert_eq!(r.aggregate_hp(), Fixed::from_num(120));
    }
}
