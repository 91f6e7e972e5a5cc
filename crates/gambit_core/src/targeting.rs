//! Target selection and movement.

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::math::{Fixed, Vec2Fixed};
use crate::roster::Roster;
use crate::terrain::Terrain;

/// A slot in the opposing roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Troop at this roster index.
    Troop(usize),
    /// The roster's general.
    General,
}

/// Choose a target in `enemies` for a combatant standing at `from`.
///
/// Living troops always take priority: the nearest one wins, and an
/// exact distance tie goes to the earlier roster index. The general is
/// only targeted once every troop is down.
#[must_use]
pub fn select_target(from: Vec2Fixed, enemies: &Roster) -> Option<Target> {
    let nearest = enemies
        .troops
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_alive())
        .fold(None::<(usize, Fixed)>, |best, (i, t)| {
            let d = from.distance_squared(t.position);
            match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            }
        });

    match nearest {
        Some((i, _)) => Some(Target::Troop(i)),
        None if enemies.general_alive() => Some(Target::General),
        None => None,
    }
}

/// Turn `c` toward `target`. Leaves facing unchanged when the two
/// positions coincide.
pub fn face(c: &mut Combatant, target: Vec2Fixed) {
    let dir = (target - c.position).normalize();
    if dir != Vec2Fixed::ZERO {
        c.facing = dir;
    }
}

/// Advance `c` toward `target` by `step`, never past it, and snap its
/// height to the terrain.
pub fn advance(c: &mut Combatant, target: Vec2Fixed, step: Fixed, terrain: &dyn Terrain) {
    c.position = c.position.step_toward(target, step);
    c.height = terrain.height_at(c.position.x, c.position.z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantSpec, Side};
    use crate::terrain::FlatTerrain;

    fn enemies(positions: &[(i32, i32)]) -> Roster {
        let mut r = Roster::build(
            Side::Enemy,
            &CombatantSpec::troop("melee", Side::Enemy),
            &CombatantSpec::general("melee", Side::Enemy),
            positions.len(),
            0,
        );
        for (t, &(x, z)) in r.troops.iter_mut().zip(positions) {
            t.position = Vec2Fixed::from_ints(x, z);
        }
        r.general.position = Vec2Fixed::from_ints(50, 0);
        r
    }

    #[test]
    fn test_nearest_troop_wins() {
        let r = enemies(&[(10, 0), (3, 0), (5, 0)]);
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), Some(Target::Troop(1)));
    }

    #[test]
    fn test_tie_goes_to_first_in_roster() {
        let r = enemies(&[(0, 4), (4, 0), (0, -4)]);
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), Some(Target::Troop(0)));
    }

    #[test]
    fn test_dead_troops_skipped() {
        let mut r = enemies(&[(1, 0), (9, 0)]);
        r.troops[0].hp = Fixed::ZERO;
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), Some(Target::Troop(1)));
    }

    #[test]
    fn test_general_fallback_then_none() {
        let mut r = enemies(&[(1, 0)]);
        r.troops[0].hp = Fixed::ZERO;
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), Some(Target::General));
        r.general.hp = Fixed::ZERO;
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), None);
    }

    #[test]
    fn test_troops_beat_closer_general() {
        let mut r = enemies(&[(30, 0)]);
        r.general.position = Vec2Fixed::from_ints(1, 0);
        assert_eq!(select_target(Vec2Fixed::ZERO, &r), Some(Target::Troop(0)));
    }

    #[test]
    fn test_advance_and_face() {
        let mut c = Combatant::from_spec(0, &CombatantSpec::troop("melee", Side::Player));
        let target = Vec2Fixed::from_ints(0, 10);
        face(&mut c, target);
        assert_eq!(c.facing, Vec2Fixed::from_ints(0, 1));
        advance(&mut c, target, Fixed::ONE, &FlatTerrain::at(Fixed::from_num(2)));
        assert_eq!(c.position, Vec2Fixed::from_ints(0, 1));
        assert_eq!(c.height, Fixed::from_num(2));
    }
}
