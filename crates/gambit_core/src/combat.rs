//! Damage resolution.
//!
//! Damage is `attack * atk bonus`, clamped at zero so a negative attack
//! can never heal. The defender's formation `def` multiplier is carried
//! on [`FormationBonus`] but deliberately left out of the damage formula.

use crate::combatant::Combatant;
use crate::events::CombatEvent;
use crate::formation::FormationBonus;
use crate::math::Fixed;

/// Damage `attacker` deals per blow under `bonus`.
#[must_use]
pub fn damage(attacker: &Combatant, bonus: &FormationBonus) -> Fixed {
    attacker.attack.saturating_mul(bonus.atk).max(Fixed::ZERO)
}

/// Apply one blow from `attacker` to `defender`.
///
/// Dead defenders are ignored so that each death is reported exactly
/// once. Returns the damage dealt, or `None` if nothing happened.
pub fn resolve(
    attacker: &Combatant,
    bonus: &FormationBonus,
    defender: &mut Combatant,
    events: &mut Vec<CombatEvent>,
) -> Option<Fixed> {
    if !defender.is_alive() {
        return None;
    }

    let dealt = damage(attacker, bonus);
    defender.hp = defender.hp.saturating_sub(dealt);

    events.push(CombatEvent::Attack {
        attacker: attacker.id,
        defender: defender.id,
        damage: dealt,
    });

    let weapon = attacker.archetype.weapon_class();
    if weapon.fires_projectiles() {
        events.push(CombatEvent::Projectile {
            attacker: attacker.id,
            from: attacker.position,
            to: defender.position,
            weapon,
        });
    }

    tracing::trace!(
        attacker = attacker.id,
        defender = defender.id,
        damage = %dealt,
        hp = %defender.hp,
        "Attack"
    );

    if defender.hp <= Fixed::ZERO {
        defender.hp = Fixed::ZERO;
        defender.visible = false;
        events.push(CombatEvent::Death {
            id: defender.id,
            side: defender.side,
            kind: defender.kind,
        });
        tracing::debug!(id = defender.id, side = defender.side.label(), "Combatant died");
    }

    Some(dealt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{BaseStats, CombatantSpec, Side, WeaponClass};

    fn pair(attacker_archetype: &str) -> (Combatant, Combatant) {
        (
            Combatant::from_spec(1, &CombatantSpec::troop(attacker_archetype, Side::Player)),
            Combatant::from_spec(2, &CombatantSpec::troop("melee", Side::Enemy)),
        )
    }

    #[test]
    fn test_damage_is_attack_times_bonus() {
        let (a, mut d) = pair("melee");
        let bonus = FormationBonus::new(1.5, 1.0, 1.0);
        let mut events = Vec::new();
        let before = d.hp;

        let dealt = resolve(&a, &bonus, &mut d, &mut events);

        assert_eq!(dealt, Some(Fixed::from_num(6)));
        assert_eq!(before - d.hp, Fixed::from_num(6));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_huge_attack_saturates_and_kills() {
        let (mut a, mut d) = pair("melee");
        a.attack = Fixed::MAX;
        let bonus = FormationBonus::new(1.3, 1.0, 1.0);
        let mut events = Vec::new();

        assert_eq!(damage(&a, &bonus), Fixed::MAX);
        assert_eq!(resolve(&a, &bonus, &mut d, &mut events), Some(Fixed::MAX));
        assert_eq!(d.hp, Fixed::ZERO);
        assert!(events.iter().any(|e| matches!(e, CombatEvent::Death { id: 2, .. })));
    }

    #[test]
    fn test_def_bonus_not_applied() {
        let (a, mut d) = pair("melee");
        let mut events = Vec::new();
        // Only the attacker's bonus is consulted.
        resolve(&a, &FormationBonus::new(1.0, 5.0, 1.0), &mut d, &mut events);
        assert_eq!(d.hp, Fixed::from_num(26));
    }

    #[test]
    fn test_negative_attack_never_heals() {
        let a = Combatant::from_spec(
            1,
            &CombatantSpec::troop("melee", Side::Player)
                .with_stats(WeaponClass::Melee.troop_stats().with_attack(Fixed::from_num(-3))),
        );
        let (_, mut d) = pair("melee");
        let mut events = Vec::new();
        assert_eq!(resolve(&a, &FormationBonus::NEUTRAL, &mut d, &mut events), Some(Fixed::ZERO));
        assert_eq!(d.hp, d.max_hp);
    }

    #[test]
    fn test_ranged_emits_projectile() {
        let (a, mut d) = pair("ranged");
        let mut events = Vec::new();
        resolve(&a, &FormationBonus::NEUTRAL, &mut d, &mut events);
        assert!(matches!(
            events[1],
            CombatEvent::Projectile {
                weapon: WeaponClass::Ranged,
                ..
            }
        ));
    }

    #[test]
    fn test_death_reported_once() {
        let a = Combatant::from_spec(
            1,
            &CombatantSpec::troop("melee", Side::Player)
                .with_stats(BaseStats::new(30, 100, Fixed::ONE, 1)),
        );
        let (_, mut d) = pair("melee");
        let mut events = Vec::new();

        resolve(&a, &FormationBonus::NEUTRAL, &mut d, &mut events);
        assert_eq!(d.hp, Fixed::ZERO);
        assert!(!d.is_alive());
        assert!(!d.visible);

        assert_eq!(resolve(&a, &FormationBonus::NEUTRAL, &mut d, &mut events), None);
        let deaths = events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Death { .. }))
            .count();
        assert_eq!(deaths, 1);
    }
}
