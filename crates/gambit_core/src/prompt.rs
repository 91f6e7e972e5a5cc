//! Free-text prompt heuristics.
//!
//! Turns a player's description ("elite crossbow sniper", "wedge of
//! paladins") into combatant specs and formations. Every rule table is
//! evaluated top to bottom and the first match wins. Wherever a choice
//! has to be made without a keyword, a stable hash of the prompt picks
//! it, so the same text always yields the same result.

use crate::combatant::{general_stats, Archetype, CombatantSpec, Kind, Side, WeaponClass};
use crate::formation::Formation;
use crate::math::Fixed;

/// Keyword rule: any keyword found as a substring triggers the effect.
type Rule<T> = (&'static [&'static str], T);

/// Archetype rules. Weapon roles come before body types, so a "mounted
/// archer" is ranged.
const ARCHETYPE_RULES: &[Rule<Archetype>] = &[
    (
        &["bow", "archer", "crossbow", "gun", "ranged", "sniper", "shooter"],
        Archetype::Ranged,
    ),
    (
        &["magic", "mage", "wizard", "sorcerer", "spell", "shaman", "witch", "warlock"],
        Archetype::Magic,
    ),
    (
        &["shield", "tank", "defender", "paladin", "guard", "protector"],
        Archetype::Defender,
    ),
    (&["mounted", "rider", "cavalry", "horse", "beast"], Archetype::Mounted),
    (
        &["fly", "wing", "dragon", "griffin", "bird", "flying", "angel"],
        Archetype::Flying,
    ),
    (
        &["spider", "insect", "bug", "arachnid", "alien", "mantis", "scorpion"],
        Archetype::Insectoid,
    ),
];

/// General hit point rules.
const GENERAL_HP_RULES: &[Rule<i32>] = &[
    (&["tank", "heavy", "armor"], 140),
    (&["fast", "quick", "light"], 80),
    (&["elite", "strong", "powerful"], 120),
];

/// General special ability rules, per weapon role.
const RANGED_SPECIALS: &[Rule<&str>] = &[
    (&["volley", "multi"], "Volley Shot"),
    (&["snipe", "precision"], "Precision Shot"),
];
const MAGIC_SPECIALS: &[Rule<&str>] = &[
    (&["fire", "flame"], "Fireball"),
    (&["ice", "frost"], "Ice Storm"),
    (&["lightning", "thunder"], "Lightning Bolt"),
];
const MELEE_SPECIALS: &[Rule<&str>] = &[
    (&["charge", "rush"], "Charge Attack"),
    (&["shield", "defend"], "Shield Wall"),
];

fn first_match<T: Copy>(rules: &[Rule<T>], lower: &str) -> Option<T> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|&(_, effect)| effect)
}

/// FNV-1a over the lowercased prompt.
///
/// Stable across runs and platforms, unlike `DefaultHasher`.
#[must_use]
pub fn stable_hash(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    text.to_lowercase()
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Pick an index in `0..len` from the prompt hash.
fn hashed_index(text: &str, len: usize) -> usize {
    // len is small; the remainder always fits in usize.
    usize::try_from(stable_hash(text) % len.max(1) as u64).unwrap_or(0)
}

/// Archetype described by a prompt; melee when nothing matches.
#[must_use]
pub fn archetype_from_prompt(text: &str) -> Archetype {
    first_match(ARCHETYPE_RULES, &text.to_lowercase()).unwrap_or(Archetype::Melee)
}

/// Build a combatant spec from a prompt.
///
/// Troops get the archetype's default stats. Generals get general stats
/// with hit points from [`general_hp_from_prompt`].
#[must_use]
pub fn spec_from_prompt(text: &str, side: Side, kind: Kind) -> CombatantSpec {
    let archetype = archetype_from_prompt(text);
    let spec = CombatantSpec {
        archetype: archetype.name().to_string(),
        side,
        kind,
        stats: None,
    };
    match kind {
        Kind::Troop => spec,
        Kind::General => {
            let hp = Fixed::from_num(general_hp_from_prompt(text));
            spec.with_stats(general_stats().with_max_hp(hp))
        }
    }
}

/// General hit points: a keyword tier if one matches, else `100 + h % 50`.
#[must_use]
pub fn general_hp_from_prompt(text: &str) -> i32 {
    let lower = text.to_lowercase();
    first_match(GENERAL_HP_RULES, &lower).unwrap_or_else(|| {
        // Always below 50.
        100 + i32::try_from(stable_hash(text) % 50).unwrap_or(0)
    })
}

/// Flavour details for a prompt-generated general.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralProfile {
    /// Display name.
    pub name: String,
    /// Special ability label. Flavour only.
    pub special: &'static str,
    /// Combatant spec.
    pub spec: CombatantSpec,
}

/// Build a general from a prompt.
///
/// The name is one of the prompt's words longer than two letters, picked
/// by hash and capitalised.
#[must_use]
pub fn general_from_prompt(text: &str, side: Side) -> GeneralProfile {
    let lower = text.to_lowercase();
    let spec = spec_from_prompt(text, side, Kind::General);

    let words: Vec<&str> = text.split_whitespace().filter(|w| w.chars().count() > 2).collect();
    let name = if words.is_empty() {
        "Custom General".to_string()
    } else {
        capitalise(words[hashed_index(text, words.len())])
    };

    let special = match archetype_from_prompt(text).weapon_class() {
        WeaponClass::Ranged => {
            first_match(RANGED_SPECIALS, &lower).unwrap_or("Quick Draw")
        }
        WeaponClass::Magic => {
            first_match(MAGIC_SPECIALS, &lower).unwrap_or("Arcane Blast")
        }
        WeaponClass::Melee => {
            first_match(MELEE_SPECIALS, &lower).unwrap_or("Battle Cry")
        }
    };

    GeneralProfile {
        name,
        special,
        spec,
    }
}

fn capitalise(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Formation named in a prompt, or a catalogue entry chosen by hash.
#[must_use]
pub fn formation_from_prompt(text: &str) -> Formation {
    let lower = text.to_lowercase();
    let catalogue = Formation::catalogue();
    if let Some(f) = catalogue
        .iter()
        .find(|f| lower.contains(&f.name.to_lowercase()))
    {
        return f.clone();
    }
    let index = hashed_index(text, catalogue.len());
    catalogue
        .into_iter()
        .nth(index)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_roles_take_priority() {
        assert_eq!(archetype_from_prompt("Mounted archers"), Archetype::Ranged);
        assert_eq!(archetype_from_prompt("dragon WIZARD"), Archetype::Magic);
        assert_eq!(archetype_from_prompt("shield wall"), Archetype::Defender);
        assert_eq!(archetype_from_prompt("giant scorpion"), Archetype::Insectoid);
        assert_eq!(archetype_from_prompt("angelic host"), Archetype::Flying);
        assert_eq!(archetype_from_prompt("peasants"), Archetype::Melee);
    }

    #[test]
    fn test_troop_spec_has_no_explicit_stats() {
        let spec = spec_from_prompt("crossbowmen", Side::Enemy, Kind::Troop);
        assert_eq!(spec.archetype, "ranged");
        assert_eq!(spec.side, Side::Enemy);
        assert!(spec.stats.is_none());
    }

    #[test]
    fn test_general_hp_keyword_tiers() {
        assert_eq!(general_hp_from_prompt("heavy knight"), 140);
        assert_eq!(general_hp_from_prompt("quick scout"), 80);
        assert_eq!(general_hp_from_prompt("elite captain"), 120);
    }

    #[test]
    fn test_general_hp_hashed_range_and_stable() {
        let hp = general_hp_from_prompt("old grey commander");
        assert!((100..150).contains(&hp));
        assert_eq!(hp, general_hp_from_prompt("old grey commander"));
    }

    #[test]
    fn test_general_profile() {
        let g = general_from_prompt("fire mage of the north", Side::Player);
        assert_eq!(g.special, "Fireball");
        assert!(["Fire", "Mage", "The", "North"].contains(&g.name.as_str()));
        assert_eq!(g.spec.kind, Kind::General);
        assert!(g.spec.stats.is_some());

        assert_eq!(general_from_prompt("ox", Side::Enemy).name, "Custom General");
    }

    #[test]
    fn test_formation_by_name_then_hash() {
        assert_eq!(formation_from_prompt("a tight PHALANX").name, "Phalanx");
        assert_eq!(formation_from_prompt("circle the wagons").name, "Circle");

        let picked = formation_from_prompt("whatever works");
        assert!(Formation::catalogue().contains(&picked));
        assert_eq!(picked, formation_from_prompt("whatever works"));
    }

    #[test]
    fn test_stable_hash_known_value() {
        // FNV-1a of the empty string is the offset basis.
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stable_hash("Wedge"), stable_hash("wedge"));
    }
}
