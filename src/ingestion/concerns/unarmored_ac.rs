//! Unarmored / Natural Armor Class
//!
//! Recognizes natural armor and unarmored defense formulas such as "your AC is
//! 13 + your Dexterity modifier" or "a base AC of 17". Armor item text ("This
//! armor has an AC of 14") is deliberately not matched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::ability_code;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnarmoredAc {
    pub base_ac: u32,
    /// First ability modifier added to the base ("DEX")
    pub ability_code: Option<String>,
    /// Second ability modifier, for formulas like 10 + DEX + CON
    pub secondary_ability_code: Option<String>,
    pub allows_shield: bool,
    /// The formula replaces worn armor entirely (armor can't be worn)
    pub replaces_armor: bool,
}

static AC_FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:calculate\s+your\s+AC\s+as
          |your\s+(?:base\s+)?(?:AC|Armor\s+Class)\s+(?:is|equals)
          |(?:a|your)\s+base\s+AC\s+of
        )
        \s+(?P<base>\d+)
        (?:\s*\+\s*(?:your\s+)?(?P<first>[A-Za-z]+)\s+modifier)?
        (?:\s*\+\s*(?:your\s+)?(?P<second>[A-Za-z]+)\s+modifier)?
        ",
    )
    .expect("Failed to compile AC formula regex")
});

static SHIELD_FORBIDDEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:can['’]t|cannot|can\s+not)\s+(?:use|wield)\s+a\s+shield|not\s+wielding\s+a\s+shield")
        .expect("Failed to compile shield restriction regex")
});

static ARMOR_FORBIDDEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:can['’]t|cannot|can\s+not)\s+wear\s+(?:light|medium|heavy|armor)")
        .expect("Failed to compile armor restriction regex")
});

const VALID_BASE_AC: std::ops::RangeInclusive<u32> = 10..=20;

/// Parse a natural armor or unarmored defense formula.
pub fn parse_unarmored_ac(text: &str) -> Option<UnarmoredAc> {
    let caps = AC_FORMULA.captures(text)?;
    let base_ac: u32 = caps.name("base")?.as_str().parse().ok()?;
    if !VALID_BASE_AC.contains(&base_ac) {
        return None;
    }

    let code = |name: &str| {
        caps.name(name)
            .and_then(|m| ability_code(m.as_str()))
            .map(str::to_string)
    };

    Some(UnarmoredAc {
        base_ac,
        ability_code: code("first"),
        secondary_ability_code: code("second"),
        allows_shield: !SHIELD_FORBIDDEN.is_match(text),
        replaces_armor: ARMOR_FORBIDDEN.is_match(text),
    })
}
