//! Projectile Scaling
//!
//! Spells like Magic Missile and Scorching Ray scale by adding projectiles
//! rather than dice. Leveled spells say so in their higher-levels text ("the
//! spell creates one more dart for each slot level above 1st"); cantrips like
//! Eldritch Blast describe extra beams at character levels 5, 11 and 17.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::word_to_number;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileScaling {
    /// Projectiles created at the spell's base level
    pub projectile_count: u32,
    /// Projectiles added per slot level (or per cantrip tier)
    pub projectile_per_level: u32,
    /// Singular projectile noun ("dart", "ray", "beam")
    pub projectile_name: String,
}

const PROJECTILE_NOUNS: &str = "dart|ray|beam|bolt|missile|mote|orb|meteor|arrow|needle|shard|blade|globe|sphere";

static EXTRA_PROJECTILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(one|two|three|\d+)\s+(?:more|additional)\s+(?:\w+\s+)?({nouns})s?\b[^.]*?\bfor\s+each\s+slot\s+level",
        nouns = PROJECTILE_NOUNS
    ))
    .expect("Failed to compile extra projectile regex")
});

static BASE_PROJECTILES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(two|three|four|five|six|seven|eight|\d+)\s+(?:[\w-]+\s+){{0,2}}?({nouns})s\b",
        nouns = PROJECTILE_NOUNS
    ))
    .expect("Failed to compile base projectile regex")
});

static CANTRIP_BEAMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)creates?\s+more\s+than\s+one\s+({nouns})\s+when\s+you\s+reach\s+higher\s+levels",
        nouns = PROJECTILE_NOUNS
    ))
    .expect("Failed to compile cantrip beam regex")
});

/// Projectile scaling from a leveled spell's higher-levels text. The base count
/// is read from the description and defaults to one.
pub fn parse_projectile_scaling(
    higher_levels: Option<&str>,
    description: &str,
) -> Option<ProjectileScaling> {
    let caps = EXTRA_PROJECTILE.captures(higher_levels?)?;
    let per_level = word_to_number(caps.get(1)?.as_str())?;
    let name = caps.get(2)?.as_str().to_lowercase();

    let projectile_count = BASE_PROJECTILES
        .captures_iter(description)
        .find(|c| c.get(2).map(|m| m.as_str().eq_ignore_ascii_case(&name)).unwrap_or(false))
        .and_then(|c| c.get(1))
        .and_then(|m| word_to_number(m.as_str()))
        .unwrap_or(1);

    Some(ProjectileScaling {
        projectile_count,
        projectile_per_level: per_level,
        projectile_name: name,
    })
}

/// Character-level beam scaling for cantrips ("two beams at 5th level, three
/// beams at 11th level").
pub fn parse_character_level_beam_scaling(description: &str) -> Option<ProjectileScaling> {
    let caps = CANTRIP_BEAMS.captures(description)?;
    Some(ProjectileScaling {
        projectile_count: 1,
        projectile_per_level: 1,
        projectile_name: caps.get(1)?.as_str().to_lowercase(),
    })
}
