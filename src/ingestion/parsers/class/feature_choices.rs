//! Feature Choice Progressions
//!
//! Some choice pools (maneuvers, metamagic options, infusions, fighting
//! styles) have no `<counter>` in the compendium; how many the character
//! knows is only stated in the feature text. This reads those counts into
//! extra counters, from an embedded `Level | Count` table when the feature
//! has one and from phrases like "you learn three maneuvers" otherwise.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ClassCounter, ClassFeature};
use crate::ingestion::concerns::vocabulary::word_to_number;

struct ChoicePool {
    feature: &'static str,
    counter: &'static str,
    subclass: Option<&'static str>,
    additional: bool,
}

/// More specific feature names first; the first contained name wins.
const CHOICE_POOLS: &[ChoicePool] = &[
    ChoicePool { feature: "Additional Arcane Shot", counter: "Arcane Shots Known", subclass: Some("Arcane Archer"), additional: true },
    ChoicePool { feature: "Arcane Shot", counter: "Arcane Shots Known", subclass: Some("Arcane Archer"), additional: false },
    ChoicePool { feature: "Additional Maneuvers", counter: "Maneuvers Known", subclass: Some("Battle Master"), additional: true },
    ChoicePool { feature: "Combat Superiority", counter: "Maneuvers Known", subclass: Some("Battle Master"), additional: false },
    ChoicePool { feature: "Extra Elemental Discipline", counter: "Elemental Disciplines Known", subclass: Some("Way of the Four Elements"), additional: true },
    ChoicePool { feature: "Disciple of the Elements", counter: "Elemental Disciplines Known", subclass: Some("Way of the Four Elements"), additional: false },
    ChoicePool { feature: "Additional Fighting Style", counter: "Fighting Styles Known", subclass: None, additional: true },
    ChoicePool { feature: "Fighting Style", counter: "Fighting Styles Known", subclass: None, additional: false },
    ChoicePool { feature: "Metamagic", counter: "Metamagic Known", subclass: None, additional: false },
    ChoicePool { feature: "Infuse Item", counter: "Infusions Known", subclass: None, additional: false },
    ChoicePool { feature: "Rune Carver", counter: "Runes Known", subclass: Some("Rune Knight"), additional: false },
];

static TABLE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|\s)(\d+)(?:st|nd|rd|th)\s*\|\s*(\d+)")
        .expect("Failed to compile choice table row regex")
});

static SHOULD_KNOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)should know\s+(\d+)\s+").expect("Failed to compile should-know regex")
});

static LEARN_ADDITIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(?:learn|gain)\s+)?\b(one|two|three|four|five)\s+additional")
        .expect("Failed to compile additional count regex")
});

static CHOOSE_SECOND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:choose|can choose)\s+a\s+second")
        .expect("Failed to compile second choice regex")
});

static INITIAL_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:learn|gain|choose|pick)\s+(one|two|three|four|five|six|seven|eight|nine|ten)\b")
        .expect("Failed to compile initial count regex")
});

static ANOTHER_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)another\s+(one|two|three)").expect("Failed to compile another count regex")
});

static ADDITIONAL_LEVELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:additional|another)[^.]*?at\s+([\d,\s]+(?:st|nd|rd|th)[^.]*)")
        .expect("Failed to compile additional levels regex")
});

static ORDINAL_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)(?:st|nd|rd|th)").expect("Failed to compile ordinal level regex")
});

static SINGLE_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)choose\s+one\s+of\s+the\s+following|one\s+(?:other\s+)?(?:\w+\s+)?(?:discipline|style|option)\s+of\s+your\s+choice",
    )
    .expect("Failed to compile single choice regex")
});

static NAME_PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("Failed to compile name parenthetical regex"));

/// Counters for the choice pools the features describe, deduplicated by
/// (name, level, subclass).
pub fn parse_feature_choice_progressions(features: &[ClassFeature]) -> Vec<ClassCounter> {
    let mut counters = Vec::new();
    let mut totals: HashMap<&str, u32> = HashMap::new();
    let mut seen = HashSet::new();

    for feature in features {
        let Some(pool) = CHOICE_POOLS.iter().find(|p| feature.name.contains(p.feature)) else {
            continue;
        };

        let subclass = NAME_PARENTHETICAL
            .captures(&feature.name)
            .map(|caps| caps[1].to_string())
            .or_else(|| pool.subclass.map(str::to_string));

        let current = totals.get(pool.counter).copied().unwrap_or(0);
        for (level, value) in pool_counts(pool, feature, current) {
            let key = (pool.counter, level, subclass.clone());
            if !seen.insert(key) {
                continue;
            }
            let total = totals.entry(pool.counter).or_insert(0);
            *total = (*total).max(value);
            counters.push(ClassCounter {
                level,
                name: pool.counter.to_string(),
                value,
                reset_timing: None,
                subclass: subclass.clone(),
            });
        }
    }

    counters
}

/// (level, known count) pairs one feature states for its pool.
fn pool_counts(pool: &ChoicePool, feature: &ClassFeature, current: u32) -> Vec<(u32, u32)> {
    let text = feature.description.as_str();

    let table: Vec<(u32, u32)> = TABLE_ROW
        .captures_iter(text)
        .filter_map(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
        .collect();
    if !table.is_empty() {
        return table;
    }

    if let Some(caps) = SHOULD_KNOW.captures(text) {
        if let Ok(value) = caps[1].parse() {
            return vec![(feature.level, value)];
        }
    }

    if pool.additional {
        if CHOOSE_SECOND.is_match(text) {
            return vec![(feature.level, 2)];
        }
        let extra = LEARN_ADDITIONAL
            .captures(text)
            .and_then(|caps| word_to_number(&caps[1]))
            .unwrap_or(1);
        return vec![(feature.level, current + extra)];
    }

    let initial = INITIAL_COUNT
        .captures(text)
        .and_then(|caps| word_to_number(&caps[1]))
        .unwrap_or(0);
    if initial > 0 {
        let mut counts = vec![(feature.level, initial)];
        let per_level = additional_per_level(text);
        let mut running = initial;
        for level in additional_levels(text) {
            running += per_level;
            counts.push((level, running));
        }
        return counts;
    }

    if SINGLE_CHOICE.is_match(text) {
        return vec![(feature.level, 1)];
    }

    Vec::new()
}

fn additional_per_level(text: &str) -> u32 {
    LEARN_ADDITIONAL
        .captures(text)
        .or_else(|| ANOTHER_COUNT.captures(text))
        .and_then(|caps| word_to_number(&caps[1]))
        .unwrap_or(1)
}

fn additional_levels(text: &str) -> Vec<u32> {
    ADDITIONAL_LEVELS
        .captures(text)
        .map(|caps| {
            ORDINAL_LEVEL
                .captures_iter(&caps[1])
                .filter_map(|l| l[1].parse().ok())
                .collect()
        })
        .unwrap_or_default()
}
