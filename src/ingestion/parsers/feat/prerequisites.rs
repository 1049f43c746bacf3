//! Prerequisite Grouping
//!
//! Turns a feat's prerequisite sentence into a flat list of [`Prerequisite`]
//! facts tagged with a `group_id`. Facts sharing a group are alternatives
//! (OR); different groups must all hold (AND).
//!
//! Each line is split on top-level commas into segments, and each segment is
//! classified in priority order: ability score threshold, proficiency, race
//! name, free text. Consecutive segments of the same category join one OR
//! group; a change of category starts a new AND group. Abilities joined by
//! "and" ("Intelligence and Wisdom 13") are each required.
//!
//! Lines are each required, so every line gets its own groups. When each line
//! holds a single requirement ("Dexterity 13\nWisdom 13") they share group 1
//! without being alternatives.
//!
//! ```ignore
//! let facts = parse_prerequisites(Some("Dwarf, Gnome, Halfling, Proficiency in Acrobatics"));
//! assert_eq!(facts.iter().filter(|f| f.group_id == 1).count(), 3);
//! assert_eq!(facts[3].group_id, 2);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingestion::concerns::vocabulary::{ability_code, match_skill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteType {
    AbilityScore,
    Race,
    Skill,
    ProficiencyType,
}

/// One prerequisite fact. With both `prerequisite_type` and
/// `prerequisite_id_hint` empty it is free text kept in `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub prerequisite_type: Option<PrerequisiteType>,
    /// Ability code, race name, skill name or proficiency name
    pub prerequisite_id_hint: Option<String>,
    pub minimum_value: Option<u32>,
    pub group_id: u32,
    pub is_alternative: bool,
    pub description: Option<String>,
}

impl Prerequisite {
    fn typed(prerequisite_type: PrerequisiteType, hint: impl Into<String>, minimum_value: Option<u32>) -> Self {
        Self {
            prerequisite_type: Some(prerequisite_type),
            prerequisite_id_hint: Some(hint.into()),
            minimum_value,
            group_id: 0,
            is_alternative: false,
            description: None,
        }
    }

    fn free_form(text: &str) -> Self {
        Self {
            prerequisite_type: None,
            prerequisite_id_hint: None,
            minimum_value: None,
            group_id: 0,
            is_alternative: false,
            description: Some(text.to_string()),
        }
    }

    pub fn is_free_form(&self) -> bool {
        self.prerequisite_type.is_none() && self.prerequisite_id_hint.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Ability,
    Proficiency,
    Race,
    FreeForm,
}

struct Segment {
    category: Category,
    facts: Vec<Prerequisite>,
    /// Every fact is required on its own
    conjunctive: bool,
    text: String,
}

impl Segment {
    fn new(category: Category, facts: Vec<Prerequisite>, text: &str) -> Self {
        Self {
            category,
            facts,
            conjunctive: false,
            text: text.to_string(),
        }
    }

    fn free_form(text: &str) -> Self {
        Self::new(Category::FreeForm, vec![Prerequisite::free_form(text)], text)
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

const ABILITY_NAMES: &str = "Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma";

static ABILITY_THRESHOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^((?:{a})(?:\s*(?:,|or|and)\s*(?:{a}))*)\s+(\d+)(?:\s+or\s+higher)?$",
        a = ABILITY_NAMES
    ))
    .expect("Failed to compile ability threshold regex")
});

static ABILITY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", ABILITY_NAMES)).expect("Failed to compile ability name regex")
});

static PROFICIENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Proficiency\s+(with|in)\s+(?:the\s+)?(?:an?\s+)?(.+?)(?:\s+skill)?$")
        .expect("Failed to compile proficiency prerequisite regex")
});

static RACE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][a-z]+(?:-[A-Z][a-z]+)?(?:\s+[A-Z][a-z]+)?(?:\s*\([A-Z][\w\s/]*\))?$")
        .expect("Failed to compile race name regex")
});

static OR_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+or\s+").expect("Failed to compile or split regex"));

static AND_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\band\b").expect("Failed to compile and word regex"));

static OR_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bor\b").expect("Failed to compile or word regex"));

static LEADING_OR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:or|and)\s+").expect("Failed to compile leading conjunction regex"));

/// Size descriptors that sit in race lists without naming a race.
const RACE_DESCRIPTORS: &[&str] = &["Small Race", "Medium Race"];

const NON_RACE_WORDS: &[&str] = &["ability to", "feature", "level", "spell", "the "];

// ============================================================================
// Grouping
// ============================================================================

/// Parse a prerequisite sentence. Empty or missing input yields no facts.
pub fn parse_prerequisites(text: Option<&str>) -> Vec<Prerequisite> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    let lines: Vec<Vec<Prerequisite>> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect();

    if lines.len() > 1 && lines.iter().all(|facts| facts.len() == 1) {
        return lines
            .into_iter()
            .flatten()
            .map(|mut fact| {
                fact.group_id = 1;
                fact.is_alternative = false;
                fact
            })
            .collect();
    }

    let mut facts = Vec::new();
    let mut offset = 0;
    for line in lines {
        let line_groups = line.iter().map(|f| f.group_id).max().unwrap_or(0);
        facts.extend(line.into_iter().map(|mut fact| {
            fact.group_id += offset;
            fact
        }));
        offset += line_groups;
    }
    facts
}

/// Facts of one line, with group ids starting at 1. Never empty.
fn parse_line(line: &str) -> Vec<Prerequisite> {
    let mut segments: Vec<Segment> = split_top_level(line)
        .iter()
        .map(|raw| classify(LEADING_OR.replace(raw.trim(), "").trim()))
        .collect();

    // A size descriptor only qualifies a race list on the same line
    let names_race = segments
        .iter()
        .any(|s| s.category == Category::Race && !s.facts.is_empty());
    if !names_race {
        for segment in segments
            .iter_mut()
            .filter(|s| s.category == Category::Race && s.facts.is_empty())
        {
            *segment = Segment::free_form(&segment.text);
        }
    }

    if segments.iter().all(|s| s.category == Category::FreeForm) {
        let mut fact = Prerequisite::free_form(line);
        fact.group_id = 1;
        return vec![fact];
    }

    let mut facts: Vec<Prerequisite> = Vec::new();
    let mut group_id = 0;
    let mut previous: Option<Category> = None;
    let mut needs_group = true;

    for segment in segments {
        let Segment {
            category,
            facts: segment_facts,
            conjunctive,
            ..
        } = segment;

        if previous != Some(category) || category == Category::FreeForm {
            needs_group = true;
        }
        for mut fact in segment_facts {
            if needs_group {
                group_id += 1;
            }
            needs_group = conjunctive;
            fact.group_id = group_id;
            facts.push(fact);
        }

        if conjunctive {
            needs_group = true;
            previous = None;
        } else {
            previous = Some(category);
        }
    }

    for group in 1..=group_id {
        let size = facts.iter().filter(|f| f.group_id == group).count();
        if size >= 2 {
            for fact in facts.iter_mut().filter(|f| f.group_id == group) {
                fact.is_alternative = true;
            }
        }
    }

    if facts.is_empty() {
        let mut fact = Prerequisite::free_form(line);
        fact.group_id = 1;
        facts.push(fact);
    }
    facts
}

/// Split on commas outside parentheses.
fn split_top_level(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in line.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

// ============================================================================
// Classification
// ============================================================================

fn classify(segment: &str) -> Segment {
    if let Some((facts, conjunctive)) = ability_facts(segment) {
        return Segment {
            conjunctive,
            ..Segment::new(Category::Ability, facts, segment)
        };
    }

    if let Some(fact) = proficiency_fact(segment) {
        return Segment::new(Category::Proficiency, vec![fact], segment);
    }

    if let Some(facts) = race_facts(segment) {
        return Segment::new(Category::Race, facts, segment);
    }

    Segment::free_form(segment)
}

/// "Dexterity 13", "Intelligence or Wisdom 13 or higher". The flag is set
/// when the abilities are joined by "and" rather than "or".
fn ability_facts(segment: &str) -> Option<(Vec<Prerequisite>, bool)> {
    let caps = ABILITY_THRESHOLD.captures(segment)?;
    let minimum: u32 = caps[2].parse().ok()?;
    let facts: Vec<Prerequisite> = ABILITY_NAME
        .captures_iter(&caps[1])
        .filter_map(|name| ability_code(&name[1]))
        .map(|code| Prerequisite::typed(PrerequisiteType::AbilityScore, code, Some(minimum)))
        .collect();
    if facts.is_empty() {
        return None;
    }

    let conjunctive = AND_WORD.is_match(&caps[1]) && !OR_WORD.is_match(&caps[1]);
    Some((facts, conjunctive))
}

/// "Proficiency in Acrobatics" is a skill; "Proficiency with medium armor"
/// names a proficiency type.
fn proficiency_fact(segment: &str) -> Option<Prerequisite> {
    let caps = PROFICIENCY.captures(segment)?;
    let name = caps[2].trim();
    if caps[1].eq_ignore_ascii_case("in") {
        if let Some(skill) = match_skill(name) {
            return Some(Prerequisite::typed(PrerequisiteType::Skill, skill, None));
        }
    }
    Some(Prerequisite::typed(PrerequisiteType::ProficiencyType, name, None))
}

/// "Elf", "Elf (High)", "Elf or Half-Elf". Size descriptors are recognized as
/// part of a race list but produce no fact of their own.
fn race_facts(segment: &str) -> Option<Vec<Prerequisite>> {
    let lower = segment.to_lowercase();
    if NON_RACE_WORDS.iter().any(|w| lower.contains(w)) {
        return None;
    }

    let names: Vec<&str> = OR_SPLIT.split(segment).map(str::trim).collect();
    if !names.iter().all(|n| RACE_NAME.is_match(n)) {
        return None;
    }

    Some(
        names
            .into_iter()
            .filter(|n| !RACE_DESCRIPTORS.iter().any(|d| d.eq_ignore_ascii_case(n)))
            .map(|n| Prerequisite::typed(PrerequisiteType::Race, n, None))
            .collect(),
    )
}
