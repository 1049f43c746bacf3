//! Saving Throw Extraction
//!
//! Two readers share the classification vocabulary here:
//!
//! - [`parse_item_saving_throws`] reads the `DC 15 Wisdom saving throw` form
//!   used by magic items and produces [`SavingThrowSpec`] records.
//! - [`parse_spell_saving_throws`] reads every `<Ability> saving throw`
//!   mention in a spell, telling initial saves from recurring ones and
//!   detecting advantage/disadvantage.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{ability_code, ABILITIES};

// ============================================================================
// Types
// ============================================================================

/// What a successful save does to the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveEffect {
    Negates,
    HalfDamage,
    FullDamage,
    EndsEffect,
    ReducedDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveModifier {
    Advantage,
    Disadvantage,
    #[default]
    None,
}

/// A saving throw an item forces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingThrowSpec {
    pub ability_code: String,
    pub dc: Option<u32>,
    pub save_effect: Option<SaveEffect>,
    pub modifier: SaveModifier,
    pub is_initial_save: bool,
    pub recurring: bool,
}

/// A saving throw a spell calls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSavingThrow {
    /// Full ability name ("Wisdom")
    pub ability: String,
    pub ability_code: String,
    pub effect: Option<SaveEffect>,
    pub recurring: bool,
    pub modifier: SaveModifier,
}

// ============================================================================
// Regex Patterns
// ============================================================================

const CONDITIONS: &str =
    "charmed|frightened|paralyzed|stunned|poisoned|restrained|blinded|deafened|petrified|banished|incapacitated|cursed";

const RECURRING_PHRASES: &[&str] = &[
    "at the end of each of its turns",
    "on each of your turns",
    "end of each turn",
    "repeat the save",
    "can repeat",
    "can make another",
    "make another",
    "each time",
];

static DC_SAVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bDC\s*(?P<dc>\d+)\s+(?P<ability>Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma)\s+saving\s+throw",
    )
    .expect("Failed to compile DC saving throw regex")
});

static REPEAT_SAVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brepeat\s+the\s+saving\s+throw\b")
        .expect("Failed to compile repeat save regex")
});

static SPELL_SAVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?P<ability>Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma)\s+saving\s+throw",
    )
    .expect("Failed to compile spell saving throw regex")
});

static HALF_AS_MUCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)half\s+as\s+much|half\s+(?:the\s+)?damage")
        .expect("Failed to compile half damage regex")
});

static CONDITION_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", CONDITIONS)).expect("Failed to compile condition regex")
});

static DAMAGE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+d\d+[^.]*?damage|takes?\s+[^.]*?damage")
        .expect("Failed to compile damage clause regex")
});

static WITH_ADVANTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwith\s+advantage\b").expect("Failed to compile advantage regex")
});

static WITH_DISADVANTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwith\s+disadvantage\b").expect("Failed to compile disadvantage regex")
});

// Spell modifier patterns
static ADV_MAKES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)makes?\s+(all\s+)?.*saving\s+throws?\s+with\s+advantage\b")
        .expect("Failed to compile advantage (makes) regex")
});
static ADV_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\badvantage\s+on.{0,50}?saving\s+throws?")
        .expect("Failed to compile advantage (on) regex")
});
static ADV_NEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)saving\s+throws?.{0,20}with\s+advantage\b")
        .expect("Failed to compile advantage (near) regex")
});
static CONDITIONAL_ADV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)does\s+so\s+with\s+advantage\s+if")
        .expect("Failed to compile conditional advantage regex")
});
static DIS_MAKES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)makes?\s+(this\s+)?.*saving\s+throws?\s+with\s+disadvantage")
        .expect("Failed to compile disadvantage (makes) regex")
});
static DIS_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)disadvantage\s+on.{0,50}?saving\s+throws?")
        .expect("Failed to compile disadvantage (on) regex")
});

// Spell effect patterns
static ENDS_EFFECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)to\s+end\s+(the\s+)?(effect|condition)|end\s+(this\s+)?(effect|condition)")
        .expect("Failed to compile ends effect regex")
});
static HALF_DAMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(take|takes?)\s+(half|1/2)|half\s+(the\s+|as\s+much\s+)?damage|or\s+takes?\s+.*?damage|on\s+a\s+successful\s+(one|save)",
    )
    .expect("Failed to compile half damage effect regex")
});
static FULL_DAMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)on\s+a\s+failed\s+save.*takes?\s+\d+d\d+|takes?\s+\d+d\d+.*on\s+a\s+failed\s+save")
        .expect("Failed to compile full damage regex")
});
static NEGATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)or\s+(be|become|becomes?)\s+({})", CONDITIONS))
        .expect("Failed to compile negates regex")
});

// ============================================================================
// Item Saving Throws
// ============================================================================

/// Extract `DC N <Ability> saving throw` requirements from an item description.
pub fn parse_item_saving_throws(text: &str) -> Vec<SavingThrowSpec> {
    let mut saves: Vec<(usize, SavingThrowSpec)> = Vec::new();
    let matches: Vec<_> = DC_SAVE.captures_iter(text).collect();

    for (i, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(ability)) = (caps.get(0), caps.name("ability")) else {
            continue;
        };
        let Some(code) = ability_code(ability.as_str()) else {
            continue;
        };

        let next_start = matches
            .get(i + 1)
            .and_then(|c| c.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let consequence = window(text, whole.end(), (whole.end() + 250).min(next_start));
        let before = window(text, whole.start().saturating_sub(100), whole.start());
        let around = window(
            text,
            whole.start().saturating_sub(80),
            (whole.end() + 80).min(next_start),
        );

        let recurring = contains_recurring_phrase(before);

        saves.push((
            whole.start(),
            SavingThrowSpec {
                ability_code: code.to_string(),
                dc: caps.name("dc").and_then(|m| m.as_str().parse().ok()),
                save_effect: Some(classify_item_consequence(consequence)),
                modifier: simple_modifier(around),
                is_initial_save: !recurring,
                recurring,
            },
        ));
    }

    // "The target can repeat the saving throw at the end of each of its turns"
    for m in REPEAT_SAVE.find_iter(text) {
        let preceding = saves
            .iter()
            .rev()
            .find(|(pos, _)| *pos < m.start())
            .map(|(_, s)| (s.ability_code.clone(), s.dc));
        let Some((code, dc)) = preceding else {
            continue;
        };
        let already = saves
            .iter()
            .any(|(_, s)| s.recurring && s.ability_code == code);
        if already {
            continue;
        }
        saves.push((
            m.start(),
            SavingThrowSpec {
                ability_code: code,
                dc,
                save_effect: Some(SaveEffect::EndsEffect),
                modifier: SaveModifier::None,
                is_initial_save: false,
                recurring: true,
            },
        ));
    }

    saves.sort_by_key(|(pos, _)| *pos);
    saves.into_iter().map(|(_, s)| s).collect()
}

fn classify_item_consequence(consequence: &str) -> SaveEffect {
    if HALF_AS_MUCH.is_match(consequence) {
        SaveEffect::HalfDamage
    } else if CONDITION_WORD.is_match(consequence) {
        SaveEffect::Negates
    } else if DAMAGE_CLAUSE.is_match(consequence) {
        SaveEffect::FullDamage
    } else {
        SaveEffect::Negates
    }
}

fn simple_modifier(context: &str) -> SaveModifier {
    if WITH_ADVANTAGE.is_match(context) {
        SaveModifier::Advantage
    } else if WITH_DISADVANTAGE.is_match(context) {
        SaveModifier::Disadvantage
    } else {
        SaveModifier::None
    }
}

// ============================================================================
// Spell Saving Throws
// ============================================================================

/// Extract every saving throw a spell description calls for.
///
/// Results are ordered by ability (Strength first), then by position, with
/// duplicates of the same (ability, recurring, modifier) removed.
pub fn parse_spell_saving_throws(description: &str) -> Vec<SpellSavingThrow> {
    let mut by_ability: Vec<(usize, usize, SpellSavingThrow)> = Vec::new();

    for caps in SPELL_SAVE.captures_iter(description) {
        let (Some(whole), Some(ability)) = (caps.get(0), caps.name("ability")) else {
            continue;
        };
        let Some(code) = ability_code(ability.as_str()) else {
            continue;
        };
        let order = ABILITIES
            .iter()
            .position(|(_, c)| *c == code)
            .unwrap_or(ABILITIES.len());
        let full_name = ABILITIES[order.min(ABILITIES.len() - 1)].0;

        let pos = whole.start();
        let context_start = pos.saturating_sub(100);
        let recurring_context = window(description, context_start, pos + 50);
        let modifier_context = window(description, pos.saturating_sub(80), pos + 80);

        let recurring = contains_recurring_phrase(recurring_context);
        let effect_length = if recurring { 250 } else { 200 };
        let effect_context = window(description, context_start, context_start + effect_length);

        by_ability.push((
            order,
            pos,
            SpellSavingThrow {
                ability: full_name.to_string(),
                ability_code: code.to_string(),
                effect: spell_save_effect(effect_context),
                recurring,
                modifier: spell_save_modifier(modifier_context),
            },
        ));
    }

    by_ability.sort_by_key(|(order, pos, _)| (*order, *pos));

    let mut unique: Vec<SpellSavingThrow> = Vec::new();
    for (_, _, save) in by_ability {
        let duplicate = unique.iter().any(|u| {
            u.ability == save.ability && u.recurring == save.recurring && u.modifier == save.modifier
        });
        if !duplicate {
            unique.push(save);
        }
    }
    unique
}

fn spell_save_modifier(context: &str) -> SaveModifier {
    if ADV_MAKES.is_match(context)
        || ADV_ON.is_match(context)
        || (ADV_NEAR.is_match(context) && !CONDITIONAL_ADV.is_match(context))
    {
        return SaveModifier::Advantage;
    }
    if DIS_MAKES.is_match(context) || DIS_ON.is_match(context) || CONDITIONAL_ADV.is_match(context) {
        return SaveModifier::Disadvantage;
    }
    SaveModifier::None
}

fn spell_save_effect(context: &str) -> Option<SaveEffect> {
    let lower = context.to_lowercase();

    if ENDS_EFFECT.is_match(context) {
        return Some(SaveEffect::EndsEffect);
    }
    if HALF_DAMAGE.is_match(context) {
        return Some(SaveEffect::HalfDamage);
    }
    if FULL_DAMAGE.is_match(context) {
        return Some(SaveEffect::FullDamage);
    }
    if NEGATES.is_match(context) || lower.contains("negates") || lower.contains("avoids") {
        return Some(SaveEffect::Negates);
    }
    if lower.contains("end") && (lower.contains("effect") || lower.contains("condition")) {
        return Some(SaveEffect::EndsEffect);
    }
    if lower.contains("duration") && (lower.contains("reduced") || lower.contains("shorter")) {
        return Some(SaveEffect::ReducedDuration);
    }
    None
}

// ============================================================================
// Helpers
// ============================================================================

fn contains_recurring_phrase(context: &str) -> bool {
    let lower = context.to_lowercase();
    RECURRING_PHRASES.iter().any(|p| lower.contains(p))
}

/// Byte window clamped to the text and to char boundaries.
fn window(text: &str, start: usize, end: usize) -> &str {
    let mut start = start.min(text.len());
    let mut end = end.min(text.len()).max(start);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}

// ============================================================================
// Tests
// ============================================================================
