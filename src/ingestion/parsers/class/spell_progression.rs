//! Spell Progression
//!
//! Per-level slot tables from `<slots>` elements (`cantrips,1st,...,9th`).
//! Slots flagged `optional="YES"` belong to a subclass-only casting option:
//! they never enter the base class table, and are handed to the subclass
//! that has a `Spellcasting (<Subclass>)` feature when there is one.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingestion::xml::Element;

static SUBCLASS_SPELLCASTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Spellcasting\s*\((.+)\)$").expect("Failed to compile subclass spellcasting regex")
});

const SPELLS_KNOWN: &str = "Spells Known";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellProgression {
    pub level: u32,
    pub cantrips_known: u32,
    pub spell_slots_1st: u32,
    pub spell_slots_2nd: u32,
    pub spell_slots_3rd: u32,
    pub spell_slots_4th: u32,
    pub spell_slots_5th: u32,
    pub spell_slots_6th: u32,
    pub spell_slots_7th: u32,
    pub spell_slots_8th: u32,
    pub spell_slots_9th: u32,
    pub spells_known: Option<u32>,
}

impl SpellProgression {
    /// Build a row from the comma separated `<slots>` text.
    pub fn from_slots(level: u32, slots: &str) -> Self {
        let values: Vec<u32> = slots
            .split(',')
            .map(|v| v.trim().parse().unwrap_or(0))
            .collect();
        let at = |i: usize| values.get(i).copied().unwrap_or(0);

        Self {
            level,
            cantrips_known: at(0),
            spell_slots_1st: at(1),
            spell_slots_2nd: at(2),
            spell_slots_3rd: at(3),
            spell_slots_4th: at(4),
            spell_slots_5th: at(5),
            spell_slots_6th: at(6),
            spell_slots_7th: at(7),
            spell_slots_8th: at(8),
            spell_slots_9th: at(9),
            spells_known: None,
        }
    }
}

/// Optional slot table claimed by a subclass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalSpellcasting {
    pub subclass: String,
    pub spellcasting_ability: Option<String>,
    pub spell_progression: Vec<SpellProgression>,
}

struct SlotScan {
    base: Vec<SpellProgression>,
    optional: Vec<SpellProgression>,
    spells_known: BTreeMap<u32, u32>,
}

fn autolevel_level(autolevel: &Element) -> u32 {
    autolevel
        .attr("level")
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(0)
}

fn scan(class: &Element) -> SlotScan {
    let mut base: BTreeMap<u32, SpellProgression> = BTreeMap::new();
    let mut optional = Vec::new();
    let mut spells_known = BTreeMap::new();

    for autolevel in class.children_named("autolevel") {
        let level = autolevel_level(autolevel);

        if let Some(slots) = autolevel.child("slots") {
            let row = SpellProgression::from_slots(level, slots.text());
            if slots.attr_is_yes("optional") {
                optional.push(row);
            } else {
                base.insert(level, row);
            }
        }

        if let Some(counter) = autolevel
            .children_named("counter")
            .find(|c| c.child_text("name") == Some(SPELLS_KNOWN))
        {
            if let Some(value) = counter.child_int("value") {
                spells_known.insert(level, value.max(0) as u32);
            }
        }
    }

    SlotScan {
        base: base.into_values().collect(),
        optional,
        spells_known,
    }
}

/// Whether any `<slots>` element of the class is not flagged optional.
pub fn has_non_optional_slots(class: &Element) -> bool {
    class
        .children_named("autolevel")
        .filter_map(|a| a.child("slots"))
        .any(|slots| !slots.attr_is_yes("optional"))
}

/// Base class progression, one row per level with non-optional slots.
///
/// "Spells Known" counters are merged in only for classes without any
/// optional slots, since a subclass caster's counters describe the subclass.
pub fn parse_spell_slots(class: &Element) -> Vec<SpellProgression> {
    let SlotScan {
        mut base,
        optional,
        spells_known,
    } = scan(class);

    if optional.is_empty() {
        for row in &mut base {
            row.spells_known = spells_known.get(&row.level).copied();
        }
    }

    base
}

/// Optional slots, when a `Spellcasting (<Subclass>)` feature claims them.
pub fn parse_optional_spell_slots(class: &Element) -> Option<OptionalSpellcasting> {
    let SlotScan {
        mut optional,
        spells_known,
        ..
    } = scan(class);

    if optional.is_empty() {
        return None;
    }

    let subclass = class
        .children_named("autolevel")
        .flat_map(|a| a.children_named("feature"))
        .filter_map(|f| f.child_text("name"))
        .find_map(|name| {
            SUBCLASS_SPELLCASTING
                .captures(name)
                .map(|caps| caps[1].trim().to_string())
        });

    let Some(subclass) = subclass else {
        tracing::debug!(
            levels = optional.len(),
            "Optional spell slots without a subclass spellcasting feature"
        );
        return None;
    };

    for row in &mut optional {
        row.spells_known = spells_known.get(&row.level).copied();
    }

    Some(OptionalSpellcasting {
        subclass,
        spellcasting_ability: class.child_text("spellAbility").map(str::to_string),
        spell_progression: optional,
    })
}
