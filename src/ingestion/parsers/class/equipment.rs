//! Starting Equipment
//!
//! Reads the bullet list of the level 1 `Starting <Class>` feature. Each
//! bullet is either a lettered choice (`(a) a greataxe or (b) any martial
//! melee weapon`), a weapon category choice (`any simple weapon`), a
//! `your choice of X or Y`, or a plain list of items that are all granted.
//! Only the section after "You begin play with the following equipment" is
//! read, so hit point and proficiency bullets earlier in the feature never
//! turn into equipment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingestion::concerns::vocabulary::word_to_number;
use crate::ingestion::parsers::common::element_text;
use crate::ingestion::xml::Element;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceItemKind {
    Item,
    Category,
}

/// One concrete item or item category inside an equipment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceItem {
    #[serde(rename = "type")]
    pub kind: ChoiceItemKind,
    pub value: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentChoiceItem {
    pub description: String,
    pub quantity: u32,
    pub is_choice: bool,
    pub choice_group: Option<String>,
    pub choice_option: Option<u32>,
    pub choice_items: Vec<ChoiceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingEquipment {
    /// Starting wealth formula ("5d4x10")
    pub wealth: Option<String>,
    pub items: Vec<EquipmentChoiceItem>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static STARTING_FEATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Starting\s+\w+$").expect("Failed to compile starting feature regex")
});

static EQUIPMENT_INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"You (?:begin play|start) with the following equipment[^•\n]*")
        .expect("Failed to compile equipment intro regex")
});

static CATEGORY_WEAPON_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^any\s+(?:(two|three|four|five|one|\d+)\s+)?(simple|martial)(?:\s+(melee|ranged))?\s+weapons?\s*(?:of\s+your\s+choice)?$",
    )
    .expect("Failed to compile weapon category bullet regex")
});

static YOUR_CHOICE_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^your\s+choice\s+of\s+(.+?)\s+or\s+(.+)$")
        .expect("Failed to compile your-choice-of regex")
});

static LETTER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([a-z]\)").expect("Failed to compile choice letter regex"));

static TRAILING_OR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*,?\s*\bor\s*$").expect("Failed to compile trailing or regex")
});

static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),\s+(?:and\s+)?|\s+and\s+").expect("Failed to compile list separator regex")
});

static AND_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),?\s+and\s+").expect("Failed to compile and separator regex")
});

static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:a|an|the)\s+").expect("Failed to compile article regex")
});

static WORD_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(two|three|four|five|six|seven|eight|nine|ten|twenty)\s+")
        .expect("Failed to compile word quantity regex")
});

static NUMERIC_QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+").expect("Failed to compile numeric quantity regex"));

static WEAPON_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:any\s+)?(martial|simple)\s+(?:(melee|ranged)\s+)?weapons?$")
        .expect("Failed to compile weapon category regex")
});

static ARMOR_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:any\s+)?(light|medium|heavy)\s+armou?r$")
        .expect("Failed to compile armor category regex")
});

static MUSICAL_INSTRUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:any\s+)?(?:other\s+)?(?:one\s+)?musical\s+instruments?(?:\s+of\s+your\s+choice)?$")
        .expect("Failed to compile musical instrument regex")
});

static PARENTHETICAL_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:quiver\s+of\s+)?(\w+)\s*\((\d+)\)")
        .expect("Failed to compile parenthetical count regex")
});

static TRAILING_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]+\)\s*$").expect("Failed to compile trailing note regex"));

// ============================================================================
// Extraction
// ============================================================================

/// Wealth formula plus the items of the level 1 "Starting <Class>" feature.
pub fn parse_equipment(class: &Element) -> StartingEquipment {
    let wealth = class.child_text("wealth").map(str::to_string);

    let text = class
        .children_named("autolevel")
        .filter(|a| a.attr("level").map(str::trim) == Some("1"))
        .flat_map(|a| a.children_named("feature"))
        .find(|f| STARTING_FEATURE.is_match(f.child_text_or_empty("name")))
        .map(element_text);

    let items = text
        .as_deref()
        .and_then(equipment_section)
        .map(parse_equipment_choices)
        .unwrap_or_default();

    StartingEquipment { wealth, items }
}

/// The bullet section between the equipment intro and "If you forgo".
fn equipment_section(text: &str) -> Option<&str> {
    let intro = EQUIPMENT_INTRO.find(text)?;
    let rest = &text[intro.end()..];
    let end = rest.find("If you forgo").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Bullets start a line with `•` or `- `; wrapped lines continue the bullet
/// and a blank line ends it.
fn bullets(text: &str) -> Vec<String> {
    let mut bullets: Vec<String> = Vec::new();
    let mut open = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed
            .strip_prefix('•')
            .or_else(|| trimmed.strip_prefix("- "))
        {
            bullets.push(rest.trim().to_string());
            open = true;
        } else if trimmed.is_empty() {
            open = false;
        } else if open {
            if let Some(last) = bullets.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
        }
    }

    bullets.retain(|b| !b.is_empty());
    bullets
}

/// Turn the equipment bullets into items, numbering choice groups in order.
pub fn parse_equipment_choices(text: &str) -> Vec<EquipmentChoiceItem> {
    let mut items = Vec::new();
    let mut group_number = 1;

    for bullet in bullets(text) {
        if let Some(caps) = CATEGORY_WEAPON_BULLET.captures(&bullet) {
            let quantity = caps
                .get(1)
                .and_then(|m| word_to_number(m.as_str()))
                .unwrap_or(1);
            let mut category = caps[2].to_lowercase();
            if let Some(kind) = caps.get(3) {
                category.push('_');
                category.push_str(&kind.as_str().to_lowercase());
            }
            items.push(EquipmentChoiceItem {
                description: bullet.clone(),
                quantity,
                is_choice: true,
                choice_group: Some(format!("choice_{}", group_number)),
                choice_option: None,
                choice_items: vec![ChoiceItem {
                    kind: ChoiceItemKind::Category,
                    value: category,
                    quantity,
                }],
            });
            group_number += 1;
            continue;
        }

        if let Some(caps) = YOUR_CHOICE_OF.captures(&bullet) {
            let group = format!("choice_{}", group_number);
            for (option, text) in [caps[1].trim(), caps[2].trim()].into_iter().enumerate() {
                let text = LEADING_ARTICLE.replace(text, "").to_string();
                items.push(choice_entry(&text, &group, option as u32 + 1));
            }
            group_number += 1;
            continue;
        }

        let options = lettered_options(&bullet);
        if !options.is_empty() {
            let group = format!("choice_{}", group_number);
            for (option, text) in options.iter().enumerate() {
                items.push(choice_entry(text, &group, option as u32 + 1));
            }
            group_number += 1;
            continue;
        }

        for part in LIST_SEPARATOR.split(&bullet) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let choice_items = parse_compound_item(part);
            items.push(EquipmentChoiceItem {
                description: part.to_string(),
                quantity: total_quantity(&choice_items),
                is_choice: false,
                choice_group: None,
                choice_option: None,
                choice_items,
            });
        }
    }

    items
}

fn choice_entry(text: &str, group: &str, option: u32) -> EquipmentChoiceItem {
    let choice_items = parse_compound_item(text);
    EquipmentChoiceItem {
        description: text.to_string(),
        quantity: total_quantity(&choice_items),
        is_choice: true,
        choice_group: Some(group.to_string()),
        choice_option: Some(option),
        choice_items,
    }
}

fn total_quantity(items: &[ChoiceItem]) -> u32 {
    match items.iter().map(|i| i.quantity).sum() {
        0 => 1,
        n => n,
    }
}

/// Texts of the `(a) ...`, `(b) ...` options of a bullet, cleaned of the
/// joining ", or".
fn lettered_options(bullet: &str) -> Vec<String> {
    let markers: Vec<_> = LETTER_MARKER.find_iter(bullet).collect();
    let mut options = Vec::with_capacity(markers.len());

    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map(|m| m.start()).unwrap_or(bullet.len());
        let raw = bullet[marker.end()..end].trim();
        let cleaned = TRAILING_OR.replace(raw, "");
        let cleaned = cleaned.trim().trim_end_matches(',').trim();
        if !cleaned.is_empty() {
            options.push(cleaned.to_string());
        }
    }

    options
}

/// "leather armor, longbow, and arrows (20)" -> three choice items.
pub fn parse_compound_item(text: &str) -> Vec<ChoiceItem> {
    let mut items = Vec::new();

    for part in AND_SEPARATOR.split(text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if part.contains(',') && !part.contains('(') {
            items.extend(part.split(',').filter_map(parse_single_item));
        } else if let Some(item) = parse_single_item(part) {
            items.push(item);
        }
    }

    items
}

fn parse_single_item(part: &str) -> Option<ChoiceItem> {
    let mut part = part.trim().to_string();
    if part.is_empty() {
        return None;
    }

    let mut quantity = 1;
    let word = WORD_QUANTITY
        .captures(&part)
        .map(|caps| (word_to_number(&caps[1]).unwrap_or(1), caps[0].len()));
    if let Some((count, consumed)) = word {
        quantity = count;
        part = part[consumed..].to_string();
    }
    let numeric = NUMERIC_QUANTITY
        .captures(&part)
        .map(|caps| (caps[1].parse().unwrap_or(quantity), caps[0].len()));
    if let Some((count, consumed)) = numeric {
        quantity = count;
        part = part[consumed..].to_string();
    }
    let part = LEADING_ARTICLE.replace(&part, "").to_string();

    if let Some(caps) = WEAPON_CATEGORY.captures(&part) {
        let mut value = caps[1].to_lowercase();
        if let Some(kind) = caps.get(2) {
            value.push('_');
            value.push_str(&kind.as_str().to_lowercase());
        }
        return Some(category(value, quantity));
    }
    if let Some(caps) = ARMOR_CATEGORY.captures(&part) {
        return Some(category(format!("{}_armor", caps[1].to_lowercase()), quantity));
    }
    if MUSICAL_INSTRUMENT.is_match(&part) {
        return Some(category("musical_instrument".to_string(), quantity));
    }
    if let Some(caps) = PARENTHETICAL_COUNT.captures(&part) {
        return Some(ChoiceItem {
            kind: ChoiceItemKind::Item,
            value: caps[1].to_lowercase(),
            quantity: caps[2].parse().unwrap_or(quantity),
        });
    }

    let name = TRAILING_NOTE.replace(&part, "").trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some(ChoiceItem {
        kind: ChoiceItemKind::Item,
        value: name,
        quantity,
    })
}

fn category(value: String, quantity: u32) -> ChoiceItem {
    ChoiceItem {
        kind: ChoiceItemKind::Category,
        value,
        quantity,
    }
}
