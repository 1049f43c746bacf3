//! Shared rules vocabulary
//!
//! Read-only reference data the extractors match against: number words,
//! ability score names and codes, skills, and the standard language list.

/// The six ability scores as (full name, code) pairs, in canonical order.
pub const ABILITIES: &[(&str, &str)] = &[
    ("Strength", "STR"),
    ("Dexterity", "DEX"),
    ("Constitution", "CON"),
    ("Intelligence", "INT"),
    ("Wisdom", "WIS"),
    ("Charisma", "CHA"),
];

/// Skill names as they appear in compendium proficiency lists.
pub const SKILLS: &[&str] = &[
    "Acrobatics",
    "Animal Handling",
    "Arcana",
    "Athletics",
    "Deception",
    "History",
    "Insight",
    "Intimidation",
    "Investigation",
    "Medicine",
    "Nature",
    "Perception",
    "Performance",
    "Persuasion",
    "Religion",
    "Sleight of Hand",
    "Stealth",
    "Survival",
];

/// Standard and exotic languages. Class features named after one of these
/// (Thieves' Cant, Druidic) grant the language.
pub const LANGUAGES: &[&str] = &[
    "Common",
    "Dwarvish",
    "Elvish",
    "Giant",
    "Gnomish",
    "Goblin",
    "Halfling",
    "Orc",
    "Abyssal",
    "Celestial",
    "Draconic",
    "Deep Speech",
    "Infernal",
    "Primordial",
    "Sylvan",
    "Undercommon",
    "Druidic",
    "Thieves' Cant",
];

/// Base classes; anything else in a spell's class list is a tag.
pub const BASE_CLASSES: &[&str] = &[
    "Artificer",
    "Barbarian",
    "Bard",
    "Cleric",
    "Druid",
    "Fighter",
    "Monk",
    "Paladin",
    "Ranger",
    "Rogue",
    "Sorcerer",
    "Warlock",
    "Wizard",
];

/// Convert a number word ("two", "Three") or digit string to an integer.
pub fn word_to_number(word: &str) -> Option<u32> {
    let lower = word.trim().to_lowercase();
    if let Ok(n) = lower.parse() {
        return Some(n);
    }
    let n = match lower.as_str() {
        "a" | "an" | "one" | "once" | "single" => 1,
        "two" | "twice" => 2,
        "three" | "thrice" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "twenty" => 20,
        _ => return None,
    };
    Some(n)
}

/// Map an ability name or abbreviation ("Dexterity", "dex", "DEX") to its code.
pub fn ability_code(name: &str) -> Option<&'static str> {
    let lower = name.trim().to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    ABILITIES.iter().find_map(|(full, code)| {
        let full_lower = full.to_lowercase();
        if full_lower == lower || code.eq_ignore_ascii_case(&lower) {
            Some(*code)
        } else {
            None
        }
    })
}

/// Map an ability code back to its full name.
pub fn ability_name(code: &str) -> Option<&'static str> {
    ABILITIES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code.trim()))
        .map(|(full, _)| *full)
}

/// Whether a name is one of the six ability scores (full name, case-insensitive).
pub fn is_ability_name(name: &str) -> bool {
    ABILITIES
        .iter()
        .any(|(full, _)| full.eq_ignore_ascii_case(name.trim()))
}

/// Canonical skill name for a case-insensitive match.
pub fn match_skill(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    SKILLS.iter().copied().find(|s| s.eq_ignore_ascii_case(trimmed))
}

/// Canonical language name for a case-insensitive match.
pub fn match_language(name: &str) -> Option<&'static str> {
    let normalized = name.trim().replace('’', "'");
    LANGUAGES
        .iter()
        .copied()
        .find(|l| l.eq_ignore_ascii_case(&normalized))
}

/// Lowercase hyphenated slug ("Thieves' Cant" -> "thieves-cant").
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '\'' || c == '’' {
            continue;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Title-case every whitespace separated word ("mordenkainen's sword" -> "Mordenkainen's Sword").
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_to_number() {
        assert_eq!(word_to_number("two"), Some(2));
        assert_eq!(word_to_number("Four"), Some(4));
        assert_eq!(word_to_number("20"), Some(20));
        assert_eq!(word_to_number("several"), None);
    }

    #[test]
    fn test_ability_code() {
        assert_eq!(ability_code("Dexterity"), Some("DEX"));
        assert_eq!(ability_code("wis"), Some("WIS"));
        assert_eq!(ability_code("Luck"), None);
        assert_eq!(ability_name("CON"), Some("Constitution"));
    }

    #[test]
    fn test_language_matching() {
        assert_eq!(match_language("thieves’ cant"), Some("Thieves' Cant"));
        assert_eq!(match_language("Druidic"), Some("Druidic"));
        assert_eq!(match_language("Sneak Attack"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Thieves' Cant"), "thieves-cant");
        assert_eq!(slugify("Deep Speech"), "deep-speech");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mordenkainen's sword"), "Mordenkainen's Sword");
    }
}
